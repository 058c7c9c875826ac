use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod demo;

#[derive(Parser)]
#[command(name = "artel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Member-run purchasing cooperative", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted proposal lifecycle against the in-memory environment
    Demo {
        /// Number of members to admit
        #[arg(long, default_value_t = 5)]
        members: u32,

        /// Affirmative votes to cast
        #[arg(long, default_value_t = 3)]
        yes: u32,

        /// Negative votes to cast
        #[arg(long, default_value_t = 1)]
        no: u32,

        /// Path to a TOML config file (defaults are used if omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the voting period (e.g. "48h", "90m")
        #[arg(long)]
        voting_period: Option<String>,

        /// Print the event journal as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default TOML config file
    InitConfig {
        /// Destination path
        #[arg(long, default_value = "artel.toml")]
        path: PathBuf,
    },
}

/// Dispatch a parsed command line.
pub fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Demo {
            members,
            yes,
            no,
            config,
            voting_period,
            json,
        } => {
            let mut dao_config = config::load_config(config.as_deref())?;
            if let Some(period) = voting_period {
                dao_config.voting_period_secs = humantime::parse_duration(&period)?.as_secs();
            }
            demo::run(dao_config, members, yes, no, json)
        }
        Commands::InitConfig { path } => config::write_default(&path),
    }
}
