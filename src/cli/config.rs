//! Cooperative configuration file handling.
//!
//! Config files are TOML; every field falls back to the deployed-reference
//! default, so a partial file is valid.

use artel::governance::DaoConfig;
use std::fs;
use std::path::Path;

/// Load a config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DaoConfig, Box<dyn std::error::Error>> {
    match path {
        None => Ok(DaoConfig::default()),
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            let config: DaoConfig = toml::from_str(&raw)?;
            Ok(config)
        }
    }
}

/// Write the default config as TOML.
pub fn write_default(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DaoConfig::default();
    fs::write(path, toml::to_string_pretty(&config)?)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artel.toml");

        write_default(&path).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.quorum_percent, DaoConfig::default().quorum_percent);
        assert_eq!(loaded.join_fee, DaoConfig::default().join_fee);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "quorum_percent = 40\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.quorum_percent, 40);
        assert_eq!(
            loaded.voting_period_secs,
            DaoConfig::default().voting_period_secs
        );
    }
}
