//! Scripted full-lifecycle demonstration.
//!
//! Admits a pool of members, proposes a marketplace purchase, casts votes
//! through all three entry paths (direct, signed, batched), advances the
//! clock past the voting window, and executes against the mock marketplace.

use artel::codec::to_cbor;
use artel::crypto::{address_of, sign_ballot};
use artel::env::mock::InMemoryEnv;
use artel::governance::{Dao, DaoConfig};
use artel::identity::Address;
use artel::market::{MockMarketplace, PurchaseRequest, PURCHASE_SIG};
use k256::ecdsa::SigningKey;

const ITEM_ID: u64 = 7;
const ITEM_PRICE: u64 = 750_000;
const ITEM_BUDGET: u64 = 1_000_000;

pub fn run(
    config: DaoConfig,
    members: u32,
    yes: u32,
    no: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if members == 0 {
        return Err("at least one member is required".into());
    }
    if yes + no > members {
        return Err("yes + no votes cannot exceed the member count".into());
    }

    let dao_address = Address::from_bytes([0xda; 20]);
    let marketplace_address = Address::from_bytes([0xaa; 20]);
    let collection = Address::from_bytes([0xcc; 20]);

    let mut env = InMemoryEnv::new();
    env.set_now(1_000);
    env.credit(dao_address, ITEM_BUDGET);

    let mut market = MockMarketplace::new(marketplace_address);
    market.list(collection, ITEM_ID, ITEM_PRICE);
    env.install_marketplace(market);

    let fee = config.join_fee;
    let voting_period = config.voting_period_secs;
    let mut dao = Dao::new(dao_address, config);

    // Admit the member pool.
    let keys: Vec<SigningKey> = (0..members)
        .map(|_| SigningKey::random(&mut rand::rngs::OsRng))
        .collect();
    let addresses: Vec<Address> = keys.iter().map(|k| address_of(k.verifying_key())).collect();
    for &member in &addresses {
        dao.join(member, fee)?;
    }
    println!("admitted {} members", dao.member_count());

    // Propose the purchase as a single self-targeted action.
    let request = PurchaseRequest {
        marketplace: marketplace_address,
        collection,
        item_id: ITEM_ID,
        budget: ITEM_BUDGET,
    };
    let id = dao.propose(
        &env,
        addresses[0],
        vec![dao_address],
        vec![0],
        vec![PURCHASE_SIG.to_string()],
        vec![to_cbor(&request)?],
    )?;
    println!(
        "proposal {} created, status: {}",
        id,
        dao.proposal_status(&env, id)
    );

    // Affirmative votes: the proposer votes directly, the next voter signs,
    // the rest arrive as a relayed batch.
    let mut batch_ids = Vec::new();
    let mut batch_supports = Vec::new();
    let mut batch_signatures = Vec::new();
    for (index, key) in keys.iter().take(yes as usize).enumerate() {
        match index {
            0 => dao.vote(&env, addresses[0], id, true)?,
            1 => {
                let signature = sign_ballot(key, dao.domain(), id, true);
                dao.vote_by_signature(&env, id, true, &signature)?;
            }
            _ => {
                batch_ids.push(id);
                batch_supports.push(true);
                batch_signatures.push(sign_ballot(key, dao.domain(), id, true));
            }
        }
    }
    for key in keys.iter().skip(yes as usize).take(no as usize) {
        batch_ids.push(id);
        batch_supports.push(false);
        batch_signatures.push(sign_ballot(key, dao.domain(), id, false));
    }
    if !batch_ids.is_empty() {
        let applied =
            dao.batch_vote_by_signature(&env, &batch_ids, &batch_supports, &batch_signatures)?;
        println!("batch applied {} of {} votes", applied, batch_ids.len());
    }

    // Close the voting window and execute.
    env.advance(voting_period);
    println!("voting closed, status: {}", dao.proposal_status(&env, id));

    let actions = vec![artel::governance::Action {
        target: dao_address,
        value: 0,
        signature: PURCHASE_SIG.to_string(),
        payload: to_cbor(&request)?,
    }];
    match dao.execute(&mut env, addresses[0], id, &actions) {
        Ok(()) => {
            println!(
                "executed: item {} bought for {} (budget {})",
                ITEM_ID, ITEM_PRICE, ITEM_BUDGET
            );
            // The marketplace hands the asset over afterwards.
            dao.on_asset_received(marketplace_address, marketplace_address, ITEM_ID, vec![]);
        }
        Err(e) => println!("execution refused: {}", e),
    }
    println!("final status: {}", dao.proposal_status(&env, id));

    if json {
        println!("{}", serde_json::to_string_pretty(dao.events())?);
    } else {
        for event in dao.events() {
            println!("event: {:?}", event);
        }
    }
    Ok(())
}
