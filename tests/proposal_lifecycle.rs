//! Integration tests for the end-to-end proposal lifecycle.
//!
//! Covers the complete flow: members join, a purchase proposal is created,
//! votes arrive, the clock advances into the execution window, and the
//! action list is replayed under the content-hash gate with all-or-nothing
//! semantics.

use artel::codec::to_cbor;
use artel::env::mock::InMemoryEnv;
use artel::governance::{Action, Dao, DaoConfig, DaoError, ProposalStatus};
use artel::identity::Address;
use artel::market::{MockMarketplace, PurchaseRequest, PURCHASE_SIG};

const ITEM_ID: u64 = 7;
const ITEM_PRICE: u64 = 500;

fn addr(b: u8) -> Address {
    Address::from_bytes([b; 20])
}

fn dao_address() -> Address {
    addr(0xda)
}

fn marketplace_address() -> Address {
    addr(0xaa)
}

fn collection() -> Address {
    addr(0xcc)
}

/// Cooperative with `members` admitted members (addresses 1..=members),
/// a funded treasury, and a listed marketplace item.
fn setup(members: u8) -> (Dao, InMemoryEnv) {
    let mut dao = Dao::new(dao_address(), DaoConfig::default());
    let mut env = InMemoryEnv::new();
    env.set_now(1_000);
    env.credit(dao_address(), 10_000);

    let mut market = MockMarketplace::new(marketplace_address());
    market.list(collection(), ITEM_ID, ITEM_PRICE);
    env.install_marketplace(market);

    let fee = dao.config().join_fee;
    for b in 1..=members {
        dao.join(addr(b), fee).unwrap();
    }
    (dao, env)
}

fn purchase_actions(budget: u64) -> Vec<Action> {
    let request = PurchaseRequest {
        marketplace: marketplace_address(),
        collection: collection(),
        item_id: ITEM_ID,
        budget,
    };
    vec![Action {
        target: dao_address(),
        value: 0,
        signature: PURCHASE_SIG.to_string(),
        payload: to_cbor(&request).unwrap(),
    }]
}

fn propose_actions(dao: &mut Dao, env: &InMemoryEnv, proposer: Address, actions: &[Action]) -> u64 {
    dao.propose(
        env,
        proposer,
        actions.iter().map(|a| a.target).collect(),
        actions.iter().map(|a| a.value).collect(),
        actions.iter().map(|a| a.signature.clone()).collect(),
        actions.iter().map(|a| a.payload.clone()).collect(),
    )
    .unwrap()
}

fn enter_execution_window(env: &mut InMemoryEnv, dao: &Dao) {
    env.set_now(1_000 + dao.config().voting_period_secs);
}

#[test]
fn full_lifecycle_executes_purchase() {
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Voting);

    // 3 yes votes out of 10 members: quorum threshold floor(250/100) = 2.
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }

    enter_execution_window(&mut env, &dao);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::ReadyForExecute);

    dao.execute(&mut env, addr(1), id, &actions).unwrap();
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
    assert!(env.marketplace().unwrap().is_sold(collection(), ITEM_ID));
    assert_eq!(env.balance(dao_address()), 10_000 - ITEM_PRICE);

    // Terminal: a second execution is a clean failure, never a double buy.
    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &actions),
        Err(DaoError::CannotExecute(_))
    ));
}

#[test]
fn quorum_boundary_blocks_execution() {
    // 2 yes votes with 10 members: totalVotes does not exceed the floor
    // threshold of 2, so the proposal closes unexecuted.
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=2 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }

    enter_execution_window(&mut env, &dao);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &actions),
        Err(DaoError::CannotExecute(_))
    ));
}

#[test]
fn tie_fails_majority() {
    // 2 yes + 2 no: quorum holds (4 > 2) but a tie is not a majority.
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=2 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }
    for b in 3..=4 {
        dao.vote(&env, addr(b), id, false).unwrap();
    }

    enter_execution_window(&mut env, &dao);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
}

#[test]
fn execute_rejects_payload_mismatch() {
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }
    enter_execution_window(&mut env, &dao);

    // A semantically-similar substitute with a different budget.
    let substitute = purchase_actions(601);
    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &substitute),
        Err(DaoError::InvalidExecution(_))
    ));
    assert!(!env.marketplace().unwrap().is_sold(collection(), ITEM_ID));
}

#[test]
fn execute_rejects_reordered_actions() {
    let (mut dao, mut env) = setup(10);
    let first = Action {
        target: addr(0x11),
        value: 0,
        signature: String::new(),
        payload: vec![1],
    };
    let second = Action {
        target: addr(0x22),
        value: 0,
        signature: String::new(),
        payload: vec![2],
    };
    let actions = vec![first.clone(), second.clone()];
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }
    enter_execution_window(&mut env, &dao);

    let reordered = vec![second, first];
    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &reordered),
        Err(DaoError::InvalidExecution(_))
    ));
    // The exact voted-on order still executes.
    dao.execute(&mut env, addr(1), id, &actions).unwrap();
    assert_eq!(env.dispatched().len(), 2);
    assert_eq!(env.dispatched()[0].target, addr(0x11));
}

#[test]
fn failed_action_rolls_back_everything() {
    let (mut dao, mut env) = setup(10);
    let good = Action {
        target: addr(0x11),
        value: 100,
        signature: String::new(),
        payload: vec![1],
    };
    let bad = Action {
        target: addr(0x66),
        value: 0,
        signature: String::new(),
        payload: vec![2],
    };
    env.fail_target(addr(0x66));

    let actions = vec![good, bad];
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }
    enter_execution_window(&mut env, &dao);
    let events_before = dao.events().len();

    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &actions),
        Err(DaoError::ActionFailed { index: 1, .. })
    ));

    // Nothing partial is observable: the first action's dispatch and value
    // movement are gone, the transient executing flag is cleared, and the
    // proposal is still executable.
    assert!(env.dispatched().is_empty());
    assert_eq!(env.balance(dao_address()), 10_000);
    assert_eq!(dao.events().len(), events_before);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::ReadyForExecute);
}

#[test]
fn missed_window_closes_permanently() {
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }

    let cfg = dao.config();
    env.set_now(1_000 + cfg.voting_period_secs + cfg.execution_window_secs);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
    assert!(matches!(
        dao.execute(&mut env, addr(1), id, &actions),
        Err(DaoError::CannotExecute(_))
    ));

    // No resurrection, ever.
    env.advance(1_000_000);
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
}

#[test]
fn execute_requires_membership() {
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);
    for b in 1..=3 {
        dao.vote(&env, addr(b), id, true).unwrap();
    }
    enter_execution_window(&mut env, &dao);

    assert!(matches!(
        dao.execute(&mut env, addr(0x99), id, &actions),
        Err(DaoError::NotMember(_))
    ));
}

#[test]
fn canceled_proposal_stops_accepting_votes() {
    let (mut dao, env) = setup(10);
    let actions = purchase_actions(600);
    let id = propose_actions(&mut dao, &env, addr(1), &actions);

    dao.cancel(&env, addr(1), id).unwrap();
    assert_eq!(dao.proposal_status(&env, id), ProposalStatus::Closed);
    assert!(matches!(
        dao.vote(&env, addr(2), id, true),
        Err(DaoError::NotVoting(_))
    ));
}

#[test]
fn proposal_ids_are_sequential_and_independent() {
    let (mut dao, mut env) = setup(10);
    let actions = purchase_actions(600);
    let first = propose_actions(&mut dao, &env, addr(1), &actions);
    let second = propose_actions(&mut dao, &env, addr(2), &actions);
    assert_eq!((first, second), (1, 2));

    // Votes on one proposal do not leak into the other.
    dao.vote(&env, addr(1), first, true).unwrap();
    dao.vote(&env, addr(1), second, false).unwrap();
    assert_eq!(dao.member_vote(first, addr(1)), Some(true));
    assert_eq!(dao.member_vote(second, addr(1)), Some(false));

    enter_execution_window(&mut env, &dao);
    assert_eq!(dao.proposal_status(&env, first), ProposalStatus::Closed);
}
