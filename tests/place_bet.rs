#![allow(non_snake_case)]
use alloy::primitives::{Address, U256};
use done_predict::{
    config::{ApprovalPolicy, BET_CONTRACT_ADDRESS, HubConfig},
    error::{RejectReason, SequenceError},
    reader::StateReader,
    sequencer::{SequencePhase, Sequencer},
    test_helpers::*,
    Side,
};
use std::sync::Arc;

fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(10u8).pow(U256::from(18u8))
}

async fn ready_sequencer(
    chain: Arc<MockChain>,
    cfg: HubConfig,
) -> Sequencer<MockChain> {
    let reader = Arc::new(StateReader::new(chain.clone()));
    reader.refresh_basics().await;
    reader
        .refresh_token_state(Address::ZERO, BET_CONTRACT_ADDRESS)
        .await;
    reader.refresh_round(1).await;
    Sequencer::new(chain, reader, test_session(), cfg)
}

#[tokio::test]
async fn place_bet__approves_before_betting_when_allowance_short() {
    // given a funded wallet with no allowance
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    chain.set_min_bet(units(2_000));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    // when
    let outcome = sequencer
        .submit_bet(Some(Side::Up), "2000")
        .await
        .unwrap();

    // then approval ran, confirmed, and the bet followed
    assert!(outcome.success);
    let calls = chain.calls();
    assert_eq!(calls.approve, 1);
    assert_eq!(calls.place_bet, 1);
    let bet = chain.bet_at(1).expect("bet recorded");
    assert_eq!(bet.amount, units(2_000));
    assert_eq!(bet.position, Side::Up);
}

#[tokio::test]
async fn place_bet__skips_approval_when_allowance_sufficient() {
    // given an allowance that already covers the bet
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    chain.set_allowance(units(5_000));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    // when
    sequencer
        .submit_bet(Some(Side::Down), "2000")
        .await
        .unwrap();

    // then no approval transaction was issued
    let calls = chain.calls();
    assert_eq!(calls.approve, 0);
    assert_eq!(calls.place_bet, 1);
}

#[tokio::test]
async fn place_bet__unlimited_approval_policy_approves_max() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    let cfg = HubConfig {
        approval_policy: ApprovalPolicy::Unlimited,
        ..HubConfig::default()
    };
    let sequencer = ready_sequencer(chain.clone(), cfg).await;

    sequencer.submit_bet(Some(Side::Up), "2000").await.unwrap();

    // the mock records the approved amount as the new allowance
    assert_eq!(chain.calls().approve, 1);
    let reader = StateReader::new(chain.clone());
    let token = reader
        .refresh_token_state(Address::ZERO, BET_CONTRACT_ADDRESS)
        .await;
    assert_eq!(token.allowance, U256::MAX);
}

#[tokio::test]
async fn place_bet__validator_rejection_makes_no_writes() {
    // given a wallet that cannot cover the bet
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    chain.set_min_bet(units(2_000));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    // when
    let err = sequencer
        .submit_bet(Some(Side::Up), "2000")
        .await
        .unwrap_err();

    // then the failure is local and nothing was broadcast
    assert_eq!(
        err,
        SequenceError::Rejected(RejectReason::InsufficientBalance)
    );
    let calls = chain.calls();
    assert_eq!(calls.approve, 0);
    assert_eq!(calls.place_bet, 0);
}

#[tokio::test]
async fn place_bet__already_bet_this_epoch_is_rejected() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    chain.insert_bet(done_predict::UserBetRecord {
        epoch: 1,
        amount: units(500),
        position: Side::Up,
        claimed: false,
    });
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer
        .submit_bet(Some(Side::Up), "2000")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SequenceError::Rejected(RejectReason::AlreadyBetThisEpoch)
    );
    assert_eq!(chain.calls().place_bet, 0);
}

#[tokio::test]
async fn place_bet__revert_surfaces_reason_and_is_not_retried() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    chain.set_allowance(units(10_000));
    chain.set_revert_next_write("betting window closed");
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer
        .submit_bet(Some(Side::Up), "2000")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SequenceError::TransactionReverted("betting window closed".to_string())
    );
    // exactly one attempt, never an automatic retry
    assert_eq!(chain.calls().place_bet, 1);
}

#[tokio::test]
async fn place_bet__fails_when_approval_does_not_move_allowance() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    chain.set_approve_is_noop(true);
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer
        .submit_bet(Some(Side::Up), "2000")
        .await
        .unwrap_err();

    assert_eq!(err, SequenceError::AllowanceStillInsufficient);
    assert_eq!(chain.calls().approve, 1);
    assert_eq!(chain.calls().place_bet, 0);
}

#[tokio::test]
async fn place_bet__phases_end_settled_on_success() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(10_000));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;
    let phases = sequencer.subscribe();

    sequencer.submit_bet(Some(Side::Up), "2000").await.unwrap();

    assert_eq!(*phases.borrow(), SequencePhase::Settled);
}

#[tokio::test]
async fn place_bet__phases_end_failed_with_validator_reason() {
    let chain = Arc::new(MockChain::new());
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;
    let phases = sequencer.subscribe();

    let _ = sequencer.submit_bet(None, "2000").await.unwrap_err();

    match &*phases.borrow() {
        SequencePhase::Failed(reason) => {
            assert_eq!(reason, RejectReason::NoSideSelected.message())
        }
        other => panic!("expected Failed phase, got {other:?}"),
    }
}
