#![allow(non_snake_case)]
use alloy::primitives::U256;
use done_predict::{
    config::{Capabilities, HubConfig, RouterVersion},
    error::{ChainError, RejectReason, SequenceError},
    reader::StateReader,
    sequencer::Sequencer,
    test_helpers::*,
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
        .refresh_token_state(
            alloy::primitives::Address::ZERO,
            done_predict::config::BET_CONTRACT_ADDRESS,
        )
        .await;
    Sequencer::new(chain, reader, test_session(), cfg)
}

#[tokio::test]
async fn swap__min_out_applies_slippage_to_best_quote() {
    // given a wallet holding 100 DONE and one quoted tier
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    chain.set_quote(Some(500), units(40));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    // when
    let outcome = sequencer.submit_swap("100").await.unwrap();

    // then the guard is quote minus the 1% default tolerance
    assert!(outcome.success);
    let swap = chain.last_swap().expect("swap recorded");
    assert_eq!(swap.amount_in, units(100));
    assert_eq!(swap.min_out, units(40) * U256::from(9_900u64) / U256::from(10_000u64));
    assert_eq!(swap.fee_tier, Some(500));
}

#[tokio::test]
async fn swap__picks_best_of_several_tiers() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    chain.set_allowance(units(100));
    chain.set_quote(Some(500), units(38));
    chain.set_quote(Some(3_000), units(41));
    chain.set_quote(Some(10_000), units(40));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    sequencer.submit_swap("100").await.unwrap();

    let swap = chain.last_swap().unwrap();
    assert_eq!(swap.fee_tier, Some(3_000));
    // a sufficient allowance means no approval transaction
    assert_eq!(chain.calls().approve, 0);
}

#[tokio::test]
async fn swap__approves_router_when_allowance_short() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    chain.set_quote(Some(500), units(40));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    sequencer.submit_swap("100").await.unwrap();

    let calls = chain.calls();
    assert_eq!(calls.approve, 1);
    assert_eq!(calls.swap, 1);
}

#[tokio::test]
async fn swap__v2_route_carries_no_fee_tier() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    chain.set_allowance(units(100));
    chain.set_quote(None, units(39));
    let cfg = HubConfig {
        capabilities: Capabilities {
            swap_router_version: RouterVersion::V2,
            ..Capabilities::default()
        },
        ..HubConfig::default()
    };
    let sequencer = ready_sequencer(chain.clone(), cfg).await;

    sequencer.submit_swap("100").await.unwrap();

    assert_eq!(chain.last_swap().unwrap().fee_tier, None);
}

#[tokio::test]
async fn swap__invalid_amount_is_rejected_locally() {
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer.submit_swap("abc").await.unwrap_err();

    assert_eq!(err, SequenceError::Rejected(RejectReason::InvalidAmount));
    assert_eq!(chain.calls().swap, 0);
}

#[tokio::test]
async fn swap__no_quoted_tier_means_no_transaction() {
    // no quotes programmed at all
    let chain = Arc::new(MockChain::new());
    chain.set_balance(units(100));
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer.submit_swap("100").await.unwrap_err();

    assert!(matches!(
        err,
        SequenceError::Chain(ChainError::QuoteUnavailable(_))
    ));
    let calls = chain.calls();
    assert_eq!(calls.approve, 0);
    assert_eq!(calls.swap, 0);
}

#[tokio::test]
async fn airdrop_claim__low_score_blocks_before_any_call() {
    let chain = Arc::new(MockChain::new());
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let err = sequencer.submit_airdrop_claim(Some(0.2)).await.unwrap_err();

    assert_eq!(err, SequenceError::ScoreIneligible);
    assert_eq!(chain.calls().airdrop_claim, 0);
}

#[tokio::test]
async fn airdrop_claim__threshold_score_is_eligible() {
    let chain = Arc::new(MockChain::new());
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let outcome = sequencer.submit_airdrop_claim(Some(0.35)).await.unwrap();

    assert!(outcome.success);
    assert_eq!(chain.calls().airdrop_claim, 1);
}

#[tokio::test]
async fn airdrop_claim__unknown_score_proceeds_to_the_contract() {
    // the score gate is advisory; an unreachable backend never blocks
    let chain = Arc::new(MockChain::new());
    let sequencer = ready_sequencer(chain.clone(), HubConfig::default()).await;

    let outcome = sequencer.submit_airdrop_claim(None).await.unwrap();

    assert!(outcome.success);
    assert_eq!(chain.calls().airdrop_claim, 1);
}
