//! Claim scanner: classifies the user's bets over a bounded window of past
//! rounds and collects the epochs eligible for a batch claim.
//!
//! The payout figure is a client-side estimate rebuilt from contract getters;
//! the contract's own claim transaction stays authoritative.

use crate::{
    client::{
        ChainClient,
        RoundResult,
        RoundSnapshot,
        Side,
        UserBetRecord,
    },
    error::ChainError,
};
use alloy::primitives::{
    Address,
    U256,
};

/// Classification of one epoch with a nonzero bet. Total over
/// {closed, claimed, result, side}: every combination maps to exactly one
/// variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClaimStatus {
    Open,
    Claimed,
    ClaimableDraw,
    Claimable,
    Lost,
}

impl ClaimStatus {
    pub fn is_claimable(self) -> bool {
        matches!(self, ClaimStatus::Claimable | ClaimStatus::ClaimableDraw)
    }

    pub fn label(self) -> &'static str {
        match self {
            ClaimStatus::Open => "Open",
            ClaimStatus::Claimed => "Claimed",
            ClaimStatus::ClaimableDraw => "Claimable (Draw)",
            ClaimStatus::Claimable => "Claimable",
            ClaimStatus::Lost => "Lost",
        }
    }
}

/// Derived per-epoch view; recomputed on every scan, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochClaim {
    pub epoch: u64,
    pub status: ClaimStatus,
    pub amount: U256,
    pub payout: U256,
}

/// Scan output: rows ordered oldest to newest, plus the batch-claimable
/// epoch subset in the same order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClaimReport {
    pub rows: Vec<EpochClaim>,
    pub claimable: Vec<u64>,
}

/// Estimated payout for a winning bet. Fee and payout both use floor
/// division, matching the on-chain arithmetic: the rounding favors the pool
/// over the claimant.
pub fn winner_payout(
    amount: U256,
    total_up: U256,
    total_down: U256,
    fee_bps: u64,
    winner: Side,
) -> U256 {
    let total_pool = total_up.saturating_add(total_down);
    let fee = total_pool * U256::from(fee_bps) / U256::from(10_000u64);
    let reward_pool = total_pool - fee;
    let winning_total = match winner {
        Side::Up => total_up,
        Side::Down => total_down,
    };
    if winning_total.is_zero() {
        return U256::ZERO;
    }
    amount * reward_pool / winning_total
}

/// Classify one epoch. Returns `None` when the user has no bet there; such
/// epochs never appear in the report.
pub fn classify(
    round: &RoundSnapshot,
    bet: &UserBetRecord,
    fee_bps: u64,
) -> Option<EpochClaim> {
    if bet.amount.is_zero() {
        return None;
    }
    let (status, payout) = if !round.closed {
        (ClaimStatus::Open, U256::ZERO)
    } else if bet.claimed {
        (ClaimStatus::Claimed, U256::ZERO)
    } else {
        match round.result {
            RoundResult::Draw => (ClaimStatus::ClaimableDraw, bet.amount),
            RoundResult::Up if bet.position == Side::Up => (
                ClaimStatus::Claimable,
                winner_payout(
                    bet.amount,
                    round.total_up,
                    round.total_down,
                    fee_bps,
                    Side::Up,
                ),
            ),
            RoundResult::Down if bet.position == Side::Down => (
                ClaimStatus::Claimable,
                winner_payout(
                    bet.amount,
                    round.total_up,
                    round.total_down,
                    fee_bps,
                    Side::Down,
                ),
            ),
            _ => (ClaimStatus::Lost, U256::ZERO),
        }
    };
    Some(EpochClaim {
        epoch: round.epoch,
        status,
        amount: bet.amount,
        payout,
    })
}

/// Walk epochs `max(1, current - window) ..= current`, reading round and bet
/// data for each, oldest first.
pub async fn scan<C: ChainClient>(
    chain: &C,
    user: Address,
    fee_bps: u64,
    current_epoch: u64,
    window: u64,
) -> Result<ClaimReport, ChainError> {
    let start = current_epoch.saturating_sub(window).max(1);
    let mut report = ClaimReport::default();
    for epoch in start..=current_epoch {
        let round = chain.round(epoch).await?;
        let bet = chain.user_bet(epoch, user).await?;
        if let Some(row) = classify(&round, &bet, fee_bps) {
            if row.status.is_claimable() {
                report.claimable.push(epoch);
            }
            report.rows.push(row);
        }
    }
    Ok(report)
}
