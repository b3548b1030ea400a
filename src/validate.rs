//! Precondition validator: pure, synchronous checks over locally cached
//! state, run before any gas is spent. Rejection priority is fixed so tests
//! and status lines are deterministic: connectivity, then input validity,
//! then timing, then economics.

use crate::{
    client::{
        RoundSnapshot,
        Side,
    },
    error::RejectReason,
    units,
};
use alloy::primitives::U256;

/// Everything the validator looks at, captured from the caches. The
/// sequencer re-reads the race-prone fields (balance, allowance) fresh
/// before submitting; this check only avoids obviously wasted transactions.
#[derive(Clone, Debug, Default)]
pub struct BetContext {
    pub connected: bool,
    pub decimals: u8,
    pub balance: U256,
    pub min_bet: U256,
    pub pool_balance: U256,
    pub round: Option<RoundSnapshot>,
    /// Raw amount of the user's existing bet for the current epoch.
    pub existing_bet: U256,
    /// Wall-clock seconds, supplied by the caller for determinism.
    pub now: u64,
}

/// Validate a proposed bet. On success returns the amount in base units.
pub fn validate_bet(
    side: Option<Side>,
    amount_text: &str,
    ctx: &BetContext,
) -> Result<(Side, U256), RejectReason> {
    if !ctx.connected {
        return Err(RejectReason::WalletNotConnected);
    }
    let side = side.ok_or(RejectReason::NoSideSelected)?;
    let amount = units::parse_units(amount_text, ctx.decimals)
        .ok_or(RejectReason::InvalidAmount)?;
    if amount < ctx.min_bet {
        return Err(RejectReason::BelowMinimum);
    }
    let round = ctx.round.as_ref().ok_or(RejectReason::RoundNotStarted)?;
    if round.start_time == 0 {
        return Err(RejectReason::RoundNotStarted);
    }
    if round.locked || ctx.now >= round.lock_time {
        return Err(RejectReason::RoundLocked);
    }
    if !ctx.existing_bet.is_zero() {
        return Err(RejectReason::AlreadyBetThisEpoch);
    }
    if ctx.balance < amount {
        return Err(RejectReason::InsufficientBalance);
    }
    if ctx.pool_balance.is_zero() {
        return Err(RejectReason::PoolExhausted);
    }
    Ok((side, amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::open_round;

    fn units(n: u64) -> U256 {
        U256::from(n) * U256::from(10u8).pow(U256::from(18u8))
    }

    fn ready_ctx() -> BetContext {
        BetContext {
            connected: true,
            decimals: 18,
            balance: units(10_000),
            min_bet: units(2_000),
            pool_balance: units(1_000_000),
            round: Some(open_round(5, 1_000)),
            existing_bet: U256::ZERO,
            now: 1_000,
        }
    }

    #[test]
    fn validate_bet__ok_returns_base_units() {
        let ctx = ready_ctx();
        let (side, amount) = validate_bet(Some(Side::Up), "2000", &ctx).unwrap();
        assert_eq!(side, Side::Up);
        assert_eq!(amount, units(2_000));
    }

    #[test]
    fn validate_bet__disconnected_wins_over_invalid_amount() {
        let mut ctx = ready_ctx();
        ctx.connected = false;
        // both conditions hold, only the higher-priority one is reported
        let err = validate_bet(Some(Side::Up), "not-a-number", &ctx).unwrap_err();
        assert_eq!(err, RejectReason::WalletNotConnected);
    }

    #[test]
    fn validate_bet__no_side_selected() {
        let err = validate_bet(None, "2000", &ready_ctx()).unwrap_err();
        assert_eq!(err, RejectReason::NoSideSelected);
    }

    #[test]
    fn validate_bet__invalid_amount() {
        for bad in ["", "zero", "0", "-3"] {
            let err = validate_bet(Some(Side::Down), bad, &ready_ctx()).unwrap_err();
            assert_eq!(err, RejectReason::InvalidAmount, "input {bad:?}");
        }
    }

    #[test]
    fn validate_bet__comma_amount_accepted() {
        let (_, amount) =
            validate_bet(Some(Side::Up), "2500,5", &ready_ctx()).unwrap();
        assert_eq!(
            amount,
            units(2_500) + U256::from(5u64) * U256::from(10u8).pow(U256::from(17u8))
        );
    }

    #[test]
    fn validate_bet__below_minimum() {
        let err = validate_bet(Some(Side::Up), "1999", &ready_ctx()).unwrap_err();
        assert_eq!(err, RejectReason::BelowMinimum);
    }

    #[test]
    fn validate_bet__round_not_started() {
        let mut ctx = ready_ctx();
        ctx.round = None;
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::RoundNotStarted
        );
        let mut ctx = ready_ctx();
        if let Some(round) = ctx.round.as_mut() {
            round.start_time = 0;
        }
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::RoundNotStarted
        );
    }

    #[test]
    fn validate_bet__locked_by_flag_or_clock() {
        let mut ctx = ready_ctx();
        if let Some(round) = ctx.round.as_mut() {
            round.locked = true;
        }
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::RoundLocked
        );

        let mut ctx = ready_ctx();
        ctx.now = ctx.round.as_ref().unwrap().lock_time;
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::RoundLocked
        );
    }

    #[test]
    fn validate_bet__already_bet_this_epoch() {
        let mut ctx = ready_ctx();
        ctx.existing_bet = units(100);
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::AlreadyBetThisEpoch
        );
    }

    #[test]
    fn validate_bet__insufficient_balance() {
        let mut ctx = ready_ctx();
        ctx.balance = units(1_000);
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::InsufficientBalance
        );
    }

    #[test]
    fn validate_bet__pool_exhausted() {
        let mut ctx = ready_ctx();
        ctx.pool_balance = U256::ZERO;
        assert_eq!(
            validate_bet(Some(Side::Up), "2000", &ctx).unwrap_err(),
            RejectReason::PoolExhausted
        );
    }
}
