//! Quote/State reader: polls contract getters and caches the last good
//! values. Reads fail soft; a stale display beats a blocked one, so errors
//! are logged and the previous value is kept.

use crate::{
    client::{
        ChainClient,
        RoundSnapshot,
    },
    config::{
        HubConfig,
        QUOTE_FEE_TIERS,
        RouterVersion,
    },
    error::ChainError,
};
use alloy::primitives::{
    Address,
    U256,
};
use chrono::Utc;
use std::sync::{
    Arc,
    Mutex,
};
use tracing::warn;

/// Cached token-side view. Decimals are immutable for a token, fetched once
/// per session.
#[derive(Clone, Debug, Default)]
pub struct TokenState {
    pub decimals: Option<u8>,
    pub balance: U256,
    pub allowance: U256,
}

/// Prediction-contract globals refreshed together, as the dApp did.
#[derive(Clone, Debug, Default)]
pub struct Basics {
    pub min_bet: U256,
    pub fee_bps: u64,
    pub current_epoch: u64,
    pub pool_balance: U256,
}

/// A round plus its countdowns, computed at read completion.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundView {
    pub snapshot: RoundSnapshot,
    pub secs_to_lock: u64,
    pub secs_to_close: u64,
}

/// Seconds until lock and close, floored at zero. `now` is taken when the
/// read completes, not when it was issued; the small skew is accepted.
pub fn countdowns(round: &RoundSnapshot, now: u64) -> (u64, u64) {
    (
        round.lock_time.saturating_sub(now),
        round.close_time.saturating_sub(now),
    )
}

pub struct StateReader<C> {
    chain: Arc<C>,
    token: Mutex<TokenState>,
    basics: Mutex<Basics>,
    round: Mutex<Option<RoundView>>,
}

impl<C: ChainClient> StateReader<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self {
            chain,
            token: Mutex::new(TokenState::default()),
            basics: Mutex::new(Basics::default()),
            round: Mutex::new(None),
        }
    }

    pub fn token_state(&self) -> TokenState {
        self.token.lock().expect("token cache poisoned").clone()
    }

    pub fn basics(&self) -> Basics {
        self.basics.lock().expect("basics cache poisoned").clone()
    }

    pub fn round_view(&self) -> Option<RoundView> {
        self.round.lock().expect("round cache poisoned").clone()
    }

    /// Parallel refresh of decimals (first time only), balance and allowance.
    /// Each read fails soft, keeping its last-known value.
    pub async fn refresh_token_state(
        &self,
        owner: Address,
        spender: Address,
    ) -> TokenState {
        let need_decimals = self.token_state().decimals.is_none();
        let (balance, allowance) = futures::join!(
            self.chain.token_balance(owner),
            self.chain.token_allowance(owner, spender),
        );
        let decimals = if need_decimals {
            Some(self.chain.token_decimals().await)
        } else {
            None
        };

        let mut token = self.token.lock().expect("token cache poisoned");
        match balance {
            Ok(v) => token.balance = v,
            Err(e) => warn!(error = %e, "balance read failed, keeping last value"),
        }
        match allowance {
            Ok(v) => token.allowance = v,
            Err(e) => warn!(error = %e, "allowance read failed, keeping last value"),
        }
        if let Some(result) = decimals {
            match result {
                Ok(v) => token.decimals = Some(v),
                Err(e) => warn!(error = %e, "decimals read failed"),
            }
        }
        token.clone()
    }

    /// Parallel refresh of the prediction contract globals.
    pub async fn refresh_basics(&self) -> Basics {
        let (min_bet, fee_bps, epoch, pool) = futures::join!(
            self.chain.min_bet_amount(),
            self.chain.fee_bps(),
            self.chain.current_epoch(),
            self.chain.pool_balance(),
        );
        let mut basics = self.basics.lock().expect("basics cache poisoned");
        match min_bet {
            Ok(v) => basics.min_bet = v,
            Err(e) => warn!(error = %e, "minBetAmount read failed"),
        }
        match fee_bps {
            Ok(v) => basics.fee_bps = v,
            Err(e) => warn!(error = %e, "feeBps read failed"),
        }
        match epoch {
            Ok(v) => basics.current_epoch = v,
            Err(e) => warn!(error = %e, "currentEpoch read failed"),
        }
        match pool {
            Ok(v) => basics.pool_balance = v,
            Err(e) => warn!(error = %e, "poolBalance read failed"),
        }
        basics.clone()
    }

    /// Fetch one round fresh and derive its countdowns.
    pub async fn refresh_round(&self, epoch: u64) -> Option<RoundView> {
        match self.chain.round(epoch).await {
            Ok(snapshot) => {
                let now = Utc::now().timestamp().max(0) as u64;
                let (secs_to_lock, secs_to_close) = countdowns(&snapshot, now);
                let view = RoundView {
                    snapshot,
                    secs_to_lock,
                    secs_to_close,
                };
                *self.round.lock().expect("round cache poisoned") = Some(view.clone());
                Some(view)
            }
            Err(e) => {
                warn!(epoch, error = %e, "round read failed, keeping last value");
                self.round_view()
            }
        }
    }

    /// Best available swap quote for selling `amount_in` DONE. V3 probes every
    /// fee tier and keeps the highest output; V2 asks the router directly.
    pub async fn best_quote(
        &self,
        cfg: &HubConfig,
        amount_in: U256,
    ) -> Result<SwapQuote, ChainError> {
        match cfg.capabilities.swap_router_version {
            RouterVersion::V2 => {
                let out = self.chain.quote(amount_in, None).await?;
                Ok(SwapQuote {
                    amount_out: out,
                    fee_tier: None,
                })
            }
            RouterVersion::V3 => {
                let mut best: Option<SwapQuote> = None;
                for fee in QUOTE_FEE_TIERS {
                    match self.chain.quote(amount_in, Some(fee)).await {
                        Ok(out) => {
                            let better = best
                                .as_ref()
                                .map(|b| out > b.amount_out)
                                .unwrap_or(true);
                            if better {
                                best = Some(SwapQuote {
                                    amount_out: out,
                                    fee_tier: Some(fee),
                                });
                            }
                        }
                        Err(e) => {
                            warn!(fee, error = %e, "quote failed for fee tier")
                        }
                    }
                }
                best.ok_or_else(|| {
                    ChainError::QuoteUnavailable(
                        "no fee tier returned a quote".to_string(),
                    )
                })
            }
        }
    }
}

/// Winning quote and the fee tier that produced it (None for V2 routes).
#[derive(Clone, Debug, PartialEq)]
pub struct SwapQuote {
    pub amount_out: U256,
    pub fee_tier: Option<u32>,
}
