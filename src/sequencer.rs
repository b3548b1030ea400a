//! Transaction sequencer: turns one user intent into an ordered
//! read-then-write sequence with local precondition checks.
//!
//! Per action: Idle -> Validating -> CheckingAllowance -> Approving?
//! -> Submitting -> Confirming -> Settled | Failed. Nothing is cancellable
//! after Submitting; before that no irreversible action has happened. One
//! sequence per action kind may be in flight at a time.

use crate::{
    client::{
        ChainClient,
        Side,
        TxOutcome,
    },
    config::{
        self,
        ApprovalPolicy,
        HubConfig,
        MIN_SCORE,
        RouterVersion,
    },
    error::{
        RejectReason,
        SequenceError,
    },
    reader::StateReader,
    session::WalletSession,
    validate::{
        BetContext,
        validate_bet,
    },
};
use alloy::primitives::{
    Address,
    U256,
};
use chrono::Utc;
use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
    },
};
use tokio::sync::watch;
use tracing::info;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ActionKind {
    Bet,
    Claim,
    Swap,
    Airdrop,
}

impl ActionKind {
    fn name(self) -> &'static str {
        match self {
            ActionKind::Bet => "bet",
            ActionKind::Claim => "claim",
            ActionKind::Swap => "swap",
            ActionKind::Airdrop => "airdrop claim",
        }
    }
}

/// Observable progress of the most recent sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum SequencePhase {
    Idle,
    Validating,
    CheckingAllowance,
    Approving,
    Submitting,
    Confirming,
    Settled,
    Failed(String),
}

pub struct Sequencer<C: ChainClient> {
    chain: Arc<C>,
    reader: Arc<StateReader<C>>,
    session: WalletSession,
    cfg: HubConfig,
    phase_tx: watch::Sender<SequencePhase>,
    in_flight: Mutex<HashSet<ActionKind>>,
}

struct FlightGuard<'a> {
    set: &'a Mutex<HashSet<ActionKind>>,
    kind: ActionKind,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.kind);
    }
}

impl<C: ChainClient> Sequencer<C> {
    pub fn new(
        chain: Arc<C>,
        reader: Arc<StateReader<C>>,
        session: WalletSession,
        cfg: HubConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SequencePhase::Idle);
        Self {
            chain,
            reader,
            session,
            cfg,
            phase_tx,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Subscribe to phase transitions of subsequent sequences.
    pub fn subscribe(&self) -> watch::Receiver<SequencePhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, phase: SequencePhase) {
        self.phase_tx.send_replace(phase);
    }

    fn acquire(&self, kind: ActionKind) -> Result<FlightGuard<'_>, SequenceError> {
        let mut set = self.in_flight.lock().expect("in-flight set poisoned");
        if !set.insert(kind) {
            return Err(SequenceError::AlreadyInFlight(kind.name()));
        }
        Ok(FlightGuard {
            set: &self.in_flight,
            kind,
        })
    }

    /// Place a bet of `amount_text` DONE on `side` in the current epoch.
    pub async fn submit_bet(
        &self,
        side: Option<Side>,
        amount_text: &str,
    ) -> Result<TxOutcome, SequenceError> {
        let _gate = self.acquire(ActionKind::Bet)?;
        self.finish(self.run_bet(side, amount_text).await).await
    }

    async fn run_bet(
        &self,
        side: Option<Side>,
        amount_text: &str,
    ) -> Result<TxOutcome, SequenceError> {
        self.set_phase(SequencePhase::Validating);
        let owner = self.session.address;
        let token = self.reader.token_state();
        let basics = self.reader.basics();
        // round and existing bet are race prone; read them fresh, but only
        // once connectivity is settled so a disconnected wallet costs nothing
        let (round, existing_bet) = if self.session.is_connected {
            let round = self
                .reader
                .refresh_round(basics.current_epoch)
                .await
                .map(|v| v.snapshot);
            let existing = self
                .chain
                .user_bet(basics.current_epoch, owner)
                .await?
                .amount;
            (round, existing)
        } else {
            (self.reader.round_view().map(|v| v.snapshot), U256::ZERO)
        };
        let ctx = BetContext {
            connected: self.session.is_connected,
            decimals: token.decimals.unwrap_or(18),
            balance: token.balance,
            min_bet: basics.min_bet,
            pool_balance: basics.pool_balance,
            round,
            existing_bet,
            now: now_secs(),
        };
        let (side, amount) =
            validate_bet(side, amount_text, &ctx).map_err(SequenceError::Rejected)?;

        self.ensure_allowance(owner, config::BET_CONTRACT_ADDRESS, amount)
            .await?;

        self.set_phase(SequencePhase::Submitting);
        let outcome = self.chain.place_bet(side, amount).await?;
        info!(side = ?side, %amount, tx = %outcome.tx_hash, "bet submitted");
        self.set_phase(SequencePhase::Confirming);
        Ok(outcome)
    }

    /// Claim the reward of one settled epoch.
    pub async fn submit_claim(&self, epoch: u64) -> Result<TxOutcome, SequenceError> {
        let _gate = self.acquire(ActionKind::Claim)?;
        let result = async {
            self.set_phase(SequencePhase::Validating);
            self.require_connected()?;
            self.set_phase(SequencePhase::Submitting);
            let outcome = self.chain.claim(epoch).await?;
            info!(epoch, tx = %outcome.tx_hash, "claim submitted");
            self.set_phase(SequencePhase::Confirming);
            Ok(outcome)
        }
        .await;
        self.finish(result).await
    }

    /// Claim several epochs: one `claimBatch` transaction when the deployed
    /// front end supports it, otherwise sequential single claims.
    pub async fn submit_claim_all(
        &self,
        epochs: &[u64],
    ) -> Result<TxOutcome, SequenceError> {
        let _gate = self.acquire(ActionKind::Claim)?;
        let result = async {
            self.set_phase(SequencePhase::Validating);
            self.require_connected()?;
            if epochs.is_empty() {
                return Err(SequenceError::NothingToClaim);
            }
            self.set_phase(SequencePhase::Submitting);
            if self.cfg.capabilities.supports_claim_batch {
                let outcome = self.chain.claim_batch(epochs).await?;
                info!(count = epochs.len(), tx = %outcome.tx_hash, "batch claim submitted");
                self.set_phase(SequencePhase::Confirming);
                Ok(outcome)
            } else {
                let mut last = None;
                for &epoch in epochs {
                    let outcome = self.chain.claim(epoch).await?;
                    self.set_phase(SequencePhase::Confirming);
                    if !outcome.success {
                        return Ok(outcome);
                    }
                    last = Some(outcome);
                }
                last.ok_or(SequenceError::NothingToClaim)
            }
        }
        .await;
        self.finish(result).await
    }

    /// Sell `amount_text` DONE through the configured router, guarded by the
    /// best available quote minus the slippage tolerance.
    pub async fn submit_swap(
        &self,
        amount_text: &str,
    ) -> Result<TxOutcome, SequenceError> {
        let _gate = self.acquire(ActionKind::Swap)?;
        self.finish(self.run_swap(amount_text).await).await
    }

    async fn run_swap(&self, amount_text: &str) -> Result<TxOutcome, SequenceError> {
        self.set_phase(SequencePhase::Validating);
        self.require_connected()?;
        let owner = self.session.address;
        let token = self.reader.token_state();
        let amount =
            crate::units::parse_units(amount_text, token.decimals.unwrap_or(18))
                .ok_or(SequenceError::Rejected(RejectReason::InvalidAmount))?;

        let quote = self.reader.best_quote(&self.cfg, amount).await?;
        let min_out = quote.amount_out
            * U256::from(10_000u64 - self.cfg.swap_slippage_bps)
            / U256::from(10_000u64);
        let deadline = now_secs() + self.cfg.swap_deadline_secs;

        let spender = match self.cfg.capabilities.swap_router_version {
            RouterVersion::V2 => config::V2_ROUTER_ADDRESS,
            RouterVersion::V3 => config::V3_ROUTER_ADDRESS,
        };
        self.ensure_allowance(owner, spender, amount).await?;

        self.set_phase(SequencePhase::Submitting);
        let outcome = self
            .chain
            .swap(amount, min_out, quote.fee_tier, deadline)
            .await?;
        info!(%amount, %min_out, tx = %outcome.tx_hash, "swap submitted");
        self.set_phase(SequencePhase::Confirming);
        Ok(outcome)
    }

    /// Claim the airdrop. The score gate is advisory; the contract enforces
    /// eligibility on-chain regardless.
    pub async fn submit_airdrop_claim(
        &self,
        score: Option<f64>,
    ) -> Result<TxOutcome, SequenceError> {
        let _gate = self.acquire(ActionKind::Airdrop)?;
        let result = async {
            self.set_phase(SequencePhase::Validating);
            self.require_connected()?;
            if matches!(score, Some(s) if s < MIN_SCORE) {
                return Err(SequenceError::ScoreIneligible);
            }
            self.set_phase(SequencePhase::Submitting);
            let outcome = self.chain.claim_airdrop().await?;
            info!(tx = %outcome.tx_hash, "airdrop claim submitted");
            self.set_phase(SequencePhase::Confirming);
            Ok(outcome)
        }
        .await;
        self.finish(result).await
    }

    fn require_connected(&self) -> Result<(), SequenceError> {
        if self.session.is_connected {
            Ok(())
        } else {
            Err(SequenceError::Rejected(RejectReason::WalletNotConnected))
        }
    }

    /// Re-read balance and allowance fresh (never from the poll cache) and
    /// approve if short. After an approval confirms the allowance is read
    /// back; a spender that still cannot pull the amount is a policy error,
    /// not a contract error.
    async fn ensure_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), SequenceError> {
        self.set_phase(SequencePhase::CheckingAllowance);
        let balance = self.chain.token_balance(owner).await?;
        if balance < amount {
            return Err(SequenceError::Rejected(RejectReason::InsufficientBalance));
        }
        let allowance = self.chain.token_allowance(owner, spender).await?;
        if allowance >= amount {
            return Ok(());
        }

        self.set_phase(SequencePhase::Approving);
        let approve_amount = match self.cfg.approval_policy {
            ApprovalPolicy::Exact => amount,
            ApprovalPolicy::Unlimited => U256::MAX,
        };
        let outcome = self.chain.approve(spender, approve_amount).await?;
        if !outcome.success {
            return Err(SequenceError::TransactionReverted(
                outcome
                    .revert_reason
                    .unwrap_or_else(|| "approve reverted".to_string()),
            ));
        }
        let confirmed = self.chain.token_allowance(owner, spender).await?;
        if confirmed < amount {
            return Err(SequenceError::AllowanceStillInsufficient);
        }
        Ok(())
    }

    /// Resolve the confirmation, refresh caches on settlement, and publish
    /// the terminal phase. Every failure leaves the sequencer ready again.
    async fn finish(
        &self,
        result: Result<TxOutcome, SequenceError>,
    ) -> Result<TxOutcome, SequenceError> {
        match result {
            Ok(outcome) if outcome.success => {
                self.reader
                    .refresh_token_state(
                        self.session.address,
                        config::BET_CONTRACT_ADDRESS,
                    )
                    .await;
                self.reader.refresh_basics().await;
                self.set_phase(SequencePhase::Settled);
                Ok(outcome)
            }
            Ok(outcome) => {
                let reason = outcome
                    .revert_reason
                    .unwrap_or_else(|| "execution reverted".to_string());
                self.set_phase(SequencePhase::Failed(reason.clone()));
                Err(SequenceError::TransactionReverted(reason))
            }
            Err(e) => {
                self.set_phase(SequencePhase::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
