//! Hub controller: owns the reader, sequencer, claim scanner and score
//! client for one wallet session, and assembles the displayable snapshot.
//!
//! Constructed on connect, dropped on disconnect; nothing here survives a
//! restart except what re-reading the chain recovers.

use crate::{
    claims::{
        self,
        ClaimReport,
    },
    client::{
        ChainClient,
        Side,
        TxOutcome,
    },
    config::{
        self,
        HubConfig,
    },
    error::SequenceError,
    poller::Poller,
    reader::{
        RoundView,
        StateReader,
    },
    score::{
        self,
        ScoreClient,
    },
    sequencer::{
        SequencePhase,
        Sequencer,
    },
    session::WalletSession,
    units,
};
use alloy::primitives::Address;
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};
use tokio::sync::watch;
use tracing::error;

const ERROR_RING_CAP: usize = 50;

/// Everything a presentation layer needs for one frame.
#[derive(Clone, Debug)]
pub struct HubSnapshot {
    pub address: String,
    pub chain_id: u64,
    pub done_balance: String,
    pub pool_balance: String,
    pub min_bet: String,
    pub fee_bps: u64,
    pub current_epoch: u64,
    pub round: Option<RoundView>,
    pub selected_side: Option<Side>,
    pub claim_rows: Vec<ClaimRow>,
    pub claimable_epochs: Vec<u64>,
    pub status: String,
    pub errors: Vec<String>,
}

/// One claim-panel line, newest first, amounts already formatted.
#[derive(Clone, Debug)]
pub struct ClaimRow {
    pub epoch: u64,
    pub amount: String,
    pub payout: String,
    pub status: &'static str,
}

pub struct Hub<C: ChainClient> {
    chain: Arc<C>,
    reader: Arc<StateReader<C>>,
    sequencer: Sequencer<C>,
    score: ScoreClient,
    session: WalletSession,
    cfg: HubConfig,
    selected_side: Mutex<Option<Side>>,
    status: Mutex<String>,
    errors: Mutex<Vec<String>>,
    claims: Mutex<ClaimReport>,
}

impl<C: ChainClient> Hub<C> {
    pub fn new(chain: Arc<C>, session: WalletSession, cfg: HubConfig) -> Self {
        let reader = Arc::new(StateReader::new(chain.clone()));
        let sequencer = Sequencer::new(
            chain.clone(),
            reader.clone(),
            session.clone(),
            cfg.clone(),
        );
        let score = ScoreClient::new(cfg.score_base_url.clone());
        Self {
            chain,
            reader,
            sequencer,
            score,
            session,
            cfg,
            selected_side: Mutex::new(None),
            status: Mutex::new(String::from("Ready")),
            errors: Mutex::new(Vec::new()),
            claims: Mutex::new(ClaimReport::default()),
        }
    }

    pub fn subscribe_phases(&self) -> watch::Receiver<SequencePhase> {
        self.sequencer.subscribe()
    }

    pub fn select_side(&self, side: Side) {
        *self.selected_side.lock().expect("selection poisoned") = Some(side);
    }

    /// Full refresh: contract globals, token state, current round and the
    /// claim window. Each part fails soft.
    pub async fn refresh_all(&self) {
        let basics = self.reader.refresh_basics().await;
        self.reader
            .refresh_token_state(self.session.address, config::BET_CONTRACT_ADDRESS)
            .await;
        self.reader.refresh_round(basics.current_epoch).await;
        self.refresh_claims().await;
    }

    /// Re-scan the claim window against fresh contract data.
    pub async fn refresh_claims(&self) {
        let basics = self.reader.basics();
        if basics.current_epoch == 0 {
            return;
        }
        match claims::scan(
            self.chain.as_ref(),
            self.session.address,
            basics.fee_bps,
            basics.current_epoch,
            self.cfg.claim_window,
        )
        .await
        {
            Ok(report) => {
                *self.claims.lock().expect("claims poisoned") = report;
            }
            Err(e) => self.push_error(format!("claim scan error: {e}")),
        }
    }

    /// Place a bet of `amount_text` DONE on the selected side.
    pub async fn place_bet(&self, amount_text: &str) -> Option<TxOutcome> {
        let side = *self.selected_side.lock().expect("selection poisoned");
        match self.sequencer.submit_bet(side, amount_text).await {
            Ok(outcome) => {
                self.set_status(format!(
                    "Bet confirmed on-chain for the current epoch ({amount_text} DONE)"
                ));
                self.refresh_claims().await;
                Some(outcome)
            }
            Err(e) => {
                self.report_failure("Bet", e);
                None
            }
        }
    }

    pub async fn claim_epoch(&self, epoch: u64) -> Option<TxOutcome> {
        match self.sequencer.submit_claim(epoch).await {
            Ok(outcome) => {
                self.set_status(format!("Claimed reward for epoch #{epoch}"));
                self.refresh_claims().await;
                Some(outcome)
            }
            Err(e) => {
                self.report_failure("Claim", e);
                None
            }
        }
    }

    /// Claim every epoch the last scan found claimable.
    pub async fn claim_all(&self) -> Option<TxOutcome> {
        let epochs = self
            .claims
            .lock()
            .expect("claims poisoned")
            .claimable
            .clone();
        match self.sequencer.submit_claim_all(&epochs).await {
            Ok(outcome) => {
                self.set_status(format!("Claimed {} epochs", epochs.len()));
                self.refresh_claims().await;
                Some(outcome)
            }
            Err(e) => {
                self.report_failure("Claim all", e);
                None
            }
        }
    }

    pub async fn swap(&self, amount_text: &str) -> Option<TxOutcome> {
        match self.sequencer.submit_swap(amount_text).await {
            Ok(outcome) => {
                self.set_status(format!("Swapped {amount_text} DONE"));
                Some(outcome)
            }
            Err(e) => {
                self.report_failure("Swap", e);
                None
            }
        }
    }

    /// Claim the airdrop. The caller may pass a known Farcaster id; without
    /// one the backend session is consulted, and a score it already carries
    /// is reused instead of a second fetch.
    pub async fn claim_airdrop(&self, fid: Option<u64>) -> Option<TxOutcome> {
        let (fid, session_score) = match fid {
            Some(fid) => (Some(fid), None),
            None => match self.score.session().await {
                Some(s) => (Some(s.fid), s.score),
                None => (None, None),
            },
        };
        let score = match (session_score, fid) {
            (Some(s), _) => Some(s),
            (None, Some(fid)) => self.score.neynar_score(fid).await,
            (None, None) => None,
        };
        if score.is_some() && !score::score_eligible(score) {
            self.set_status(String::from(
                "Neynar score below 0.35, airdrop claim is locked",
            ));
        }
        match self.sequencer.submit_airdrop_claim(score).await {
            Ok(outcome) => {
                self.set_status(String::from("Airdrop claimed"));
                Some(outcome)
            }
            Err(e) => {
                self.report_failure("Airdrop claim", e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> HubSnapshot {
        let token = self.reader.token_state();
        let basics = self.reader.basics();
        let decimals = token.decimals.unwrap_or(18);
        let report = self.claims.lock().expect("claims poisoned").clone();

        // presentation order is newest first
        let claim_rows = report
            .rows
            .iter()
            .rev()
            .map(|row| ClaimRow {
                epoch: row.epoch,
                amount: units::format_units(row.amount, decimals),
                payout: units::format_units(row.payout, decimals),
                status: row.status.label(),
            })
            .collect();

        HubSnapshot {
            address: short_address(self.session.address),
            chain_id: self.session.chain_id,
            done_balance: units::format_units(token.balance, decimals),
            pool_balance: units::format_units(basics.pool_balance, decimals),
            min_bet: units::format_units(basics.min_bet, decimals),
            fee_bps: basics.fee_bps,
            current_epoch: basics.current_epoch,
            round: self.reader.round_view(),
            selected_side: *self.selected_side.lock().expect("selection poisoned"),
            claim_rows,
            claimable_epochs: report.claimable,
            status: self.status.lock().expect("status poisoned").clone(),
            errors: self
                .errors
                .lock()
                .expect("errors poisoned")
                .iter()
                .rev()
                .take(5)
                .cloned()
                .collect(),
        }
    }

    /// Start the background refresh loops. Dropping the returned pollers
    /// (or the hub) stops them; they never outlive the session.
    pub fn start_pollers(self: &Arc<Self>) -> Vec<Poller> {
        let round_hub = self.clone();
        let round_poller = Poller::spawn(
            "round-and-claims",
            Duration::from_secs(config::ROUND_POLL_SECS),
            move || {
                let hub = round_hub.clone();
                async move {
                    let basics = hub.reader.refresh_basics().await;
                    hub.reader.refresh_round(basics.current_epoch).await;
                    hub.refresh_claims().await;
                }
            },
        );

        let balance_hub = self.clone();
        let balance_poller = Poller::spawn(
            "balances",
            Duration::from_secs(config::BALANCE_POLL_SECS),
            move || {
                let hub = balance_hub.clone();
                async move {
                    hub.reader
                        .refresh_token_state(
                            hub.session.address,
                            config::BET_CONTRACT_ADDRESS,
                        )
                        .await;
                }
            },
        );

        vec![round_poller, balance_poller]
    }

    fn set_status(&self, status: String) {
        *self.status.lock().expect("status poisoned") = status;
    }

    fn report_failure(&self, action: &str, e: SequenceError) {
        let status = match &e {
            SequenceError::Rejected(reason) => reason.message().to_string(),
            SequenceError::TransactionReverted(_) => format!(
                "{action} failed: execution reverted, likely window closed or minimum not met"
            ),
            other => format!("{action} failed: {other}"),
        };
        self.set_status(status);
        self.push_error(format!("{action} error: {e}"));
    }

    fn push_error(&self, item: String) {
        error!("{item}");
        let mut errors = self.errors.lock().expect("errors poisoned");
        errors.push(item);
        if errors.len() > ERROR_RING_CAP {
            let drain = errors.len() - ERROR_RING_CAP;
            errors.drain(0..drain);
        }
    }
}

pub fn short_address(addr: Address) -> String {
    let full = addr.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
