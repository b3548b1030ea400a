//! In-memory chain double for unit and integration tests: programmable
//! state, call counters for sequencing assertions, injectable reverts and
//! read failures.

use crate::{
    client::{
        ChainClient,
        RoundResult,
        RoundSnapshot,
        Side,
        TxOutcome,
        UserBetRecord,
    },
    error::ChainError,
    session::WalletSession,
};
use alloy::primitives::{
    Address,
    B256,
    I256,
    U256,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Mutex,
};

/// A round that is open for betting at wall-clock second `now`.
pub fn open_round(epoch: u64, now: u64) -> RoundSnapshot {
    RoundSnapshot {
        epoch,
        start_time: now.saturating_sub(30),
        lock_time: now + 270,
        close_time: now + 570,
        lock_price: I256::ZERO,
        close_price: I256::ZERO,
        total_up: U256::ZERO,
        total_down: U256::ZERO,
        result: RoundResult::Undecided,
        locked: false,
        closed: false,
        fee_taken: false,
    }
}

/// A settled round with the given result and side totals.
pub fn closed_round(
    epoch: u64,
    result: RoundResult,
    total_up: u64,
    total_down: u64,
) -> RoundSnapshot {
    RoundSnapshot {
        epoch,
        start_time: 100,
        lock_time: 400,
        close_time: 700,
        lock_price: I256::try_from(50_000i64).unwrap_or(I256::ZERO),
        close_price: I256::try_from(50_100i64).unwrap_or(I256::ZERO),
        total_up: U256::from(total_up),
        total_down: U256::from(total_down),
        result,
        locked: true,
        closed: true,
        fee_taken: false,
    }
}

/// A connected session for an all-zero address on the test chain.
pub fn test_session() -> WalletSession {
    WalletSession {
        address: Address::ZERO,
        chain_id: 8453,
        is_connected: true,
    }
}

/// Arguments of the most recent swap write, for guard assertions.
#[derive(Clone, Debug, PartialEq)]
pub struct SwapArgs {
    pub amount_in: U256,
    pub min_out: U256,
    pub fee_tier: Option<u32>,
    pub deadline: u64,
}

#[derive(Clone, Debug, Default)]
pub struct MockCalls {
    pub approve: u32,
    pub place_bet: u32,
    pub claim: u32,
    pub claim_batch: u32,
    pub swap: u32,
    pub airdrop_claim: u32,
}

#[derive(Default)]
struct MockState {
    decimals: u8,
    balance: U256,
    allowance: U256,
    min_bet: U256,
    fee_bps: u64,
    current_epoch: u64,
    pool_balance: U256,
    rounds: HashMap<u64, RoundSnapshot>,
    bets: HashMap<u64, UserBetRecord>,
    quotes: HashMap<Option<u32>, U256>,
    /// When set, approvals confirm but never move the allowance.
    approve_is_noop: bool,
    last_swap: Option<SwapArgs>,
    /// Revert reason consumed by the next write.
    revert_next_write: Option<String>,
    fail_reads: bool,
    calls: MockCalls,
}

pub struct MockChain {
    state: Mutex<MockState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    /// A chain with sane defaults: 18 decimals, an open current round, an
    /// empty wallet.
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let mut rounds = HashMap::new();
        rounds.insert(1, open_round(1, now));
        Self {
            state: Mutex::new(MockState {
                decimals: 18,
                min_bet: U256::from(1u64),
                fee_bps: 500,
                current_epoch: 1,
                pool_balance: U256::from(1_000_000u64),
                rounds,
                ..MockState::default()
            }),
        }
    }

    pub fn set_balance(&self, balance: U256) {
        self.lock().balance = balance;
    }

    pub fn set_allowance(&self, allowance: U256) {
        self.lock().allowance = allowance;
    }

    pub fn set_min_bet(&self, min_bet: U256) {
        self.lock().min_bet = min_bet;
    }

    pub fn set_fee_bps(&self, fee_bps: u64) {
        self.lock().fee_bps = fee_bps;
    }

    pub fn set_current_epoch(&self, epoch: u64) {
        self.lock().current_epoch = epoch;
    }

    pub fn set_pool_balance(&self, pool: U256) {
        self.lock().pool_balance = pool;
    }

    pub fn insert_round(&self, round: RoundSnapshot) {
        self.lock().rounds.insert(round.epoch, round);
    }

    pub fn insert_bet(&self, bet: UserBetRecord) {
        self.lock().bets.insert(bet.epoch, bet);
    }

    pub fn set_quote(&self, fee_tier: Option<u32>, amount_out: U256) {
        self.lock().quotes.insert(fee_tier, amount_out);
    }

    pub fn set_approve_is_noop(&self, noop: bool) {
        self.lock().approve_is_noop = noop;
    }

    pub fn set_revert_next_write(&self, reason: &str) {
        self.lock().revert_next_write = Some(reason.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn calls(&self) -> MockCalls {
        self.lock().calls.clone()
    }

    pub fn bet_at(&self, epoch: u64) -> Option<UserBetRecord> {
        self.lock().bets.get(&epoch).cloned()
    }

    pub fn last_swap(&self) -> Option<SwapArgs> {
        self.lock().last_swap.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    fn read<T>(&self, value: T) -> Result<T, ChainError> {
        if self.lock().fail_reads {
            Err(ChainError::Read("injected read failure".to_string()))
        } else {
            Ok(value)
        }
    }

    /// Confirmation outcome for the next write, honoring an injected revert.
    fn write_outcome(&self) -> TxOutcome {
        let reason = self.lock().revert_next_write.take();
        TxOutcome {
            success: reason.is_none(),
            tx_hash: B256::with_last_byte(self.total_writes()),
            revert_reason: reason,
        }
    }

    fn total_writes(&self) -> u8 {
        let calls = self.calls();
        (calls.approve
            + calls.place_bet
            + calls.claim
            + calls.claim_batch
            + calls.swap
            + calls.airdrop_claim) as u8
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn token_decimals(&self) -> Result<u8, ChainError> {
        let decimals = self.lock().decimals;
        self.read(decimals)
    }

    async fn token_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        let balance = self.lock().balance;
        self.read(balance)
    }

    async fn token_allowance(
        &self,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, ChainError> {
        let allowance = self.lock().allowance;
        self.read(allowance)
    }

    async fn approve(
        &self,
        _spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        self.lock().calls.approve += 1;
        let outcome = self.write_outcome();
        if outcome.success {
            let mut state = self.lock();
            if !state.approve_is_noop {
                state.allowance = amount;
            }
        }
        Ok(outcome)
    }

    async fn min_bet_amount(&self) -> Result<U256, ChainError> {
        let min_bet = self.lock().min_bet;
        self.read(min_bet)
    }

    async fn fee_bps(&self) -> Result<u64, ChainError> {
        let fee_bps = self.lock().fee_bps;
        self.read(fee_bps)
    }

    async fn current_epoch(&self) -> Result<u64, ChainError> {
        let epoch = self.lock().current_epoch;
        self.read(epoch)
    }

    async fn pool_balance(&self) -> Result<U256, ChainError> {
        let pool = self.lock().pool_balance;
        self.read(pool)
    }

    async fn round(&self, epoch: u64) -> Result<RoundSnapshot, ChainError> {
        let round = self.lock().rounds.get(&epoch).cloned();
        self.read(())?;
        round.ok_or_else(|| ChainError::Read(format!("no round {epoch}")))
    }

    async fn user_bet(
        &self,
        epoch: u64,
        _user: Address,
    ) -> Result<UserBetRecord, ChainError> {
        let bet = self.lock().bets.get(&epoch).cloned();
        self.read(())?;
        Ok(bet.unwrap_or(UserBetRecord {
            epoch,
            amount: U256::ZERO,
            position: Side::Down,
            claimed: false,
        }))
    }

    async fn place_bet(
        &self,
        side: Side,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        self.lock().calls.place_bet += 1;
        let outcome = self.write_outcome();
        if outcome.success {
            let mut state = self.lock();
            let epoch = state.current_epoch;
            state.balance = state.balance.saturating_sub(amount);
            state.bets.insert(
                epoch,
                UserBetRecord {
                    epoch,
                    amount,
                    position: side,
                    claimed: false,
                },
            );
        }
        Ok(outcome)
    }

    async fn claim(&self, epoch: u64) -> Result<TxOutcome, ChainError> {
        self.lock().calls.claim += 1;
        let outcome = self.write_outcome();
        if outcome.success {
            if let Some(bet) = self.lock().bets.get_mut(&epoch) {
                bet.claimed = true;
            }
        }
        Ok(outcome)
    }

    async fn claim_batch(&self, epochs: &[u64]) -> Result<TxOutcome, ChainError> {
        self.lock().calls.claim_batch += 1;
        let outcome = self.write_outcome();
        if outcome.success {
            let mut state = self.lock();
            for epoch in epochs {
                if let Some(bet) = state.bets.get_mut(epoch) {
                    bet.claimed = true;
                }
            }
        }
        Ok(outcome)
    }

    async fn quote(
        &self,
        _amount_in: U256,
        fee_tier: Option<u32>,
    ) -> Result<U256, ChainError> {
        self.lock()
            .quotes
            .get(&fee_tier)
            .copied()
            .ok_or_else(|| ChainError::QuoteUnavailable(format!("tier {fee_tier:?}")))
    }

    async fn swap(
        &self,
        amount_in: U256,
        min_out: U256,
        fee_tier: Option<u32>,
        deadline: u64,
    ) -> Result<TxOutcome, ChainError> {
        {
            let mut state = self.lock();
            state.calls.swap += 1;
            state.last_swap = Some(SwapArgs {
                amount_in,
                min_out,
                fee_tier,
                deadline,
            });
        }
        Ok(self.write_outcome())
    }

    async fn claim_airdrop(&self) -> Result<TxOutcome, ChainError> {
        self.lock().calls.airdrop_claim += 1;
        Ok(self.write_outcome())
    }
}
