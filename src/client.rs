//! Chain boundary: the `ChainClient` trait plus the alloy-backed
//! implementation against the fixed DONE Hub contracts.
//!
//! The trait keeps the rest of the core testable against an in-memory double
//! (`test_helpers::MockChain`); the EVM implementation is a thin wrapper that
//! never retries a write on its own.

use crate::{
    config::{
        self,
        HubConfig,
    },
    contracts::{
        IAirdrop,
        IDonePrediction,
        IERC20,
        IQuoter,
        ISwapRouter,
        IV2Router,
    },
    error::ChainError,
    session::WalletSession,
};
use alloy::{
    primitives::{
        Address,
        B256,
        I256,
        U256,
        aliases::{
            U24,
            U160,
        },
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;

/// Bet direction. Wire encoding matches the contract: 0 = Down, 1 = Up.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Down,
    Up,
}

impl Side {
    pub fn as_u8(self) -> u8 {
        match self {
            Side::Down => 0,
            Side::Up => 1,
        }
    }

    pub fn from_u8(v: u8) -> Side {
        if v == 1 { Side::Up } else { Side::Down }
    }
}

/// Round settlement outcome. Wire encoding: 0 = Undecided, 1 = Up, 2 = Down,
/// 3 = Draw.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoundResult {
    Undecided,
    Up,
    Down,
    Draw,
}

impl RoundResult {
    pub fn from_u8(v: u8) -> RoundResult {
        match v {
            1 => RoundResult::Up,
            2 => RoundResult::Down,
            3 => RoundResult::Draw,
            _ => RoundResult::Undecided,
        }
    }
}

/// One round's struct as read from the prediction contract. Never mutated
/// locally; every poll fetches it fresh.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundSnapshot {
    pub epoch: u64,
    pub start_time: u64,
    pub lock_time: u64,
    pub close_time: u64,
    pub lock_price: I256,
    pub close_price: I256,
    pub total_up: U256,
    pub total_down: U256,
    pub result: RoundResult,
    pub locked: bool,
    pub closed: bool,
    pub fee_taken: bool,
}

/// The user's bet for one epoch. A zero amount means no bet was placed.
#[derive(Clone, Debug, PartialEq)]
pub struct UserBetRecord {
    pub epoch: u64,
    pub amount: U256,
    pub position: Side,
    pub claimed: bool,
}

/// Result of an awaited write: one confirmation, success or revert.
#[derive(Clone, Debug, PartialEq)]
pub struct TxOutcome {
    pub success: bool,
    pub tx_hash: B256,
    pub revert_reason: Option<String>,
}

/// On-chain access used by the reader, sequencer and claim scanner.
///
/// Writes resolve only after one confirmation and are never retried here;
/// a repeat, if any, is an explicit user-initiated action.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    // DONE token
    async fn token_decimals(&self) -> Result<u8, ChainError>;
    async fn token_balance(&self, owner: Address) -> Result<U256, ChainError>;
    async fn token_allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;
    async fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ChainError>;

    // prediction contract
    async fn min_bet_amount(&self) -> Result<U256, ChainError>;
    async fn fee_bps(&self) -> Result<u64, ChainError>;
    async fn current_epoch(&self) -> Result<u64, ChainError>;
    async fn pool_balance(&self) -> Result<U256, ChainError>;
    async fn round(&self, epoch: u64) -> Result<RoundSnapshot, ChainError>;
    async fn user_bet(
        &self,
        epoch: u64,
        user: Address,
    ) -> Result<UserBetRecord, ChainError>;
    async fn place_bet(&self, side: Side, amount: U256)
    -> Result<TxOutcome, ChainError>;
    async fn claim(&self, epoch: u64) -> Result<TxOutcome, ChainError>;
    async fn claim_batch(&self, epochs: &[u64]) -> Result<TxOutcome, ChainError>;

    // DEX router/quoter; `fee_tier` is Some for V3 quoting, None for V2
    async fn quote(
        &self,
        amount_in: U256,
        fee_tier: Option<u32>,
    ) -> Result<U256, ChainError>;
    async fn swap(
        &self,
        amount_in: U256,
        min_out: U256,
        fee_tier: Option<u32>,
        deadline: u64,
    ) -> Result<TxOutcome, ChainError>;

    // airdrop contract
    async fn claim_airdrop(&self) -> Result<TxOutcome, ChainError>;
}

type Erc20 = IERC20::IERC20Instance<DynProvider>;
type Prediction = IDonePrediction::IDonePredictionInstance<DynProvider>;
type Quoter = IQuoter::IQuoterInstance<DynProvider>;
type V3Router = ISwapRouter::ISwapRouterInstance<DynProvider>;
type V2Router = IV2Router::IV2RouterInstance<DynProvider>;
type Airdrop = IAirdrop::IAirdropInstance<DynProvider>;

/// Live client over the deployed contracts.
pub struct EvmChainClient {
    owner: Address,
    token: Erc20,
    prediction: Prediction,
    quoter: Quoter,
    v3_router: V3Router,
    v2_router: V2Router,
    airdrop: Airdrop,
}

impl EvmChainClient {
    /// Connect the wallet to the RPC endpoint and verify the chain id. There
    /// is no remote network to switch; a mismatch is a hard error.
    pub async fn connect(
        cfg: &HubConfig,
        signer: PrivateKeySigner,
    ) -> Result<(Self, WalletSession), ChainError> {
        let owner = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect(&cfg.rpc_url)
            .await
            .map_err(|e| ChainError::NoProvider(e.to_string()))?
            .erased();

        let actual = provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if actual != cfg.chain_id {
            return Err(ChainError::NetworkMismatch {
                expected: cfg.chain_id,
                actual,
            });
        }

        let client = Self {
            owner,
            token: IERC20::new(config::DONE_TOKEN_ADDRESS, provider.clone()),
            prediction: IDonePrediction::new(
                config::BET_CONTRACT_ADDRESS,
                provider.clone(),
            ),
            quoter: IQuoter::new(config::V3_QUOTER_ADDRESS, provider.clone()),
            v3_router: ISwapRouter::new(config::V3_ROUTER_ADDRESS, provider.clone()),
            v2_router: IV2Router::new(config::V2_ROUTER_ADDRESS, provider.clone()),
            airdrop: IAirdrop::new(config::AIRDROP_ADDRESS, provider),
        };
        let session = WalletSession {
            address: owner,
            chain_id: actual,
            is_connected: true,
        };
        Ok((client, session))
    }
}

fn read_err(e: impl std::fmt::Display) -> ChainError {
    ChainError::Read(e.to_string())
}

fn rpc_err(e: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(e.to_string())
}

fn outcome(receipt: &alloy::rpc::types::TransactionReceipt) -> TxOutcome {
    let success = receipt.status();
    TxOutcome {
        success,
        tx_hash: receipt.transaction_hash,
        // Receipts carry no reason string; anything richer would need a
        // re-simulation of the failed call.
        revert_reason: (!success).then(|| "execution reverted".to_string()),
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn token_decimals(&self) -> Result<u8, ChainError> {
        self.token.decimals().call().await.map_err(read_err)
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.token.balanceOf(owner).call().await.map_err(read_err)
    }

    async fn token_allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.token
            .allowance(owner, spender)
            .call()
            .await
            .map_err(read_err)
    }

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        let receipt = self
            .token
            .approve(spender, amount)
            .send()
            .await
            .map_err(rpc_err)?
            .get_receipt()
            .await
            .map_err(rpc_err)?;
        Ok(outcome(&receipt))
    }

    async fn min_bet_amount(&self) -> Result<U256, ChainError> {
        self.prediction
            .minBetAmount()
            .call()
            .await
            .map_err(read_err)
    }

    async fn fee_bps(&self) -> Result<u64, ChainError> {
        let bps = self.prediction.feeBps().call().await.map_err(read_err)?;
        Ok(bps.saturating_to::<u64>())
    }

    async fn current_epoch(&self) -> Result<u64, ChainError> {
        let epoch = self
            .prediction
            .currentEpoch()
            .call()
            .await
            .map_err(read_err)?;
        Ok(epoch.saturating_to::<u64>())
    }

    async fn pool_balance(&self) -> Result<U256, ChainError> {
        self.prediction
            .poolBalance()
            .call()
            .await
            .map_err(read_err)
    }

    async fn round(&self, epoch: u64) -> Result<RoundSnapshot, ChainError> {
        let r = self
            .prediction
            .rounds(U256::from(epoch))
            .call()
            .await
            .map_err(read_err)?;
        Ok(RoundSnapshot {
            epoch: r.epoch.saturating_to::<u64>(),
            start_time: r.startTime,
            lock_time: r.lockTime,
            close_time: r.closeTime,
            lock_price: r.lockPrice,
            close_price: r.closePrice,
            total_up: r.totalUp,
            total_down: r.totalDown,
            result: RoundResult::from_u8(r.result),
            locked: r.locked,
            closed: r.closed,
            fee_taken: r.feeTaken,
        })
    }

    async fn user_bet(
        &self,
        epoch: u64,
        user: Address,
    ) -> Result<UserBetRecord, ChainError> {
        let b = self
            .prediction
            .getUserBet(U256::from(epoch), user)
            .call()
            .await
            .map_err(read_err)?;
        Ok(UserBetRecord {
            epoch,
            amount: b.amount,
            position: Side::from_u8(b.position),
            claimed: b.claimed,
        })
    }

    async fn place_bet(
        &self,
        side: Side,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        let receipt = self
            .prediction
            .placeBet(side.as_u8(), amount)
            .send()
            .await
            .map_err(rpc_err)?
            .get_receipt()
            .await
            .map_err(rpc_err)?;
        Ok(outcome(&receipt))
    }

    async fn claim(&self, epoch: u64) -> Result<TxOutcome, ChainError> {
        let receipt = self
            .prediction
            .claim(U256::from(epoch))
            .send()
            .await
            .map_err(rpc_err)?
            .get_receipt()
            .await
            .map_err(rpc_err)?;
        Ok(outcome(&receipt))
    }

    async fn claim_batch(&self, epochs: &[u64]) -> Result<TxOutcome, ChainError> {
        let epochs: Vec<U256> = epochs.iter().copied().map(U256::from).collect();
        let receipt = self
            .prediction
            .claimBatch(epochs)
            .send()
            .await
            .map_err(rpc_err)?
            .get_receipt()
            .await
            .map_err(rpc_err)?;
        Ok(outcome(&receipt))
    }

    async fn quote(
        &self,
        amount_in: U256,
        fee_tier: Option<u32>,
    ) -> Result<U256, ChainError> {
        match fee_tier {
            Some(fee) => self
                .quoter
                .quoteExactInputSingle(
                    config::DONE_TOKEN_ADDRESS,
                    config::WETH_ADDRESS,
                    U24::from(fee),
                    amount_in,
                    U160::ZERO,
                )
                .call()
                .await
                .map_err(|e| ChainError::QuoteUnavailable(e.to_string())),
            None => {
                let amounts = self
                    .v2_router
                    .getAmountsOut(
                        amount_in,
                        vec![config::DONE_TOKEN_ADDRESS, config::WETH_ADDRESS],
                    )
                    .call()
                    .await
                    .map_err(|e| ChainError::QuoteUnavailable(e.to_string()))?;
                amounts.last().copied().ok_or_else(|| {
                    ChainError::QuoteUnavailable("empty amounts path".to_string())
                })
            }
        }
    }

    async fn swap(
        &self,
        amount_in: U256,
        min_out: U256,
        fee_tier: Option<u32>,
        deadline: u64,
    ) -> Result<TxOutcome, ChainError> {
        let receipt = match fee_tier {
            Some(fee) => {
                let params = ISwapRouter::ExactInputSingleParams {
                    tokenIn: config::DONE_TOKEN_ADDRESS,
                    tokenOut: config::WETH_ADDRESS,
                    fee: U24::from(fee),
                    recipient: self.owner,
                    deadline: U256::from(deadline),
                    amountIn: amount_in,
                    amountOutMinimum: min_out,
                    sqrtPriceLimitX96: U160::ZERO,
                };
                self.v3_router
                    .exactInputSingle(params)
                    .send()
                    .await
                    .map_err(rpc_err)?
                    .get_receipt()
                    .await
                    .map_err(rpc_err)?
            }
            None => self
                .v2_router
                .swapExactTokensForTokens(
                    amount_in,
                    min_out,
                    vec![config::DONE_TOKEN_ADDRESS, config::WETH_ADDRESS],
                    self.owner,
                    U256::from(deadline),
                )
                .send()
                .await
                .map_err(rpc_err)?
                .get_receipt()
                .await
                .map_err(rpc_err)?,
        };
        Ok(outcome(&receipt))
    }

    async fn claim_airdrop(&self) -> Result<TxOutcome, ChainError> {
        let receipt = self
            .airdrop
            .claim()
            .send()
            .await
            .map_err(rpc_err)?
            .get_receipt()
            .await
            .map_err(rpc_err)?;
        Ok(outcome(&receipt))
    }
}
