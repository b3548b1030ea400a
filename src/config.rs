//! Compiled-in deployment constants and runtime knobs.
//!
//! Contract addresses and the chain id are fixed at build time; changing a
//! deployment target means shipping a new build.

use alloy::primitives::{Address, address};

pub const CHAIN_ID: u64 = 8453; // Base mainnet
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

pub const BET_CONTRACT_ADDRESS: Address =
    address!("0xA24f111Ac03D9b03fFd9E04bD7A18e65f6bfddd7");
pub const DONE_TOKEN_ADDRESS: Address =
    address!("0x3Da0Da9414D02c1E4cc4526a5a24F5eeEbfCEAd4");
pub const WETH_ADDRESS: Address =
    address!("0x4200000000000000000000000000000000000006");
pub const AIRDROP_ADDRESS: Address =
    address!("0x1df8DcCAD57939BaB8Ae0f3406Eaa868887E03bb");
pub const V2_ROUTER_ADDRESS: Address =
    address!("0x4752ba5DBc23f44D87826276BF6Fd6b1C372aD24");
pub const V3_ROUTER_ADDRESS: Address =
    address!("0x2626664c2603336E57B271c5C0b26F421741e481");
pub const V3_QUOTER_ADDRESS: Address =
    address!("0x3d4e44Eb1374240CE5F1B871ab261CD16335B76a");

/// Fee tiers probed when quoting through the V3 quoter, in hundredths of a bip.
pub const QUOTE_FEE_TIERS: [u32; 3] = [500, 3_000, 10_000];

/// How many past epochs the claim scanner walks, current epoch inclusive.
pub const CLAIM_WINDOW: u64 = 10;

/// Advisory anti-bot threshold for the off-chain Neynar score.
pub const MIN_SCORE: f64 = 0.35;

pub const ROUND_POLL_SECS: u64 = 10;
pub const BALANCE_POLL_SECS: u64 = 20;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RouterVersion {
    V2,
    V3,
}

/// Whether approvals ask for the exact bet amount or an unlimited allowance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApprovalPolicy {
    Exact,
    Unlimited,
}

/// Feature set of the deployed front end. The near-duplicate script variants
/// differ only in these flags, so one client covers all of them.
#[derive(Copy, Clone, Debug)]
pub struct Capabilities {
    pub supports_claim_batch: bool,
    pub swap_router_version: RouterVersion,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_claim_batch: true,
            swap_router_version: RouterVersion::V3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HubConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub capabilities: Capabilities,
    pub approval_policy: ApprovalPolicy,
    pub claim_window: u64,
    /// Slippage tolerance applied to swap quotes, in basis points.
    pub swap_slippage_bps: u64,
    /// Seconds from quote acceptance until the swap deadline.
    pub swap_deadline_secs: u64,
    /// Base url of the off-chain scoring backend.
    pub score_base_url: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: CHAIN_ID,
            capabilities: Capabilities::default(),
            approval_policy: ApprovalPolicy::Exact,
            claim_window: CLAIM_WINDOW,
            swap_slippage_bps: 100,
            swap_deadline_secs: 600,
            score_base_url: String::new(),
        }
    }
}
