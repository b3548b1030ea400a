use thiserror::Error;

/// Failures at the wallet/RPC boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("no wallet available: {0}")]
    NoProvider(String),
    #[error("wallet request rejected by the user")]
    UserRejected,
    #[error("connected to chain {actual}, expected {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("read failed: {0}")]
    Read(String),
    #[error("no liquidity route: {0}")]
    QuoteUnavailable(String),
}

/// Local precondition rejections, ordered by report priority: connectivity
/// first, then input validity, then timing, then economics. The first
/// applicable reason wins; callers never see more than one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RejectReason {
    WalletNotConnected,
    NoSideSelected,
    InvalidAmount,
    BelowMinimum,
    RoundNotStarted,
    RoundLocked,
    AlreadyBetThisEpoch,
    InsufficientBalance,
    PoolExhausted,
}

impl RejectReason {
    /// Short user-facing status line, matching the dApp's wording.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::WalletNotConnected => "Connect your wallet first.",
            RejectReason::NoSideSelected => "Choose UP or DOWN before placing a bet.",
            RejectReason::InvalidAmount => "Enter a valid $DONE amount.",
            RejectReason::BelowMinimum => "Bet is below the contract minimum.",
            RejectReason::RoundNotStarted => "Round not started yet.",
            RejectReason::RoundLocked => "Betting closed for this round. Try next round.",
            RejectReason::AlreadyBetThisEpoch => "You already placed a bet in this epoch.",
            RejectReason::InsufficientBalance => "Your $DONE balance is lower than the bet amount.",
            RejectReason::PoolExhausted => "Reward pool is empty.",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Terminal outcome of a sequencer run that did not settle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SequenceError {
    #[error("{0}")]
    Rejected(RejectReason),
    #[error("allowance still insufficient after approval confirmed")]
    AllowanceStillInsufficient,
    #[error("transaction reverted: {0}")]
    TransactionReverted(String),
    #[error("another {0} is already in flight")]
    AlreadyInFlight(&'static str),
    #[error("nothing to claim")]
    NothingToClaim,
    #[error("Neynar score below the eligibility threshold")]
    ScoreIneligible,
    #[error(transparent)]
    Chain(#[from] ChainError),
}
