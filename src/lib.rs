pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod poller;
pub mod reader;
pub mod score;
pub mod sequencer;
pub mod session;
pub mod test_helpers;
pub mod units;
pub mod validate;

pub mod contracts {
    use alloy::sol;

    sol! {
        #[sol(rpc)]
        interface IERC20 {
            function decimals() external view returns (uint8);
            function balanceOf(address account) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 value) external returns (bool);
        }

        #[sol(rpc)]
        interface IDonePrediction {
            function feeBps() external view returns (uint256);
            function minBetAmount() external view returns (uint256);
            function currentEpoch() external view returns (uint256);
            function poolBalance() external view returns (uint256);
            function rounds(uint256 epoch) external view returns (
                uint256 epoch,
                uint64 startTime,
                uint64 lockTime,
                uint64 closeTime,
                int256 lockPrice,
                int256 closePrice,
                uint256 totalUp,
                uint256 totalDown,
                uint8 result,
                bool locked,
                bool closed,
                bool feeTaken
            );
            function getUserBet(uint256 epoch, address user) external view returns (
                uint256 amount,
                uint8 position,
                bool claimed
            );
            function placeBet(uint8 side, uint256 amount) external;
            function claim(uint256 epoch) external;
            function claimBatch(uint256[] epochs) external;
        }

        #[sol(rpc)]
        interface IQuoter {
            function quoteExactInputSingle(
                address tokenIn,
                address tokenOut,
                uint24 fee,
                uint256 amountIn,
                uint160 sqrtPriceLimitX96
            ) external returns (uint256 amountOut);
        }

        #[sol(rpc)]
        interface ISwapRouter {
            struct ExactInputSingleParams {
                address tokenIn;
                address tokenOut;
                uint24 fee;
                address recipient;
                uint256 deadline;
                uint256 amountIn;
                uint256 amountOutMinimum;
                uint160 sqrtPriceLimitX96;
            }

            function exactInputSingle(ExactInputSingleParams params) external payable returns (uint256 amountOut);
        }

        #[sol(rpc)]
        interface IV2Router {
            function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts);
            function swapExactTokensForTokens(
                uint256 amountIn,
                uint256 amountOutMin,
                address[] path,
                address to,
                uint256 deadline
            ) external returns (uint256[] amounts);
        }

        #[sol(rpc)]
        interface IAirdrop {
            function claim() external;
        }
    }
}

pub use client::{ChainClient, RoundResult, RoundSnapshot, Side, TxOutcome, UserBetRecord};
pub use error::{ChainError, RejectReason, SequenceError};
pub use hub::{Hub, HubSnapshot};
pub use session::WalletSession;
