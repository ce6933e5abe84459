//! Liquid-staking settlement engine (sDOT).
//!
//! Standalone accounting core for a pooled liquid-staking protocol: a
//! share token (sDOT) minted against staked principal (DOT), a pooled
//! bonding/unbonding queue driven by an operator under timelock control,
//! and pro-rata reward accrual across multiple reward tokens. Token
//! movement and block time come from an external [`ledger::Ledger`]
//! adapter — this crate holds the state machine, not the chain plumbing.
//!
//! Architecture:
//! - Shares are minted/burned proportional to the live
//!   principal-per-share ratio; rewards settle against a per-token
//!   cumulative-reward-per-share accumulator before any balance change
//! - Staked principal collects in a pending bond the operator withdraws
//!   to bond externally; unstakes are paid instantly out of the pending
//!   bond and any shortfall queues for the next unbonding round
//! - Privileged calls (withdraw pending bond, deposit unbonded, pause,
//!   registry/ownership changes) go through a timelocked admin gate that
//!   owns the pool
//!
//! Operations:
//!   stake                 Deposit principal, pay the flat fee, mint sDOT
//!   unstake               Burn sDOT; instant payout up to the pending
//!                         bond, the shortfall queued for unbonding
//!   transfer_shares       Move sDOT between holders, settling rewards
//!                         for both sides first
//!   claim_dot             Withdraw claimable unbonded principal
//!   harvest               Pay out settled rewards for one token
//!   inject_reward         Distribute a reward amount over all shares
//!   withdraw_pending_bond Owner-gated: pending bond → operator
//!   deposit_unbonded      Owner-gated: operator returns unbonded funds
//!   pause / unpause       Owner-gated pause of stake + bond withdrawal

pub mod error;
pub mod gate;
pub mod ledger;
pub mod math;
pub mod processor;
pub mod state;

pub use error::StakeError;
pub use gate::{GateError, GateOp, OperationId, TimelockGate, NO_PREDECESSOR};
pub use ledger::{Ledger, LedgerError, MemoryLedger};
pub use processor::{LiquidStaking, Unstaked};
pub use state::{Address, HolderAccount, Pool, PoolConfig, RewardLedger, TokenId, UserInfo};
