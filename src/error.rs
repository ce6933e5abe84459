use thiserror::Error;

use crate::ledger::LedgerError;

/// Value-level failure signals for every settlement operation.
///
/// All validation happens before any ledger transfer or state mutation,
/// so a returned error means the pool and holder state are unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StakeError {
    /// Stake or withdraw-pending-bond attempted while the pool is paused
    #[error("contract is paused")]
    ContractPaused,
    /// Stake amount must exceed twice the flat transaction fee
    #[error("stake amount must be more than the transaction fee twice")]
    StakeAmountMustBeMoreThanTransactionFeeTwice,
    /// Unstaked principal must exceed the flat transaction fee
    #[error("unstake amount must be more than the transaction fee")]
    UnstakeAmountMustBeMoreThanTransactionFee,
    /// Unstake request exceeds the caller's sDOT balance
    #[error("not enough sDOT balance")]
    NotEnoughSDotBalance,
    /// Burn request exceeds the holder's share balance
    #[error("insufficient share balance")]
    InsufficientShareBalance,
    /// Nothing in the holder's claimable unbonded balance
    #[error("no claimable unbonded DOT")]
    NoClaimableUnbondedDot,
    /// Harvest would pay out zero
    #[error("nothing to harvest")]
    NothingToHarvest,
    /// Token is not in the reward-token registry
    #[error("unregistered reward token")]
    UnregisteredRewardToken,
    /// Reward injected while no shares are outstanding
    #[error("no stakers yet")]
    NoStakersYet,
    /// Pending bond withdrawal with nothing staked
    #[error("no user staking")]
    NoUserStaking,
    /// Pending bond withdrawal by someone other than the owner
    #[error("not authorized to withdraw")]
    NotAuthorizedToWithdraw,
    /// Owner-gated operation called by someone else
    #[error("unauthorized")]
    Unauthorized,
    /// Zero amount
    #[error("zero amount")]
    ZeroAmount,
    /// Deposit-unbonded amount exceeds the holder's pending unbond amount
    #[error("amount exceeds pending unbond amount")]
    ExceedsPendingUnbondAmount,
    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,
    /// Underlying ledger transfer failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
