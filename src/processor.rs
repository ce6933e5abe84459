//! Settlement orchestrator.
//!
//! Ties share accounting, reward accrual, and the bonding/unbonding queue
//! together over a [`Ledger`] adapter. Every operation validates fully
//! before moving tokens or mutating pool state; the surrounding ledger
//! serializes operations, so each call applies atomically.

use tracing::{debug, info};

use crate::error::StakeError;
use crate::gate::GateOp;
use crate::ledger::{Ledger, LedgerError};
use crate::math;
use crate::state::{Address, Pool, PoolConfig, RewardLedger, TokenId, UserInfo};

/// How an unstake settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unstaked {
    /// Paid in full from the not-yet-bonded pool
    Instant { principal: u64 },
    /// The covered portion paid from the pending bond; the shortfall
    /// queued into the holder's pending unbond amount for a later
    /// operator round
    Queued { paid: u64, queued: u64 },
}

impl Unstaked {
    pub fn principal(&self) -> u64 {
        match *self {
            Unstaked::Instant { principal } => principal,
            Unstaked::Queued { paid, queued } => paid + queued,
        }
    }
}

/// The liquid-staking pool plus the ledger it settles against.
pub struct LiquidStaking<L: Ledger> {
    pool: Pool,
    ledger: L,
}

impl<L: Ledger> LiquidStaking<L> {
    pub fn new(address: Address, owner: Address, config: PoolConfig, ledger: L) -> Self {
        LiquidStaking {
            pool: Pool::new(address, owner, config),
            ledger,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    // ═══════════════════════════════════════════════════════════════
    // User operations
    // ═══════════════════════════════════════════════════════════════

    /// Stake principal. Deducts the flat fee to the fee collector, adds the
    /// remainder to the pending bond, and mints sDOT shares pro-rata.
    /// Returns the shares minted.
    pub fn stake(&mut self, caller: Address, amount: u64) -> Result<u64, StakeError> {
        if self.pool.paused {
            return Err(StakeError::ContractPaused);
        }
        let fee = self.pool.flat_fee;
        let fee_twice = fee.checked_mul(2).ok_or(StakeError::Overflow)?;
        if amount <= fee_twice {
            return Err(StakeError::StakeAmountMustBeMoreThanTransactionFeeTwice);
        }
        let after_fee = amount - fee; // amount > 2 * fee
        let shares = self
            .pool
            .calc_shares_for_stake(after_fee)
            .ok_or(StakeError::Overflow)?;
        if shares == 0 {
            return Err(StakeError::ZeroAmount);
        }
        // Validate totals and funding before any token moves.
        self.pool
            .total_shares
            .checked_add(shares)
            .ok_or(StakeError::Overflow)?;
        self.pool
            .internal_principal_balance
            .checked_add(after_fee)
            .ok_or(StakeError::Overflow)?;
        self.pool
            .total_pending_bond_amount
            .checked_add(after_fee)
            .ok_or(StakeError::Overflow)?;
        let principal_token = self.pool.principal_token;
        if self.ledger.balance_of(principal_token, caller) < amount {
            return Err(LedgerError::InsufficientBalance.into());
        }

        // Settle every reward token against the pre-mint balance, so the
        // new baseline reflects rewards accrued up to this moment.
        self.settle_all(caller)?;

        let pool_address = self.pool.address;
        self.ledger
            .transfer(principal_token, caller, pool_address, amount)?;
        self.ledger
            .transfer(principal_token, pool_address, self.pool.fee_collector, fee)?;

        let account = self.pool.holder_mut(caller);
        account.share_balance += shares;
        self.pool.total_shares += shares;
        self.pool.internal_principal_balance += after_fee;
        self.pool.total_pending_bond_amount += after_fee;

        info!(holder = %caller, amount, shares, "stake");
        Ok(shares)
    }

    /// Unstake by burning sDOT shares. Whatever the pending bond still
    /// covers (funds the operator has not withdrawn this round) is paid
    /// instantly; the shortfall is queued into the holder's pending unbond
    /// amount for the next unbonding round.
    ///
    /// Allowed while paused.
    pub fn unstake(&mut self, caller: Address, share_amount: u64) -> Result<Unstaked, StakeError> {
        if share_amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let balance = self.balance_of(caller);
        if share_amount > balance {
            return Err(StakeError::NotEnoughSDotBalance);
        }
        let principal = self
            .pool
            .calc_principal_for_unstake(share_amount)
            .ok_or(StakeError::Overflow)?;
        if principal <= self.pool.flat_fee {
            return Err(StakeError::UnstakeAmountMustBeMoreThanTransactionFee);
        }
        let paid = principal.min(self.pool.total_pending_bond_amount);
        let queued = principal - paid;
        let queued_after = self
            .pool
            .holder(caller)
            .map(|a| a.pending_unbond_amount)
            .unwrap_or(0)
            .checked_add(queued)
            .ok_or(StakeError::Overflow)?;

        self.settle_all(caller)?;

        if paid > 0 {
            // No fee on the instant portion; the principal never left the pool.
            let principal_token = self.pool.principal_token;
            let pool_address = self.pool.address;
            self.ledger
                .transfer(principal_token, pool_address, caller, paid)?;
        }

        self.burn(caller, share_amount, principal)?;
        self.pool.total_pending_bond_amount -= paid; // paid is capped at the pending bond
        if queued > 0 {
            self.pool.holder_mut(caller).pending_unbond_amount = queued_after;
        }

        info!(holder = %caller, share_amount, principal, paid, queued, "unstake");
        if queued == 0 {
            Ok(Unstaked::Instant { principal })
        } else {
            Ok(Unstaked::Queued { paid, queued })
        }
    }

    /// Withdraw the holder's claimable unbonded principal.
    ///
    /// Allowed while paused.
    pub fn claim_dot(&mut self, caller: Address) -> Result<u64, StakeError> {
        let amount = self
            .pool
            .holder(caller)
            .map(|a| a.claimable_unbonded_amount)
            .unwrap_or(0);
        if amount == 0 {
            return Err(StakeError::NoClaimableUnbondedDot);
        }
        let principal_token = self.pool.principal_token;
        let pool_address = self.pool.address;
        self.ledger
            .transfer(principal_token, pool_address, caller, amount)?;
        self.pool.holder_mut(caller).claimable_unbonded_amount = 0;

        info!(holder = %caller, amount, "claim_dot");
        Ok(amount)
    }

    /// Settle and pay out the caller's unclaimed reward for one token.
    /// The payout is projected before anything mutates, so a rejected
    /// harvest leaves the holder account untouched.
    pub fn harvest(&mut self, caller: Address, token: TokenId) -> Result<u64, StakeError> {
        let amount = self.get_pending_reward(caller, token)?;
        if amount == 0 {
            return Err(StakeError::NothingToHarvest);
        }
        // Settlement folds the accrued delta into unclaimed, which then
        // equals the projection exactly.
        self.settle(caller, token)?;
        let pool_address = self.pool.address;
        self.ledger.transfer(token, pool_address, caller, amount)?;
        self.pool
            .holder_mut(caller)
            .unclaimed_reward
            .insert(token, 0);

        info!(holder = %caller, token = %token, amount, "harvest");
        Ok(amount)
    }

    /// Transfer sDOT shares between holders. Every reward token is settled
    /// for both parties before the move, so accrued rewards stay with the
    /// sender and the receiver starts at the current accumulator baseline.
    ///
    /// Allowed while paused.
    pub fn transfer_shares(
        &mut self,
        from: Address,
        to: Address,
        share_amount: u64,
    ) -> Result<(), StakeError> {
        if share_amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        if share_amount > self.balance_of(from) {
            return Err(StakeError::NotEnoughSDotBalance);
        }
        let receiver_after = self
            .balance_of(to)
            .checked_add(share_amount)
            .ok_or(StakeError::Overflow)?;

        self.settle_all(from)?;
        if from == to {
            return Ok(());
        }
        self.settle_all(to)?;

        self.pool.holder_mut(from).share_balance -= share_amount; // checked above
        self.pool.holder_mut(to).share_balance = receiver_after;

        info!(from = %from, to = %to, share_amount, "transfer_shares");
        Ok(())
    }

    /// Pull `amount` of a registered reward token from the caller and
    /// distribute it pro-rata over the outstanding shares.
    ///
    /// Rejected while no shares are outstanding — the reward would be
    /// unattributable.
    pub fn inject_reward(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: u64,
    ) -> Result<(), StakeError> {
        if !self.pool.is_reward_token(token) {
            return Err(StakeError::UnregisteredRewardToken);
        }
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        if self.pool.total_shares == 0 {
            return Err(StakeError::NoStakersYet);
        }
        let delta =
            math::acc_per_share_delta(amount, self.pool.total_shares).ok_or(StakeError::Overflow)?;
        let ledger_entry = self
            .pool
            .rewards
            .get(&token)
            .copied()
            .unwrap_or_default();
        let new_acc = ledger_entry
            .acc_reward_per_share
            .checked_add(delta)
            .ok_or(StakeError::Overflow)?;
        let new_total = ledger_entry
            .total_injected
            .checked_add(amount)
            .ok_or(StakeError::Overflow)?;

        let pool_address = self.pool.address;
        self.ledger.transfer(token, caller, pool_address, amount)?;
        self.pool.rewards.insert(
            token,
            RewardLedger {
                acc_reward_per_share: new_acc,
                total_injected: new_total,
            },
        );

        info!(token = %token, amount, "inject_reward");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // Owner-gated operations
    //
    // The owner is the timelock gate once ownership has been transferred
    // to it; every call below then only happens through a scheduled,
    // delayed, single-use gate execution.
    // ═══════════════════════════════════════════════════════════════

    /// Transfer the whole pending bond to the operator for external bonding.
    pub fn withdraw_pending_bond(&mut self, caller: Address) -> Result<u64, StakeError> {
        if self.pool.paused {
            return Err(StakeError::ContractPaused);
        }
        if caller != self.pool.owner {
            return Err(StakeError::NotAuthorizedToWithdraw);
        }
        let amount = self.pool.total_pending_bond_amount;
        if amount == 0 {
            return Err(StakeError::NoUserStaking);
        }
        let principal_token = self.pool.principal_token;
        let pool_address = self.pool.address;
        let operator = self.pool.operator;
        self.ledger
            .transfer(principal_token, pool_address, operator, amount)?;
        self.pool.total_pending_bond_amount = 0;

        info!(amount, operator = %operator, "withdraw_pending_bond");
        Ok(amount)
    }

    /// Return unbonded principal from the operator for one holder, moving
    /// it from pending to claimable net of the flat fee.
    pub fn deposit_unbonded(
        &mut self,
        caller: Address,
        holder: Address,
        amount: u64,
    ) -> Result<(), StakeError> {
        if caller != self.pool.owner {
            return Err(StakeError::Unauthorized);
        }
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let fee = self.pool.flat_fee;
        if amount <= fee {
            return Err(StakeError::UnstakeAmountMustBeMoreThanTransactionFee);
        }
        let pending = self
            .pool
            .holder(holder)
            .map(|a| a.pending_unbond_amount)
            .unwrap_or(0);
        if amount > pending {
            return Err(StakeError::ExceedsPendingUnbondAmount);
        }
        let claimable_after = self
            .pool
            .holder(holder)
            .map(|a| a.claimable_unbonded_amount)
            .unwrap_or(0)
            .checked_add(amount - fee)
            .ok_or(StakeError::Overflow)?;

        let principal_token = self.pool.principal_token;
        let pool_address = self.pool.address;
        let operator = self.pool.operator;
        self.ledger
            .transfer(principal_token, operator, pool_address, amount)?;
        self.ledger
            .transfer(principal_token, pool_address, self.pool.fee_collector, fee)?;

        let account = self.pool.holder_mut(holder);
        account.pending_unbond_amount -= amount; // checked above
        account.claimable_unbonded_amount = claimable_after;

        info!(holder = %holder, amount, "deposit_unbonded");
        Ok(())
    }

    /// Pause staking and pending-bond withdrawal. Unstake and claim stay
    /// available to holders.
    pub fn pause(&mut self, caller: Address) -> Result<(), StakeError> {
        if caller != self.pool.owner {
            return Err(StakeError::Unauthorized);
        }
        if self.pool.paused {
            return Err(StakeError::ContractPaused);
        }
        self.pool.paused = true;
        info!("paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), StakeError> {
        if caller != self.pool.owner {
            return Err(StakeError::Unauthorized);
        }
        self.pool.paused = false;
        info!("unpaused");
        Ok(())
    }

    /// Hand ownership to a new owner — at deployment this is how the
    /// timelock gate becomes the owner of the privileged surface.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), StakeError> {
        if caller != self.pool.owner {
            return Err(StakeError::Unauthorized);
        }
        self.pool.owner = new_owner;
        info!(new_owner = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Append a token to the reward registry. Idempotent when the token is
    /// already registered; registered tokens are never removed.
    pub fn add_reward_token(&mut self, caller: Address, token: TokenId) -> Result<(), StakeError> {
        if caller != self.pool.owner {
            return Err(StakeError::Unauthorized);
        }
        if !self.pool.is_reward_token(token) {
            self.pool.reward_tokens.push(token);
            self.pool.rewards.insert(token, RewardLedger::default());
            info!(token = %token, "reward token registered");
        }
        Ok(())
    }

    /// Dispatch a decoded gate operation with `caller` as the authorized
    /// caller (the gate's own address when executed through the timelock).
    pub fn apply_gate_op(&mut self, caller: Address, op: GateOp) -> Result<(), StakeError> {
        match op {
            GateOp::WithdrawPendingBond => self.withdraw_pending_bond(caller).map(|_| ()),
            GateOp::DepositUnbonded { holder, amount } => {
                self.deposit_unbonded(caller, holder, amount)
            }
            GateOp::Pause => self.pause(caller),
            GateOp::Unpause => self.unpause(caller),
            GateOp::AddRewardToken { token } => self.add_reward_token(caller, token),
            GateOp::TransferOwnership { new_owner } => self.transfer_ownership(caller, new_owner),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════

    /// Holder position projection for one reward token.
    pub fn get_user_info(&self, holder: Address, token: TokenId) -> UserInfo {
        match self.pool.holder(holder) {
            Some(account) => UserInfo {
                share_balance: account.share_balance,
                pending_unbond_amount: account.pending_unbond_amount,
                claimable_unbonded_amount: account.claimable_unbonded_amount,
                reward_debt: account.reward_debt.get(&token).copied().unwrap_or(0),
                unclaimed_reward: account.unclaimed_reward.get(&token).copied().unwrap_or(0),
            },
            None => UserInfo {
                share_balance: 0,
                pending_unbond_amount: 0,
                claimable_unbonded_amount: 0,
                reward_debt: 0,
                unclaimed_reward: 0,
            },
        }
    }

    /// Reward a holder could harvest right now — unclaimed plus the unsettled
    /// accrual. Read-only projection of settlement; mutates nothing.
    pub fn get_pending_reward(&self, holder: Address, token: TokenId) -> Result<u64, StakeError> {
        if !self.pool.is_reward_token(token) {
            return Err(StakeError::UnregisteredRewardToken);
        }
        let acc = self
            .pool
            .rewards
            .get(&token)
            .map(|r| r.acc_reward_per_share)
            .unwrap_or(0);
        let account = match self.pool.holder(holder) {
            Some(account) => account,
            None => return Ok(0),
        };
        let debt = account.reward_debt.get(&token).copied().unwrap_or(0);
        let owed = math::pending_reward(account.share_balance, acc, debt)
            .ok_or(StakeError::Overflow)?;
        let unclaimed = account.unclaimed_reward.get(&token).copied().unwrap_or(0);
        unclaimed.checked_add(owed).ok_or(StakeError::Overflow)
    }

    pub fn is_reward_token(&self, token: TokenId) -> bool {
        self.pool.is_reward_token(token)
    }

    /// sDOT share balance of a holder.
    pub fn balance_of(&self, holder: Address) -> u64 {
        self.pool
            .holder(holder)
            .map(|a| a.share_balance)
            .unwrap_or(0)
    }

    pub fn total_shares(&self) -> u64 {
        self.pool.total_shares
    }

    pub fn total_pending_bond_amount(&self) -> u64 {
        self.pool.total_pending_bond_amount
    }

    pub fn internal_principal_balance(&self) -> u64 {
        self.pool.internal_principal_balance
    }

    pub fn is_paused(&self) -> bool {
        self.pool.paused
    }

    pub fn current_block_time(&self) -> u64 {
        self.ledger.current_block_time()
    }

    // ═══════════════════════════════════════════════════════════════
    // Internal: share accounting and settlement
    // ═══════════════════════════════════════════════════════════════

    /// Settle one reward token for a holder: move the accrued delta into
    /// `unclaimed_reward` and advance the baseline to the current
    /// accumulator. Idempotent while nothing changes in between.
    fn settle(&mut self, holder: Address, token: TokenId) -> Result<(), StakeError> {
        let acc = self
            .pool
            .rewards
            .get(&token)
            .map(|r| r.acc_reward_per_share)
            .ok_or(StakeError::UnregisteredRewardToken)?;
        let account = self.pool.holder_mut(holder);
        let debt = account.reward_debt.get(&token).copied().unwrap_or(0);
        let owed =
            math::pending_reward(account.share_balance, acc, debt).ok_or(StakeError::Overflow)?;
        if owed > 0 {
            let unclaimed = account.unclaimed_reward.entry(token).or_insert(0);
            *unclaimed = unclaimed.checked_add(owed).ok_or(StakeError::Overflow)?;
            debug!(holder = %holder, token = %token, owed, "settled reward");
        }
        account.reward_debt.insert(token, acc);
        Ok(())
    }

    /// Settle every registered reward token for a holder. Must run before
    /// any share-balance change so the owed amount reflects the old balance.
    fn settle_all(&mut self, holder: Address) -> Result<(), StakeError> {
        let tokens = self.pool.reward_tokens.clone();
        for token in tokens {
            self.settle(holder, token)?;
        }
        Ok(())
    }

    /// Burn shares against a principal equivalent the caller already
    /// computed and validated. Rewards must be settled beforehand.
    fn burn(
        &mut self,
        holder: Address,
        share_amount: u64,
        principal: u64,
    ) -> Result<(), StakeError> {
        let account = self.pool.holder_mut(holder);
        account.share_balance = account
            .share_balance
            .checked_sub(share_amount)
            .ok_or(StakeError::InsufficientShareBalance)?;
        self.pool.total_shares = self
            .pool
            .total_shares
            .checked_sub(share_amount)
            .ok_or(StakeError::Overflow)?;
        self.pool.internal_principal_balance = self
            .pool
            .internal_principal_balance
            .checked_sub(principal)
            .ok_or(StakeError::Overflow)?;
        Ok(())
    }
}
