//! Ledger adapter — the external token ledger the settlement engine drives.
//!
//! The engine never moves tokens itself; it asks the ledger for atomic
//! transfers, balance queries, and the current block time. On-chain this is
//! the surrounding transactional runtime; in tests it is [`MemoryLedger`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::state::{Address, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transfer amount exceeds the sender's balance
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    /// Receiving the amount would overflow the destination balance
    #[error("balance overflow")]
    BalanceOverflow,
}

/// Atomic token-movement primitives. Implementations must apply a transfer
/// fully or not at all — the engine assumes no partial failure.
pub trait Ledger {
    fn transfer(
        &mut self,
        token: TokenId,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn balance_of(&self, token: TokenId, owner: Address) -> u64;

    /// Current block timestamp in seconds.
    fn current_block_time(&self) -> u64;
}

/// In-memory ledger with a manually driven clock, for tests and simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: BTreeMap<(TokenId, Address), u64>,
    now: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `to` out of thin air.
    pub fn mint(&mut self, token: TokenId, to: Address, amount: u64) {
        let balance = self.balances.entry((token, to)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn set_block_time(&mut self, now: u64) {
        self.now = now;
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.now = self.now.saturating_add(seconds);
    }
}

impl Ledger for MemoryLedger {
    fn transfer(
        &mut self,
        token: TokenId,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let from_balance = self.balance_of(token, from);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self.balance_of(token, to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.balances.insert((token, from), new_from);
        self.balances.insert((token, to), new_to);
        Ok(())
    }

    fn balance_of(&self, token: TokenId, owner: Address) -> u64 {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }

    fn current_block_time(&self) -> u64 {
        self.now
    }
}
