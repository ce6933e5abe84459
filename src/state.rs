use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger account identifier — 32 opaque bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Deterministic test/demo address from a single byte tag.
    pub fn from_byte(tag: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = tag;
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First four bytes are enough to tell accounts apart in logs.
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Token identifier — the address of the token's ledger contract.
pub type TokenId = Address;

/// Pool creation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// The staked principal token (DOT)
    pub principal_token: TokenId,
    /// Receives the flat fee on stake and deposit-unbonded
    pub fee_collector: Address,
    /// Receives withdrawn pending bonds; funds deposit-unbonded
    pub operator: Address,
    /// Flat transaction fee in principal base units
    pub flat_fee: u64,
    /// Initial reward-token registry (append-only afterwards)
    pub reward_tokens: Vec<TokenId>,
}

/// Per reward-token accrual ledger — created once per registered token,
/// lives for the life of the pool.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RewardLedger {
    /// Cumulative reward per share, scaled by [`crate::math::REWARD_SCALE`].
    /// Monotone: only ever increases.
    pub acc_reward_per_share: u128,
    /// Lifetime reward amount injected for this token
    pub total_injected: u64,
}

/// Per-holder account — created lazily on first stake, never deleted
/// (balances may go to zero).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolderAccount {
    /// sDOT share balance
    pub share_balance: u64,
    /// Principal requested to unstake, awaiting the operator's unbonding round
    pub pending_unbond_amount: u64,
    /// Principal returned by the operator, ready for withdrawal
    pub claimable_unbonded_amount: u64,
    /// Per-token accumulator baseline at the holder's last settlement
    pub reward_debt: BTreeMap<TokenId, u128>,
    /// Per-token reward settled but not yet harvested
    pub unclaimed_reward: BTreeMap<TokenId, u64>,
}

/// Read-only projection of a holder's position for one reward token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserInfo {
    pub share_balance: u64,
    pub pending_unbond_amount: u64,
    pub claimable_unbonded_amount: u64,
    pub reward_debt: u128,
    pub unclaimed_reward: u64,
}

/// Liquid-staking pool state — one per deployment.
///
/// An explicit struct handed to every operation; there is no hidden global.
/// The surrounding ledger serializes operations, so no locking happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// Ledger account holding pooled principal and injected rewards
    pub address: Address,
    /// Owner of the privileged surface — the timelock gate once ownership
    /// has been transferred to it
    pub owner: Address,
    pub operator: Address,
    pub fee_collector: Address,
    pub principal_token: TokenId,
    /// Flat transaction fee in principal base units
    pub flat_fee: u64,
    pub paused: bool,
    /// sDOT shares outstanding; equals the sum of holder share balances
    pub total_shares: u64,
    /// Principal backing the outstanding shares. Grows on stake (post-fee),
    /// shrinks on unstake; NOT reduced when the operator withdraws the
    /// pending bond — bonded-out principal is still owed to share holders.
    pub internal_principal_balance: u64,
    /// Principal collected from stakers, awaiting operator bonding
    pub total_pending_bond_amount: u64,
    /// Registered reward tokens, append-only
    pub reward_tokens: Vec<TokenId>,
    pub rewards: BTreeMap<TokenId, RewardLedger>,
    pub holders: BTreeMap<Address, HolderAccount>,
}

impl Pool {
    pub fn new(address: Address, owner: Address, config: PoolConfig) -> Self {
        let mut rewards = BTreeMap::new();
        for token in &config.reward_tokens {
            rewards.insert(*token, RewardLedger::default());
        }
        Pool {
            address,
            owner,
            operator: config.operator,
            fee_collector: config.fee_collector,
            principal_token: config.principal_token,
            flat_fee: config.flat_fee,
            paused: false,
            total_shares: 0,
            internal_principal_balance: 0,
            total_pending_bond_amount: 0,
            reward_tokens: config.reward_tokens,
            rewards,
            holders: BTreeMap::new(),
        }
    }

    pub fn is_reward_token(&self, token: TokenId) -> bool {
        self.reward_tokens.contains(&token)
    }

    pub fn holder(&self, address: Address) -> Option<&HolderAccount> {
        self.holders.get(&address)
    }

    pub(crate) fn holder_mut(&mut self, address: Address) -> &mut HolderAccount {
        self.holders.entry(address).or_default()
    }

    /// Shares minted for a post-fee stake amount.
    /// Delegates to the pure math module.
    pub fn calc_shares_for_stake(&self, principal_after_fee: u64) -> Option<u64> {
        crate::math::calc_shares_for_stake(
            self.total_shares,
            self.internal_principal_balance,
            principal_after_fee,
        )
    }

    /// Principal equivalent of a share burn.
    pub fn calc_principal_for_unstake(&self, share_amount: u64) -> Option<u64> {
        crate::math::calc_principal_for_unstake(
            self.total_shares,
            self.internal_principal_balance,
            share_amount,
        )
    }
}
