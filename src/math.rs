//! Pure share and reward-accrual math.
//!
//! No ledger or state dependencies. Just arithmetic, so every function
//! can be tested exhaustively over its inputs.

/// Scaling constant for the per-share reward accumulator.
///
/// `acc_reward_per_share` is a fixed-point value scaled by this constant;
/// every division truncates toward zero (floor for non-negative operands).
pub const REWARD_SCALE: u128 = 1_000_000_000_000_000_000;

/// Calculate sDOT shares minted for a stake.
///
/// # Arguments
/// * `total_shares` - sDOT shares currently outstanding
/// * `internal_balance` - principal backing those shares
/// * `principal_after_fee` - principal being staked, net of the flat fee
///
/// # Returns
/// * `Some(shares)` - shares to mint (rounds DOWN — pool-favoring)
/// * `None` - arithmetic overflow or blocked state
///
/// # Invariant
/// First staker (`total_shares == 0`): 1:1 shares.
/// Subsequent: `shares = after_fee * total_shares / internal_balance`.
/// Shares outstanding against a zero internal balance block minting —
/// a 1:1 mint there would hand the new staker the orphaned claim.
pub fn calc_shares_for_stake(
    total_shares: u64,
    internal_balance: u64,
    principal_after_fee: u64,
) -> Option<u64> {
    if total_shares == 0 {
        // Bootstrap — 1:1
        Some(principal_after_fee)
    } else if internal_balance == 0 {
        None
    } else {
        let shares = (principal_after_fee as u128)
            .checked_mul(total_shares as u128)?
            .checked_div(internal_balance as u128)?;
        if shares > u64::MAX as u128 {
            None
        } else {
            Some(shares as u64)
        }
    }
}

/// Calculate the principal equivalent of a share burn.
///
/// # Returns
/// * `Some(principal)` - rounds DOWN; full burn returns ≤ internal balance
/// * `None` - zero total shares or overflow
pub fn calc_principal_for_unstake(
    total_shares: u64,
    internal_balance: u64,
    share_amount: u64,
) -> Option<u64> {
    if total_shares == 0 {
        return None;
    }
    let principal = (share_amount as u128)
        .checked_mul(internal_balance as u128)?
        .checked_div(total_shares as u128)?;
    if principal > u64::MAX as u128 {
        None
    } else {
        Some(principal as u64)
    }
}

/// Accumulator increment for an injected reward amount.
///
/// `delta = amount * REWARD_SCALE / total_shares`, floor. `None` when no
/// shares are outstanding (the caller rejects the injection) or on overflow.
pub fn acc_per_share_delta(amount: u64, total_shares: u64) -> Option<u128> {
    if total_shares == 0 {
        return None;
    }
    (amount as u128)
        .checked_mul(REWARD_SCALE)?
        .checked_div(total_shares as u128)
}

/// Reward owed to a holder since the last settlement.
///
/// `owed = share_balance * (acc - debt) / REWARD_SCALE`, floor.
/// `None` when `debt > acc` (broken state — the accumulator is monotone)
/// or on overflow of the intermediate product.
pub fn pending_reward(share_balance: u64, acc: u128, debt: u128) -> Option<u64> {
    let delta = acc.checked_sub(debt)?;
    let owed = (share_balance as u128)
        .checked_mul(delta)?
        .checked_div(REWARD_SCALE)?;
    if owed > u64::MAX as u128 {
        None
    } else {
        Some(owed as u64)
    }
}
