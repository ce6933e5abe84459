//! Timelocked admin gate.
//!
//! Privileged pool operations (withdraw pending bond, deposit unbonded,
//! pause, registry and ownership changes) are not called by a human
//! directly: ownership of the pool is transferred to a [`TimelockGate`],
//! and every privileged call is scheduled, delayed by at least `min_delay`,
//! then executed once. The settlement core never inlines delay logic — it
//! only checks that the caller is the owner; the gate IS that owner.
//!
//! An operation is identified by the blake3 hash of
//! (target, data, predecessor, salt), mirroring the scheduling-hash scheme
//! of the timelock controller this models.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::state::{Address, TokenId};

/// Scheduling hash identifying one operation.
pub type OperationId = [u8; 32];

/// Sentinel for "no predecessor".
pub const NO_PREDECESSOR: OperationId = [0u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("caller is not a proposer")]
    NotProposer,
    #[error("caller is not an executor")]
    NotExecutor,
    #[error("delay is shorter than the minimum delay")]
    DelayTooShort,
    #[error("operation is already scheduled")]
    AlreadyScheduled,
    #[error("unknown operation")]
    UnknownOperation,
    #[error("operation is not ready for execution")]
    OperationNotReady,
    #[error("predecessor operation is not done")]
    PredecessorNotDone,
    #[error("invalid operation data")]
    InvalidOperationData,
}

/// A privileged pool operation routed through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    /// Transfer the whole pending bond to the operator
    WithdrawPendingBond,
    /// Return unbonded principal for one holder's pending unbond
    DepositUnbonded { holder: Address, amount: u64 },
    /// Set the pause flag
    Pause,
    /// Clear the pause flag
    Unpause,
    /// Append a token to the reward registry
    AddRewardToken { token: TokenId },
    /// Hand pool ownership to a new owner
    TransferOwnership { new_owner: Address },
}

impl GateOp {
    /// Encode as tag byte + little-endian fields.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            GateOp::WithdrawPendingBond => vec![0u8],
            GateOp::DepositUnbonded { holder, amount } => {
                let mut data = vec![1u8];
                data.extend_from_slice(holder.as_bytes());
                data.extend_from_slice(&amount.to_le_bytes());
                data
            }
            GateOp::Pause => vec![2u8],
            GateOp::Unpause => vec![3u8],
            GateOp::AddRewardToken { token } => {
                let mut data = vec![4u8];
                data.extend_from_slice(token.as_bytes());
                data
            }
            GateOp::TransferOwnership { new_owner } => {
                let mut data = vec![5u8];
                data.extend_from_slice(new_owner.as_bytes());
                data
            }
        }
    }

    pub fn unpack(data: &[u8]) -> Result<Self, GateError> {
        let (&tag, rest) = data.split_first().ok_or(GateError::InvalidOperationData)?;

        match tag {
            0 => Ok(Self::WithdrawPendingBond),
            1 => {
                // DepositUnbonded: holder(32) + amount(8)
                if rest.len() < 40 {
                    return Err(GateError::InvalidOperationData);
                }
                let holder = Address::new(
                    rest[0..32]
                        .try_into()
                        .map_err(|_| GateError::InvalidOperationData)?,
                );
                let amount = u64::from_le_bytes(
                    rest[32..40]
                        .try_into()
                        .map_err(|_| GateError::InvalidOperationData)?,
                );
                Ok(Self::DepositUnbonded { holder, amount })
            }
            2 => Ok(Self::Pause),
            3 => Ok(Self::Unpause),
            4 => {
                if rest.len() < 32 {
                    return Err(GateError::InvalidOperationData);
                }
                let token = Address::new(
                    rest[0..32]
                        .try_into()
                        .map_err(|_| GateError::InvalidOperationData)?,
                );
                Ok(Self::AddRewardToken { token })
            }
            5 => {
                if rest.len() < 32 {
                    return Err(GateError::InvalidOperationData);
                }
                let new_owner = Address::new(
                    rest[0..32]
                        .try_into()
                        .map_err(|_| GateError::InvalidOperationData)?,
                );
                Ok(Self::TransferOwnership { new_owner })
            }
            _ => Err(GateError::InvalidOperationData),
        }
    }
}

/// Scheduling hash of (target, data, predecessor, salt).
pub fn operation_id(
    target: Address,
    data: &[u8],
    predecessor: OperationId,
    salt: [u8; 32],
) -> OperationId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(target.as_bytes());
    hasher.update(data);
    hasher.update(&predecessor);
    hasher.update(&salt);
    *hasher.finalize().as_bytes()
}

#[derive(Debug, Clone)]
struct Scheduled {
    target: Address,
    data: Vec<u8>,
    predecessor: OperationId,
    /// Earliest execution time
    eta: u64,
    done: bool,
}

/// Minimum-delay, single-use-execution admin gate.
#[derive(Debug, Clone)]
pub struct TimelockGate {
    address: Address,
    min_delay: u64,
    proposers: Vec<Address>,
    executors: Vec<Address>,
    operations: BTreeMap<OperationId, Scheduled>,
}

impl TimelockGate {
    pub fn new(
        address: Address,
        min_delay: u64,
        proposers: Vec<Address>,
        executors: Vec<Address>,
    ) -> Self {
        TimelockGate {
            address,
            min_delay,
            proposers,
            executors,
            operations: BTreeMap::new(),
        }
    }

    /// The gate's own account — the pool owner after ownership transfer.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn min_delay(&self) -> u64 {
        self.min_delay
    }

    /// Schedule `op` against `target` for execution no earlier than
    /// `now + delay`. Returns the operation id.
    pub fn schedule(
        &mut self,
        proposer: Address,
        target: Address,
        op: &GateOp,
        predecessor: OperationId,
        salt: [u8; 32],
        delay: u64,
        now: u64,
    ) -> Result<OperationId, GateError> {
        if !self.proposers.contains(&proposer) {
            return Err(GateError::NotProposer);
        }
        if delay < self.min_delay {
            return Err(GateError::DelayTooShort);
        }
        let data = op.pack();
        let id = operation_id(target, &data, predecessor, salt);
        if self.operations.contains_key(&id) {
            return Err(GateError::AlreadyScheduled);
        }
        let eta = now.saturating_add(delay);
        self.operations.insert(
            id,
            Scheduled {
                target,
                data,
                predecessor,
                eta,
                done: false,
            },
        );
        Ok(id)
    }

    /// Whether the operation is scheduled, its delay has elapsed, and it
    /// has not been executed yet.
    pub fn is_ready(&self, id: OperationId, now: u64) -> bool {
        match self.operations.get(&id) {
            Some(op) => !op.done && now >= op.eta,
            None => false,
        }
    }

    /// The gate's authorization decision consumed by callers: is this
    /// operation allowed to run right now?
    pub fn is_authorized_now(&self, id: OperationId, now: u64) -> bool {
        self.is_ready(id, now)
    }

    /// Execute a ready operation once by applying it through `apply`,
    /// which receives the target and the decoded [`GateOp`] and runs the
    /// call with the gate's address as the authorized caller.
    ///
    /// The operation is consumed only when `apply` succeeds; a failed
    /// apply leaves it scheduled, so it can be retried.
    pub fn execute<E>(
        &mut self,
        executor: Address,
        id: OperationId,
        now: u64,
        apply: impl FnOnce(Address, GateOp) -> Result<(), E>,
    ) -> Result<Result<(), E>, GateError> {
        if !self.executors.contains(&executor) {
            return Err(GateError::NotExecutor);
        }
        let (target, data, predecessor) = {
            let op = self.operations.get(&id).ok_or(GateError::UnknownOperation)?;
            if op.done || now < op.eta {
                return Err(GateError::OperationNotReady);
            }
            (op.target, op.data.clone(), op.predecessor)
        };
        if predecessor != NO_PREDECESSOR {
            let done = self
                .operations
                .get(&predecessor)
                .map(|p| p.done)
                .unwrap_or(false);
            if !done {
                return Err(GateError::PredecessorNotDone);
            }
        }
        let op = GateOp::unpack(&data)?;
        match apply(target, op) {
            Ok(()) => {
                if let Some(entry) = self.operations.get_mut(&id) {
                    entry.done = true;
                }
                Ok(Ok(()))
            }
            Err(e) => Ok(Err(e)),
        }
    }
}
