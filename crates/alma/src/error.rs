//! Error types for the kernel.

use thiserror::Error;

use crate::model::OpKey;

/// Errors returned by model and operator calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Data access or a proposal on an operator that is not mounted.
    #[error("Unmounted Operator: {0}.")]
    UnmountedOperator(String),
    /// The caller broke one of the kernel's usage rules.
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
}

/// Misuse of the kernel that would otherwise silently corrupt state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("UNKNOWN_OPERATOR: {0}")]
    UnknownOperator(OpKey),
    /// The operator is currently borrowed by a dispatch further up the stack.
    #[error("OPERATOR_BUSY: {0}")]
    OperatorBusy(OpKey),
    #[error("WRONG_OPERATOR_TYPE: {key} is not a {expected}")]
    WrongOperatorType { key: OpKey, expected: &'static str },
    #[error("MISSING_SUPERVISOR")]
    MissingSupervisor,
    /// A proposal was issued while another proposal was being considered.
    #[error("REENTRANT_PROPOSAL: {0}")]
    ReentrantProposal(String),
    #[error("ALREADY_MOUNTED: {0}")]
    AlreadyMounted(OpKey),
    #[error("ALREADY_NESTED: {0}")]
    AlreadyNested(OpKey),
    #[error("NESTING_CYCLE: {0}")]
    NestingCycle(OpKey),
    #[error("ID_COLLISION: {0}")]
    IdCollision(u64),
    #[error("MISSING_CREATOR: {0}")]
    MissingCreator(String),
    #[error("SEQUENCE_EXHAUSTED: {0}")]
    SequenceExhausted(u64),
    #[error("UNKNOWN_BINDING: {0}")]
    UnknownBinding(String),
    #[error("MALFORMED_ACTION: {0}")]
    MalformedAction(String),
}

pub type Result<T, E = KernelError> = std::result::Result<T, E>;
