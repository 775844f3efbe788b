use thiserror::Error;

/// Represents all possible errors surfaced by the custody engine
///
/// Every failure aborts the whole call with no partial state change; the
/// engine validates before it mutates.
#[derive(Error, Debug)]
pub enum CustodyError {
    /// Bad or missing input: empty address, zero amount, blank symbol
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Errors related to missing holders, withdrawals or configuration
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate identifiers or re-initialization attempts
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Management-address configuration fails the threshold-achievability check
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Failures propagated from the external token ledger
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl CustodyError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        CustodyError::Precondition(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        CustodyError::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CustodyError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CustodyError::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        CustodyError::Invariant(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        CustodyError::Ledger(msg.into())
    }
}
