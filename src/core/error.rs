//! Error types.
//!
//! Crossbar distinguishes three classes of failure:
//!
//! - **Fatal**: a broken precondition, such as the store refusing to allocate
//!   a transaction object. These indicate a bug, not user error.
//! - **Reported**: commit outcomes other than applied/unchanged/incomplete.
//!   Converted to a boolean at the session boundary; detail is logged.
//! - **Benign**: the remote store being temporarily unreachable. The sync
//!   loop retries indefinitely and the CLI layer never sees it.

use crate::replica::store::CommitOutcome;
use thiserror::Error;

/// Crossbar error conditions.
#[derive(Debug, Error)]
pub enum CrossbarError {
    /// The remote store is temporarily unreachable. Benign; callers on the
    /// sync path retry, callers on the write path report failure.
    #[error("remote store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A write transaction is already open on this channel. The second
    /// `begin` is rejected rather than silently replacing the first.
    #[error("a configuration transaction is already in flight")]
    TransactionInFlight,

    /// The store refused to allocate a transaction object. This violates a
    /// precondition of the session lifecycle and signals a bug rather than a
    /// recoverable user error.
    #[error("store refused to allocate a transaction object")]
    TransactionUnavailable,

    /// A blocking commit finished with an outcome that is not
    /// success-equivalent.
    #[error("commit failed with outcome {outcome:?}")]
    CommitFailed { outcome: CommitOutcome },

    /// A scalar read or write targeted a table with no rows.
    #[error("no row present in table {table}")]
    NoRow { table: &'static str },
}

impl CrossbarError {
    /// Create a `StoreUnavailable` error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Check if this error is benign on the sync path and should be retried.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Check if this error indicates a broken precondition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TransactionUnavailable)
    }
}

/// Result type using CrossbarError.
pub type CrossbarResult<T> = Result<T, CrossbarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_retriable() {
        assert!(CrossbarError::unavailable("connection refused").is_retriable());
        assert!(!CrossbarError::TransactionInFlight.is_retriable());
    }

    #[test]
    fn allocation_failure_is_fatal() {
        assert!(CrossbarError::TransactionUnavailable.is_fatal());
        assert!(!CrossbarError::CommitFailed {
            outcome: CommitOutcome::TryAgain
        }
        .is_fatal());
    }
}
