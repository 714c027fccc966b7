//! Remote store abstraction.
//!
//! Crossbar does not speak the replication endpoint's wire protocol itself;
//! it consumes the replica/transaction abstraction defined here. The
//! embedded implementation lives in [`crate::replica::embedded`]; external
//! deployments inject their own driver through
//! [`crate::session::Session::with_store`].

use crate::core::config::StoreConfig;
use crate::core::error::CrossbarResult;
use crate::replica::embedded::EmbeddedStore;
use crate::replica::row::{Row, RowChange, TableKind};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// This process's claim to be the sole cache-synchronizing writer.
///
/// The token name is derived from the process identity so concurrent CLI
/// sessions against the same store request distinct locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    name: String,
}

impl LockToken {
    /// Derive a token for the current process.
    pub fn for_process() -> Self {
        Self {
            name: format!("crossbar_cli_{}", std::process::id()),
        }
    }

    /// The lock name as registered with the store.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Handle to a store-side transaction object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnTicket(pub u64);

/// One staged row mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Set a single field on an existing row.
    SetField {
        table: TableKind,
        key: String,
        field: String,
        value: Value,
    },
    /// Insert or replace a whole row.
    InsertRow { table: TableKind, row: Row },
    /// Delete a row.
    DeleteRow { table: TableKind, key: String },
}

/// An ordered batch of mutations flushed under one transaction ticket.
#[derive(Debug)]
pub struct MutationBatch {
    /// The transaction this batch belongs to.
    pub ticket: TxnTicket,
    /// Mutations in staging order.
    pub mutations: Vec<Mutation>,
}

/// Changes drained from the store by one poll.
#[derive(Debug, Default)]
pub struct PollReport {
    /// Store revision after these changes.
    pub seqno: u64,
    /// Row changes since the previous poll, in arrival order.
    pub changes: Vec<RowChange>,
}

/// Outcome of a blocking commit.
///
/// `Committed`, `Unchanged`, and `Incomplete` are success-equivalent for the
/// CLI layer; the distinction is preserved here so the boundary can decide
/// what to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Fully applied and visible.
    Committed,
    /// No rows actually changed.
    Unchanged,
    /// Applied, but the result is not yet visible in the replica.
    Incomplete,
    /// The store aborted the transaction.
    Aborted,
    /// Transient contention; the caller may retry with a fresh transaction.
    TryAgain,
    /// This process does not hold the write lock.
    NotLocked,
    /// The store reported an error.
    Error,
}

impl CommitOutcome {
    /// Whether this outcome counts as success for the CLI layer.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Committed | Self::Unchanged | Self::Incomplete)
    }
}

/// The replica/transaction abstraction provided by the replication endpoint.
///
/// Same pattern as the rest of the crate's seams: a trait in the domain
/// module, with the concrete driver supplied by the deployment. All methods
/// are safe to call before lock ownership is confirmed; only mutations are
/// meaningless without it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Register this process's lock claim. Ownership is confirmed
    /// asynchronously through [`RemoteStore::has_lock`] as polls progress.
    fn request_lock(&self, token: &LockToken);

    /// Whether this process currently holds the write lock.
    fn has_lock(&self) -> bool;

    /// Release the write lock (shutdown path).
    fn release_lock(&self);

    /// Drain pending replica changes. Returns an error while the store is
    /// unreachable; the sync loop treats that as benign and retries.
    async fn poll(&self) -> CrossbarResult<PollReport>;

    /// Wait until another poll is worthwhile: a pending change, or a lock
    /// request that has not been granted yet. Returns immediately if either
    /// is already the case.
    async fn changed(&self);

    /// Allocate a store-side transaction object. `None` means the store
    /// refused, which the session treats as an invariant violation.
    fn open_txn(&self) -> Option<TxnTicket>;

    /// Flush a mutation batch, blocking until the store acknowledges. The
    /// store-side transaction object is released regardless of outcome.
    async fn commit(&self, batch: MutationBatch) -> CrossbarResult<CommitOutcome>;

    /// Discard a transaction object without committing. Never fails.
    fn discard_txn(&self, ticket: TxnTicket);
}

/// Build a store handle for the configured mode.
///
/// Embedded mode runs the store in-process. External mode expects the
/// deployment to inject its driver via `Session::with_store`; constructing
/// one from configuration alone is an error.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn RemoteStore>> {
    if config.is_embedded() {
        Ok(Arc::new(EmbeddedStore::with_bootstrap()))
    } else {
        anyhow::bail!(
            "external store mode requires an injected driver for {}",
            config.socket_address()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_token_names_the_process() {
        let token = LockToken::for_process();
        assert!(token.name().starts_with("crossbar_cli_"));
        assert!(token.name().ends_with(&std::process::id().to_string()));
    }

    #[test]
    fn applied_outcomes() {
        assert!(CommitOutcome::Committed.is_applied());
        assert!(CommitOutcome::Unchanged.is_applied());
        assert!(CommitOutcome::Incomplete.is_applied());
        assert!(!CommitOutcome::Aborted.is_applied());
        assert!(!CommitOutcome::TryAgain.is_applied());
        assert!(!CommitOutcome::NotLocked.is_applied());
        assert!(!CommitOutcome::Error.is_applied());
    }

    #[test]
    fn connect_rejects_external_without_driver() {
        let config = StoreConfig {
            mode: "external".to_string(),
            ..StoreConfig::default()
        };
        assert!(connect(&config).is_err());
    }
}
