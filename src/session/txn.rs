//! Transaction staging and flush.
//!
//! A [`Transaction`] is an owned value returned from `begin` and threaded
//! explicitly through `commit` or `abort`. There is no shared mutable slot,
//! so a double begin is a detectable error rather than a silent overwrite.
//! Commit blocks until the store acknowledges; committed, unchanged, and
//! incomplete outcomes are success-equivalent, everything else is reported
//! as a failure. The store-side transaction object is released on every exit
//! path.

use crate::core::error::{CrossbarError, CrossbarResult};
use crate::replica::cache::ReplicaCache;
use crate::replica::store::{CommitOutcome, Mutation, MutationBatch, RemoteStore, TxnTicket};

/// An open write transaction: a store-side ticket plus staged mutations.
#[derive(Debug)]
pub struct Transaction {
    ticket: TxnTicket,
    mutations: Vec<Mutation>,
}

impl Transaction {
    /// Stage a mutation. Mutations are flushed in staging order.
    pub fn stage(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Whether anything has been staged.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Number of staged mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    fn into_batch(self) -> MutationBatch {
        MutationBatch {
            ticket: self.ticket,
            mutations: self.mutations,
        }
    }
}

/// Serializes write transactions on one session channel.
#[derive(Debug, Default)]
pub struct TransactionManager {
    open: bool,
}

impl TransactionManager {
    /// Create a manager with no transaction in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction is currently in flight.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open a transaction, refreshing the cache first so mutations stage
    /// against current data.
    ///
    /// Fails with [`CrossbarError::TransactionInFlight`] while another
    /// transaction is open, and with
    /// [`CrossbarError::TransactionUnavailable`] if the store refuses the
    /// allocation; the latter signals a broken precondition.
    pub async fn begin(
        &mut self,
        store: &dyn RemoteStore,
        cache: &mut ReplicaCache,
    ) -> CrossbarResult<Transaction> {
        if self.open {
            return Err(CrossbarError::TransactionInFlight);
        }
        match store.poll().await {
            Ok(report) => cache.apply(report),
            Err(error) => tracing::debug!(%error, "begin proceeding on current snapshot"),
        }
        let ticket = store
            .open_txn()
            .ok_or(CrossbarError::TransactionUnavailable)?;
        self.open = true;
        Ok(Transaction {
            ticket,
            mutations: Vec::new(),
        })
    }

    /// Flush a transaction, blocking until the store acknowledges.
    ///
    /// The transaction is consumed and the store-side object discarded
    /// whatever happens; a subsequent `begin` always succeeds.
    pub async fn commit(
        &mut self,
        store: &dyn RemoteStore,
        tx: Transaction,
    ) -> CrossbarResult<CommitOutcome> {
        self.open = false;
        let ticket = tx.ticket;
        let outcome = match store.commit(tx.into_batch()).await {
            Ok(outcome) => outcome,
            Err(error) => {
                store.discard_txn(ticket);
                return Err(error);
            }
        };
        if outcome.is_applied() {
            Ok(outcome)
        } else {
            Err(CrossbarError::CommitFailed { outcome })
        }
    }

    /// Discard a transaction and its staged mutations. Never fails.
    pub fn abort(&mut self, store: &dyn RemoteStore, tx: Transaction) {
        store.discard_txn(tx.ticket);
        self.open = false;
        tracing::debug!(staged = tx.mutations.len(), "configuration transaction aborted");
    }
}
