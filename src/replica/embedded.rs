//! In-process remote store.
//!
//! Embedded mode hosts the authoritative tables inside the CLI process, the
//! same way the session would consume a real replication endpoint: changes
//! flow through a change log drained by `poll`, commits block until applied,
//! and the write lock is granted asynchronously. Integration tests drive the
//! session through this store and use its knobs to force lock-grant delays,
//! commit outcomes, transaction denial, and unreachability.

use crate::core::error::{CrossbarError, CrossbarResult};
use crate::replica::row::{Row, RowChange, TableKind};
use crate::replica::store::{
    CommitOutcome, LockToken, Mutation, MutationBatch, PollReport, RemoteStore, TxnTicket,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct LockState {
    requested: Option<LockToken>,
    granted: bool,
    /// Polls remaining before a requested lock is granted.
    grant_after_polls: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    tables: HashMap<TableKind, BTreeMap<String, Row>>,
    log: Vec<RowChange>,
    delivered: usize,
    seqno: u64,
    lock: LockState,
    next_ticket: u64,
    open_ticket: Option<u64>,
    forced_outcome: Option<CommitOutcome>,
    deny_txn: bool,
    unreachable: bool,
}

impl StoreState {
    fn pending_changes(&self) -> bool {
        self.delivered < self.log.len()
    }

    /// A requested lock that has not been granted yet counts as pending
    /// work: the waiter must keep polling so the grant countdown progresses.
    fn grant_pending(&self) -> bool {
        self.lock.requested.is_some() && !self.lock.granted
    }

    fn record(&mut self, change: RowChange) {
        match &change {
            RowChange::Upsert { table, row } => {
                self.tables
                    .entry(*table)
                    .or_default()
                    .insert(row.key.clone(), row.clone());
            }
            RowChange::Delete { table, key } => {
                if let Some(rows) = self.tables.get_mut(table) {
                    rows.remove(key);
                }
            }
        }
        self.log.push(change);
    }

    /// Apply a mutation batch to the authoritative tables. Returns whether
    /// anything actually changed.
    fn apply(&mut self, mutations: Vec<Mutation>) -> bool {
        let mut effective = false;
        for mutation in mutations {
            match mutation {
                Mutation::SetField {
                    table,
                    key,
                    field,
                    value,
                } => {
                    let current = self.tables.get(&table).and_then(|rows| rows.get(&key));
                    let Some(row) = current else {
                        tracing::warn!(%table, key, "mutation targets a missing row");
                        continue;
                    };
                    if row.field(&field) == Some(&value) {
                        continue;
                    }
                    let mut updated = row.clone();
                    updated.fields.insert(field, value);
                    self.record(RowChange::Upsert {
                        table,
                        row: updated,
                    });
                    effective = true;
                }
                Mutation::InsertRow { table, row } => {
                    let current = self.tables.get(&table).and_then(|rows| rows.get(&row.key));
                    if current == Some(&row) {
                        continue;
                    }
                    self.record(RowChange::Upsert { table, row });
                    effective = true;
                }
                Mutation::DeleteRow { table, key } => {
                    let present = self
                        .tables
                        .get(&table)
                        .is_some_and(|rows| rows.contains_key(&key));
                    if !present {
                        continue;
                    }
                    self.record(RowChange::Delete { table, key });
                    effective = true;
                }
            }
        }
        effective
    }
}

/// In-process implementation of [`RemoteStore`].
#[derive(Default)]
pub struct EmbeddedStore {
    state: Mutex<StoreState>,
    notify: Notify,
}

impl EmbeddedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the singleton system record.
    pub fn with_bootstrap() -> Self {
        let store = Self::new();
        store.seed_row(TableKind::System, Row::new("system").with_field("hostname", ""));
        store
    }

    /// Install a row directly in the authoritative tables, bypassing the
    /// transaction path. Visible to the cache on the next poll.
    pub fn seed_row(&self, table: TableKind, row: Row) {
        let mut state = self.state.lock();
        state.record(RowChange::Upsert { table, row });
        state.seqno += 1;
        drop(state);
        self.notify.notify_one();
    }

    /// Inspect the authoritative copy of a row.
    pub fn row(&self, table: TableKind, key: &str) -> Option<Row> {
        let state = self.state.lock();
        state.tables.get(&table).and_then(|rows| rows.get(key)).cloned()
    }

    /// Delay lock grants by this many polls.
    pub fn set_lock_grant_delay(&self, polls: u32) {
        self.state.lock().lock.grant_after_polls = polls;
    }

    /// Force the next commit to report the given outcome. Only `Incomplete`
    /// still applies the batch; failure outcomes drop it.
    pub fn force_commit_outcome(&self, outcome: CommitOutcome) {
        self.state.lock().forced_outcome = Some(outcome);
    }

    /// Make `open_txn` refuse allocations.
    pub fn deny_transactions(&self, deny: bool) {
        self.state.lock().deny_txn = deny;
    }

    /// Simulate loss of connectivity.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
        if !unreachable {
            self.notify.notify_one();
        }
    }
}

#[async_trait]
impl RemoteStore for EmbeddedStore {
    fn request_lock(&self, token: &LockToken) {
        let mut state = self.state.lock();
        tracing::debug!(lock = token.name(), "lock requested");
        state.lock.requested = Some(token.clone());
        drop(state);
        self.notify.notify_one();
    }

    fn has_lock(&self) -> bool {
        self.state.lock().lock.granted
    }

    fn release_lock(&self) {
        let mut state = self.state.lock();
        state.lock.granted = false;
        state.lock.requested = None;
    }

    async fn poll(&self) -> CrossbarResult<PollReport> {
        let mut state = self.state.lock();
        if state.unreachable {
            return Err(CrossbarError::unavailable("replication endpoint not responding"));
        }

        if state.lock.requested.is_some() && !state.lock.granted {
            if state.lock.grant_after_polls == 0 {
                state.lock.granted = true;
                tracing::debug!("lock granted");
            } else {
                state.lock.grant_after_polls -= 1;
            }
        }

        let changes = state.log[state.delivered..].to_vec();
        state.delivered = state.log.len();
        Ok(PollReport {
            seqno: state.seqno,
            changes,
        })
    }

    async fn changed(&self) {
        loop {
            let notified = self.notify.notified();
            {
                let state = self.state.lock();
                if !state.unreachable && (state.pending_changes() || state.grant_pending()) {
                    return;
                }
            }
            notified.await;
        }
    }

    fn open_txn(&self) -> Option<TxnTicket> {
        let mut state = self.state.lock();
        if state.deny_txn {
            return None;
        }
        if state.open_ticket.is_some() {
            tracing::warn!("refusing second concurrent transaction");
            return None;
        }
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.open_ticket = Some(ticket);
        Some(TxnTicket(ticket))
    }

    async fn commit(&self, batch: MutationBatch) -> CrossbarResult<CommitOutcome> {
        let mut state = self.state.lock();
        if state.unreachable {
            state.open_ticket = None;
            return Err(CrossbarError::unavailable("replication endpoint not responding"));
        }
        if state.open_ticket != Some(batch.ticket.0) {
            tracing::warn!(ticket = batch.ticket.0, "commit with unknown transaction ticket");
            state.open_ticket = None;
            return Ok(CommitOutcome::Error);
        }
        state.open_ticket = None;

        if let Some(outcome) = state.forced_outcome.take() {
            if outcome == CommitOutcome::Incomplete && state.apply(batch.mutations) {
                state.seqno += 1;
                drop(state);
                self.notify.notify_one();
            }
            return Ok(outcome);
        }

        if !state.lock.granted {
            return Ok(CommitOutcome::NotLocked);
        }

        if state.apply(batch.mutations) {
            state.seqno += 1;
            drop(state);
            self.notify.notify_one();
            Ok(CommitOutcome::Committed)
        } else {
            Ok(CommitOutcome::Unchanged)
        }
    }

    fn discard_txn(&self, ticket: TxnTicket) {
        let mut state = self.state.lock();
        if state.open_ticket == Some(ticket.0) {
            state.open_ticket = None;
        }
    }
}
