//! Process-local replica cache.
//!
//! The cache mirrors subscribed rows of the shared database. Poll reports
//! are applied in one call while the caller holds the only mutable handle,
//! so reads always observe the latest fully-applied snapshot and never a
//! half-installed row.

use crate::replica::row::{Row, RowChange, TableKind};
use crate::replica::schema::TableRegistration;
use crate::replica::store::PollReport;
use std::collections::{BTreeMap, HashMap};

/// In-memory mirror of the subscribed tables.
#[derive(Debug, Default)]
pub struct ReplicaCache {
    tables: HashMap<TableKind, BTreeMap<String, Row>>,
    registrations: Vec<TableRegistration>,
    seqno: u64,
}

impl ReplicaCache {
    /// Create an empty cache with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tables and columns this cache retains.
    ///
    /// Must happen before the first apply; unsubscribed tables and columns
    /// are dropped silently.
    pub fn register(&mut self, registrations: Vec<TableRegistration>) {
        for registration in &registrations {
            self.tables.entry(registration.table).or_default();
        }
        self.registrations = registrations;
    }

    /// Whether a table is subscribed.
    pub fn is_registered(&self, table: TableKind) -> bool {
        self.registrations.iter().any(|r| r.table == table)
    }

    /// Sequence number of the last applied poll report.
    pub fn seqno(&self) -> u64 {
        self.seqno
    }

    /// Apply one poll report.
    pub fn apply(&mut self, report: PollReport) {
        for change in report.changes {
            match change {
                RowChange::Upsert { table, row } => self.upsert(table, row),
                RowChange::Delete { table, key } => {
                    if let Some(rows) = self.tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        self.seqno = report.seqno;
    }

    fn upsert(&mut self, table: TableKind, mut row: Row) {
        let Some(registration) = self.registrations.iter().find(|r| r.table == table) else {
            tracing::debug!(%table, key = %row.key, "dropping change for unsubscribed table");
            return;
        };
        row.fields.retain(|name, _| registration.has_column(name));
        self.tables.entry(table).or_default().insert(row.key.clone(), row);
    }

    /// The first row of a table in key order. Used for singleton tables.
    pub fn first_row(&self, table: TableKind) -> Option<&Row> {
        self.tables.get(&table).and_then(|rows| rows.values().next())
    }

    /// Look up a row by key.
    pub fn row(&self, table: TableKind, key: &str) -> Option<&Row> {
        self.tables.get(&table).and_then(|rows| rows.get(key))
    }

    /// Whether a row with this key exists.
    pub fn contains(&self, table: TableKind, key: &str) -> bool {
        self.row(table, key).is_some()
    }

    /// Iterate the current snapshot of a table.
    pub fn rows(&self, table: TableKind) -> impl Iterator<Item = &Row> {
        self.tables.get(&table).into_iter().flat_map(|rows| rows.values())
    }

    /// Number of rows currently mirrored for a table.
    pub fn len(&self, table: TableKind) -> usize {
        self.tables.get(&table).map_or(0, |rows| rows.len())
    }

    /// Whether a table has no mirrored rows.
    pub fn is_empty(&self, table: TableKind) -> bool {
        self.len(table) == 0
    }
}
