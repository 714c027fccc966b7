//! Read-side existence checks.
//!
//! Answers whether a user-supplied identifier names a currently-known entity
//! in one of the mirrored tables. A linear scan over the in-memory snapshot
//! is fine here: the tables are small and lookups are interactive. The scan
//! borrows the cache immutably, so no sync can mutate it mid-iteration, and
//! it never triggers a fresh poll.

use crate::replica::cache::ReplicaCache;
use crate::replica::row::TableKind;

/// Whether the cache currently contains a row of `table` keyed `name`.
///
/// An empty name is "not found", not an error.
pub fn exists_in(cache: &ReplicaCache, table: TableKind, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    cache.rows(table).any(|row| row.key == name)
}
