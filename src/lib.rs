//! Crossbar - synchronization bridge between a CLI session and a replicated
//! configuration database.
//!
//! Crossbar keeps a process-local read cache of a subset of a shared
//! database's tables in sync with a remote store, arbitrates single-writer
//! access via a distributed lock, and provides a transaction lifecycle so a
//! batch of CLI-driven configuration edits can be committed atomically.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CLI command layer                       │
//! │        (grammar and parsing live outside this crate)        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Session                            │
//! │   lifecycle │ transactions │ validation │ scalar get/set    │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                          │
//! ┌────────────────────────────┐  ┌───────────────────────────┐
//! │        Replica Cache       │  │    Admin control socket   │
//! │  (table, key) → Row mirror │  │     line commands: exit   │
//! └────────────────────────────┘  └───────────────────────────┘
//!                  │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RemoteStore trait                       │
//! │   poll │ changed │ lock │ open_txn │ commit │ discard_txn   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error types
//! - [`core::pattern`] - Regular-expression helper for the command layer
//! - [`replica::cache`] - Process-local replica cache
//! - [`replica::store`] - Remote store abstraction and commit outcomes
//! - [`replica::embedded`] - In-process store for embedded mode and tests
//! - [`replica::schema`] - Table and column registration
//! - [`session`] - Session lifecycle controller
//! - [`session::sync`] - Lock-acquisition sync loop
//! - [`session::txn`] - Transaction staging and flush
//! - [`session::validate`] - Read-side existence checks
//! - [`admin`] - Administrative control socket
//! - [`cli`] - Command-line entrypoints
//!
//! # Key Invariants
//!
//! - Reads against the cache always see the latest locally-applied snapshot,
//!   never a partially-updated row.
//! - The sync loop only reports lock ownership once the store confirms it.
//! - At most one write transaction is in flight per session at a time.
//! - A transaction never outlives the CLI command that created it.

// Core infrastructure
pub mod core;

// Replica cache and remote store abstraction
pub mod replica;

// Session lifecycle, transactions, validation
pub mod session;

// Administrative control socket
pub mod admin;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, pattern};
pub use admin::AdminServer;
pub use replica::{cache::ReplicaCache, embedded::EmbeddedStore, store::RemoteStore};
pub use session::{sync, txn, validate, Session};
