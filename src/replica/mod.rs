//! Replica cache and remote store abstraction.
//!
//! The replica side of Crossbar mirrors a subset of the shared database's
//! tables into process memory. The [`store::RemoteStore`] trait is the seam
//! to the replication endpoint; [`cache::ReplicaCache`] holds the mirrored
//! rows; [`schema`] declares which tables and columns are subscribed.

pub mod cache;
pub mod embedded;
pub mod row;
pub mod schema;
pub mod store;
