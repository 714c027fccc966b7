//! Lock-acquisition sync loop.
//!
//! After startup the cache is not authoritative for writes until the store
//! grants this process's lock. The loop polls the store, applies whatever
//! changes have arrived (reads work before ownership), and then waits on the
//! two event sources at once: a new remote revision or control-channel
//! activity. Both are serviced on every wake; ordering between them is not
//! guaranteed. An unreachable store is retried indefinitely.

use crate::replica::cache::ReplicaCache;
use crate::replica::store::RemoteStore;
use tokio::sync::watch;

/// Why the sync loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store confirmed this process's write lock.
    Locked,
    /// An administrative exit arrived before the lock was granted.
    ExitRequested,
}

/// Pump replica updates until the write lock is held or an exit is
/// requested. Cooperative: runs on the calling task, no worker is spawned.
pub async fn run_until_locked(
    store: &dyn RemoteStore,
    cache: &mut ReplicaCache,
    exit: &mut watch::Receiver<bool>,
) -> SyncOutcome {
    while !store.has_lock() {
        match store.poll().await {
            Ok(report) => cache.apply(report),
            Err(error) if error.is_retriable() => {
                tracing::debug!(%error, "store unreachable, retrying");
            }
            Err(error) => {
                tracing::warn!(%error, "poll failed, retrying");
            }
        }

        if *exit.borrow() {
            return SyncOutcome::ExitRequested;
        }
        if store.has_lock() {
            break;
        }

        tokio::select! {
            _ = store.changed() => {}
            changed = exit.changed() => {
                if changed.is_err() || *exit.borrow() {
                    return SyncOutcome::ExitRequested;
                }
            }
        }
    }
    SyncOutcome::Locked
}
