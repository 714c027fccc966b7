//! Common test utilities.
//!
//! Shared helpers for integration tests. Import with `mod common;`.

use crossbar::core::config::Config;
use crossbar::replica::embedded::EmbeddedStore;
use crossbar::replica::store::RemoteStore;
use crossbar::session::Session;
use std::sync::Arc;
use tempfile::TempDir;

/// Build a config whose rundir (and therefore control socket) lives in a
/// temporary directory.
pub fn test_config(rundir: &TempDir) -> Config {
    let mut config = Config::default();
    config.store.rundir = rundir.path().to_string_lossy().into_owned();
    config
}

/// Initialize a session against an injected embedded store.
///
/// Returns the rundir guard alongside the session; dropping it removes the
/// control socket directory.
pub async fn session_with(store: Arc<EmbeddedStore>) -> (Session, TempDir) {
    let rundir = TempDir::new().expect("failed to create test rundir");
    let config = test_config(&rundir);
    let store: Arc<dyn RemoteStore> = store;
    let session = Session::with_store(config, store)
        .await
        .expect("session initialization failed");
    (session, rundir)
}
