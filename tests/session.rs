//! Session lifecycle tests.

mod common;

use crossbar::replica::embedded::EmbeddedStore;
use crossbar::replica::row::{Row, TableKind};
use crossbar::replica::store::{CommitOutcome, Mutation, RemoteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

fn set_hostname_mutation(value: &str) -> Mutation {
    Mutation::SetField {
        table: TableKind::System,
        key: "system".to_string(),
        field: "hostname".to_string(),
        value: value.into(),
    }
}

// ============================================================================
// Initialization and sync loop
// ============================================================================

#[tokio::test]
async fn initialize_blocks_until_lock_is_held() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    store.set_lock_grant_delay(3);

    let (session, _rundir) = common::session_with(store.clone()).await;
    assert!(session.has_lock());
    assert!(!session.exit_requested());
}

#[tokio::test]
async fn cache_is_populated_during_initialization() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    store.seed_row(TableKind::Interface, Row::new("eth0").with_field("name", "eth0"));
    store.set_lock_grant_delay(2);

    let (session, _rundir) = common::session_with(store).await;
    assert!(session.cache().contains(TableKind::Interface, "eth0"));
    assert!(session.cache().contains(TableKind::System, "system"));
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn existence_checks_follow_the_cached_snapshot() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    store.seed_row(TableKind::Interface, Row::new("eth0").with_field("name", "eth0"));
    store.seed_row(TableKind::Port, Row::new("p1").with_field("name", "p1"));
    store.seed_row(TableKind::Vlan, Row::new("vlan10").with_field("name", "vlan10"));

    let (session, _rundir) = common::session_with(store.clone()).await;

    assert!(session.interface_exists("eth0"));
    assert!(session.port_exists("p1"));
    assert!(session.vlan_exists("vlan10"));

    assert!(!session.interface_exists("eth9"));
    assert!(!session.port_exists("vlan10"));
    assert!(!session.vlan_exists(""));
}

#[tokio::test]
async fn existence_check_sees_rows_after_a_refresh() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;
    assert!(!session.vlan_exists("vlan20"));

    store.seed_row(TableKind::Vlan, Row::new("vlan20").with_field("name", "vlan20"));
    session.refresh().await;
    assert!(session.vlan_exists("vlan20"));
}

// ============================================================================
// Hostname get/set
// ============================================================================

#[tokio::test]
async fn set_then_get_hostname_round_trips() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store).await;

    assert!(session.set_hostname("switch-a").await);
    assert_eq!(session.get_hostname().await.as_deref(), Some("switch-a"));
}

#[tokio::test]
async fn get_hostname_without_system_row_is_absent() {
    // Store with no seeded system record at all.
    let store = Arc::new(EmbeddedStore::new());
    let (mut session, _rundir) = common::session_with(store).await;

    assert_eq!(session.get_hostname().await, None);
}

#[tokio::test]
async fn set_hostname_without_system_row_reports_failure() {
    let store = Arc::new(EmbeddedStore::new());
    let (mut session, _rundir) = common::session_with(store).await;

    assert!(!session.set_hostname("switch-a").await);
}

// ============================================================================
// Configuration transactions
// ============================================================================

#[tokio::test]
async fn begin_then_abort_changes_nothing_and_frees_the_channel() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;

    assert!(session.begin_config().await);
    assert!(session.stage(set_hostname_mutation("staged-only")));
    session.abort_config();

    let row = store.row(TableKind::System, "system").unwrap();
    assert_eq!(row.field_str("hostname"), Some(""));

    // No leaked transaction: a fresh begin succeeds.
    assert!(session.begin_config().await);
    session.abort_config();
}

#[tokio::test]
async fn overlapping_begins_do_not_both_succeed() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store).await;

    assert!(session.begin_config().await);
    assert!(!session.begin_config().await);
    assert!(session.finish_config().await);
    assert!(session.begin_config().await);
    session.abort_config();
}

#[tokio::test]
async fn finish_applies_staged_mutations() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;

    assert!(session.begin_config().await);
    assert!(session.stage(set_hostname_mutation("switch-b")));
    assert!(session.finish_config().await);

    let row = store.row(TableKind::System, "system").unwrap();
    assert_eq!(row.field_str("hostname"), Some("switch-b"));
}

#[tokio::test]
async fn noop_and_incomplete_outcomes_count_as_success() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;

    // Nothing staged: the store reports Unchanged.
    assert!(session.begin_config().await);
    assert!(session.finish_config().await);

    store.force_commit_outcome(CommitOutcome::Incomplete);
    assert!(session.begin_config().await);
    assert!(session.stage(set_hostname_mutation("switch-c")));
    assert!(session.finish_config().await);
}

#[tokio::test]
async fn failed_commit_outcome_is_reported_as_false() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;

    store.force_commit_outcome(CommitOutcome::TryAgain);
    assert!(session.begin_config().await);
    assert!(session.stage(set_hostname_mutation("never-applied")));
    assert!(!session.finish_config().await);

    let row = store.row(TableKind::System, "system").unwrap();
    assert_eq!(row.field_str("hostname"), Some(""));

    // The channel is free again after the failure.
    assert!(session.begin_config().await);
    session.abort_config();
}

#[tokio::test]
async fn finish_without_begin_is_rejected() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store).await;

    assert!(!session.finish_config().await);
    assert!(!session.stage(set_hostname_mutation("nowhere")));
}

// ============================================================================
// Control channel and shutdown
// ============================================================================

#[tokio::test]
async fn exit_command_over_the_control_socket_ends_the_session() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store).await;

    let mut stream = UnixStream::connect(session.control_path())
        .await
        .expect("connect to control socket");
    stream.write_all(b"exit\n").await.unwrap();

    let mut reader = BufReader::new(stream);
    let mut ack = String::new();
    reader.read_line(&mut ack).await.unwrap();
    assert_eq!(ack, "\n");

    tokio::time::timeout(Duration::from_secs(2), session.wait_for_exit())
        .await
        .expect("session did not observe the exit command");
    assert!(session.exit_requested());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_aborts_an_open_transaction() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store.clone()).await;

    assert!(session.begin_config().await);
    assert!(session.stage(set_hostname_mutation("staged-at-exit")));
    session.shutdown().await.unwrap();

    let row = store.row(TableKind::System, "system").unwrap();
    assert_eq!(row.field_str("hostname"), Some(""));
    assert!(!store.has_lock());
}

#[tokio::test]
async fn programmatic_exit_request_is_observed() {
    let store = Arc::new(EmbeddedStore::with_bootstrap());
    let (mut session, _rundir) = common::session_with(store).await;

    session.request_exit();
    tokio::time::timeout(Duration::from_secs(2), session.wait_for_exit())
        .await
        .expect("session did not observe the exit request");
    assert!(session.exit_requested());
}
