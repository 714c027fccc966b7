//! Session lifecycle controller.
//!
//! A [`Session`] is the explicit context object the CLI command layer talks
//! to: it owns the replica cache, the store handle, the lock token, the
//! transaction manager and the administrative control socket for the life of
//! the process. Startup order: claim the control channel, register the
//! schema, request the lock, run the sync loop until ownership is confirmed.
//! All write-path failures collapse to booleans at this boundary; the status
//! detail is logged, not exposed, because the CLI can only retry.

pub mod sync;
pub mod txn;
pub mod validate;

use crate::admin::AdminServer;
use crate::core::config::Config;
use crate::core::error::CrossbarError;
use crate::replica::cache::ReplicaCache;
use crate::replica::row::TableKind;
use crate::replica::schema;
use crate::replica::store::{self, CommitOutcome, LockToken, Mutation, RemoteStore};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use sync::SyncOutcome;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use txn::{Transaction, TransactionManager};

/// CLI session bound to one remote store.
pub struct Session {
    store: Arc<dyn RemoteStore>,
    cache: ReplicaCache,
    txns: TransactionManager,
    /// The at-most-one write transaction staged between begin and finish.
    pending: Option<Transaction>,
    token: LockToken,
    exit_tx: watch::Sender<bool>,
    exit_rx: watch::Receiver<bool>,
    admin: Option<JoinHandle<()>>,
    control_path: PathBuf,
    exited_before_lock: bool,
}

impl Session {
    /// Initialize a session from configuration.
    ///
    /// Blocks until the write lock is confirmed or an administrative exit
    /// arrives. Failure to create the control channel is fatal.
    pub async fn initialize(config: Config) -> Result<Self> {
        let store = store::connect(&config.store)?;
        Self::with_store(config, store).await
    }

    /// Initialize a session against an injected store driver.
    pub async fn with_store(config: Config, store: Arc<dyn RemoteStore>) -> Result<Self> {
        config.validate()?;

        let control_path = PathBuf::from(config.control_socket());
        let admin_server = AdminServer::bind(&control_path)
            .context("failed to create administrative control channel")?;

        let (exit_tx, exit_rx) = watch::channel(false);
        let admin = tokio::spawn(admin_server.serve(exit_tx.clone()));

        let mut cache = ReplicaCache::new();
        cache.register(schema::default_registrations());

        let token = LockToken::for_process();
        store.request_lock(&token);

        let mut loop_exit_rx = exit_rx.clone();
        let outcome = sync::run_until_locked(store.as_ref(), &mut cache, &mut loop_exit_rx).await;
        let exited_before_lock = match outcome {
            SyncOutcome::Locked => {
                tracing::info!(
                    lock = token.name(),
                    seqno = cache.seqno(),
                    "replica cache synchronized, write lock held"
                );
                false
            }
            SyncOutcome::ExitRequested => {
                tracing::info!("exit requested before lock acquisition");
                true
            }
        };

        Ok(Self {
            store,
            cache,
            txns: TransactionManager::new(),
            pending: None,
            token,
            exit_tx,
            exit_rx,
            admin: Some(admin),
            control_path,
            exited_before_lock,
        })
    }

    /// Whether an administrative exit has been requested.
    pub fn exit_requested(&self) -> bool {
        self.exited_before_lock || *self.exit_rx.borrow()
    }

    /// Whether this process holds the write lock.
    pub fn has_lock(&self) -> bool {
        self.store.has_lock()
    }

    /// The current replica cache snapshot.
    pub fn cache(&self) -> &ReplicaCache {
        &self.cache
    }

    /// The control socket path this session is serving.
    pub fn control_path(&self) -> &std::path::Path {
        &self.control_path
    }

    /// Programmatic equivalent of the control-channel `exit` command.
    pub fn request_exit(&self) {
        let _ = self.exit_tx.send(true);
    }

    /// Run one cache refresh iteration. Store unavailability is benign.
    pub async fn refresh(&mut self) {
        let store = Arc::clone(&self.store);
        match store.poll().await {
            Ok(report) => self.cache.apply(report),
            Err(error) => tracing::debug!(%error, "refresh skipped"),
        }
    }

    /// Read one scalar field from a table's first row, refreshing the cache
    /// first so an explicit get sees the latest acknowledged state.
    pub async fn read_scalar_field(&mut self, table: TableKind, field: &str) -> Option<Value> {
        self.refresh().await;
        match self.cache.first_row(table) {
            Some(row) => row.field(field).cloned(),
            None => {
                tracing::warn!(%table, "unable to retrieve any table rows");
                None
            }
        }
    }

    /// Write one scalar field on a table's first row as a one-shot
    /// transaction.
    pub async fn write_scalar_field(
        &mut self,
        table: TableKind,
        field: &str,
        value: Value,
    ) -> Result<CommitOutcome, CrossbarError> {
        let store = Arc::clone(&self.store);
        let mut tx = self.txns.begin(store.as_ref(), &mut self.cache).await?;
        let key = match self.cache.first_row(table) {
            Some(row) => row.key.clone(),
            None => {
                self.txns.abort(store.as_ref(), tx);
                return Err(CrossbarError::NoRow {
                    table: table.as_str(),
                });
            }
        };
        tx.stage(Mutation::SetField {
            table,
            key,
            field: field.to_string(),
            value,
        });
        self.txns.commit(store.as_ref(), tx).await
    }

    /// Set the system hostname. Returns whether the write was applied.
    pub async fn set_hostname(&mut self, hostname: &str) -> bool {
        match self
            .write_scalar_field(TableKind::System, "hostname", hostname.into())
            .await
        {
            Ok(outcome) => {
                tracing::debug!(hostname, ?outcome, "hostname set in system table");
                true
            }
            Err(error) => {
                tracing::error!(%error, "unable to set hostname");
                false
            }
        }
    }

    /// Read the system hostname. Absent when no system record exists yet.
    pub async fn get_hostname(&mut self) -> Option<String> {
        match self.read_scalar_field(TableKind::System, "hostname").await {
            Some(Value::String(hostname)) => {
                tracing::debug!(hostname, "retrieved hostname from system table");
                Some(hostname)
            }
            Some(other) => {
                tracing::warn!(value = %other, "hostname field has unexpected type");
                None
            }
            None => None,
        }
    }

    /// Whether an interface with this name is currently known.
    pub fn interface_exists(&self, name: &str) -> bool {
        validate::exists_in(&self.cache, TableKind::Interface, name)
    }

    /// Whether a port with this name is currently known.
    pub fn port_exists(&self, name: &str) -> bool {
        validate::exists_in(&self.cache, TableKind::Port, name)
    }

    /// Whether a VLAN with this name is currently known.
    pub fn vlan_exists(&self, name: &str) -> bool {
        validate::exists_in(&self.cache, TableKind::Vlan, name)
    }

    /// Open the configuration transaction for this session.
    ///
    /// Returns false if one is already in flight or the store refuses the
    /// allocation.
    pub async fn begin_config(&mut self) -> bool {
        if self.pending.is_some() {
            tracing::warn!("rejecting begin: a configuration transaction is already open");
            return false;
        }
        let store = Arc::clone(&self.store);
        match self.txns.begin(store.as_ref(), &mut self.cache).await {
            Ok(tx) => {
                self.pending = Some(tx);
                true
            }
            Err(error) if error.is_fatal() => {
                tracing::error!(%error, "transaction allocation refused by store");
                debug_assert!(false, "store refused transaction allocation");
                false
            }
            Err(error) => {
                tracing::warn!(%error, "could not open configuration transaction");
                false
            }
        }
    }

    /// Stage a mutation on the open configuration transaction.
    pub fn stage(&mut self, mutation: Mutation) -> bool {
        match &mut self.pending {
            Some(tx) => {
                tx.stage(mutation);
                true
            }
            None => {
                tracing::warn!("stage without an open configuration transaction");
                false
            }
        }
    }

    /// Commit the open configuration transaction, blocking until the store
    /// acknowledges. Applied, unchanged, and incomplete all count as success.
    pub async fn finish_config(&mut self) -> bool {
        let Some(tx) = self.pending.take() else {
            tracing::warn!("finish without an open configuration transaction");
            return false;
        };
        let store = Arc::clone(&self.store);
        match self.txns.commit(store.as_ref(), tx).await {
            Ok(outcome) => {
                tracing::debug!(?outcome, "configuration committed");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "configuration commit failed");
                false
            }
        }
    }

    /// Discard the open configuration transaction, if any. Never fails.
    pub fn abort_config(&mut self) {
        if let Some(tx) = self.pending.take() {
            let store = Arc::clone(&self.store);
            self.txns.abort(store.as_ref(), tx);
        }
    }

    /// Park until an administrative exit or SIGINT arrives.
    pub async fn wait_for_exit(&mut self) {
        if self.exit_requested() {
            return;
        }
        let mut rx = self.exit_rx.clone();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("shutdown signal received (SIGINT)");
            }
            _ = async {
                while !*rx.borrow() {
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            } => {
                tracing::info!("exit requested via control socket");
            }
        }
    }

    /// Tear the session down: abort any open transaction, release the lock,
    /// stop the control socket, drop the cache.
    pub async fn shutdown(mut self) -> Result<()> {
        self.abort_config();
        self.store.release_lock();
        if let Some(admin) = self.admin.take() {
            admin.abort();
        }
        match std::fs::remove_file(&self.control_path) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(%error, path = %self.control_path.display(), "could not remove control socket");
            }
        }
        tracing::info!(lock = self.token.name(), "session closed");
        Ok(())
    }
}
