//! Administrative control socket.
//!
//! A Unix-domain socket accepting line-delimited commands from operators and
//! supervisors. The only command is `exit`: it receives an empty
//! acknowledgment line and flips the session's exit flag. Unknown commands
//! get an error reply and leave the session alone.
//!
//! Failure to create the socket is a fatal startup error; the binary exits
//! non-zero. Everything after bind is reported through logs.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;

/// Control socket server.
pub struct AdminServer {
    listener: UnixListener,
    path: PathBuf,
}

impl AdminServer {
    /// Bind the control socket, replacing a stale socket file if present.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale control socket"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("failed to remove stale control socket {}", path.display())
                });
            }
        }
        let listener = UnixListener::bind(&path)
            .with_context(|| format!("failed to bind control socket {}", path.display()))?;
        tracing::info!(path = %path.display(), "control socket ready");
        Ok(Self { listener, path })
    }

    /// The bound socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept and serve control connections until the task is stopped.
    pub async fn serve(self, exit_tx: watch::Sender<bool>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    if let Err(error) = handle_connection(stream, &exit_tx).await {
                        tracing::debug!(%error, "control connection ended with error");
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "control socket accept failed");
                }
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    exit_tx: &watch::Sender<bool>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "exit" => {
                // Empty acknowledgment, then flip the exit flag.
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                tracing::info!("exit command received on control socket");
                let _ = exit_tx.send(true);
            }
            other => {
                let reply = format!("error: unknown command {other:?}\n");
                writer.write_all(reply.as_bytes()).await?;
                writer.flush().await?;
            }
        }
    }
    Ok(())
}
