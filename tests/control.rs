//! Administrative control socket tests.

use crossbar::admin::AdminServer;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::watch;

async fn send_line(path: &std::path::Path, line: &str) -> String {
    let mut stream = UnixStream::connect(path).await.expect("connect");
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.write_all(b"\n").await.unwrap();

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).await.unwrap();
    reply
}

#[tokio::test]
async fn exit_gets_an_empty_ack_and_flips_the_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crossbar.ctl");
    let server = AdminServer::bind(&path).unwrap();
    let (tx, mut rx) = watch::channel(false);
    let task = tokio::spawn(server.serve(tx));

    let reply = send_line(&path, "exit").await;
    assert_eq!(reply, "\n");

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("exit flag not flipped")
        .unwrap();
    assert!(*rx.borrow());

    task.abort();
}

#[tokio::test]
async fn unknown_commands_are_refused_without_exiting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crossbar.ctl");
    let server = AdminServer::bind(&path).unwrap();
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(server.serve(tx));

    let reply = send_line(&path, "reload").await;
    assert_eq!(reply, "error: unknown command \"reload\"\n");
    assert!(!*rx.borrow());

    task.abort();
}

#[tokio::test]
async fn bind_replaces_a_stale_socket_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crossbar.ctl");

    let first = AdminServer::bind(&path).unwrap();
    drop(first);
    // The socket file is left behind; a fresh bind must reclaim it.
    assert!(path.exists());
    let second = AdminServer::bind(&path);
    assert!(second.is_ok());
}

#[tokio::test]
async fn bind_in_a_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("crossbar.ctl");
    assert!(AdminServer::bind(&path).is_err());
}
