//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use matchtoken::{GateConfig, HttpServer, MatcherRegistry, Shutdown};

/// Start an upstream that echoes the request line and `Host` header.
///
/// Returns its address and a counter of requests served.
pub async fn start_echo_upstream() -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut lines = BufReader::new(read).lines();
                let mut request_line = String::new();
                let mut host = String::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.is_empty() {
                        break;
                    }
                    if request_line.is_empty() {
                        request_line = line;
                    } else if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("host") {
                            host = value.trim().to_string();
                        }
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let body = format!("{request_line}\nhost={host}");
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = write.write_all(response.as_bytes()).await;
                let _ = write.shutdown().await;
            });
        }
    });

    (addr, hits)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running gate: its address, the reload channel and the shutdown handle.
pub struct RunningGate {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<GateConfig>,
    pub shutdown: Shutdown,
}

pub async fn start_gate(config: GateConfig) -> RunningGate {
    let server = HttpServer::new(config, Arc::new(MatcherRegistry::with_defaults())).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningGate {
        addr,
        updates,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
