//! Shared fixtures for bridge-transport-tcp integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use bridge_protocol::{
    error_codes, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcResponse,
};
use bridge_transport_tcp::{
    Session, SessionCoordinator, SessionError, SessionFactory, Transport,
};
use bridge_types::Endpoint;

/// Answers `ping` with `"pong"`, any other request with METHOD_NOT_FOUND.
pub struct EchoSession {
    transport: Arc<dyn Transport>,
    pub notifications: Mutex<Vec<String>>,
    pub handled: AtomicUsize,
    pub send_failures: AtomicUsize,
}

impl EchoSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            notifications: Mutex::new(Vec::new()),
            handled: AtomicUsize::new(0),
            send_failures: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Session for EchoSession {
    async fn handle(&self, message: JsonRpcMessage) -> Result<(), SessionError> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        let reply: JsonRpcMessage = match message {
            JsonRpcMessage::Request(req) if req.method == "ping" => {
                JsonRpcResponse::success(req.id, json!("pong")).into()
            }
            JsonRpcMessage::Request(req) => JsonRpcErrorResponse::error(
                req.id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {}", req.method),
            )
            .into(),
            JsonRpcMessage::Notification(n) => {
                self.notifications.lock().push(n.method);
                return Ok(());
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => return Ok(()),
        };
        if let Err(e) = self.transport.send(&reply).await {
            self.send_failures.fetch_add(1, Ordering::SeqCst);
            return Err(e.into());
        }
        Ok(())
    }

    async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), SessionError> {
        let note: JsonRpcMessage = JsonRpcNotification::new(method, params).into();
        self.transport.send(&note).await.map_err(SessionError::from)
    }
}

pub fn echo_factory() -> Arc<dyn SessionFactory> {
    Arc::new(|transport: Arc<dyn Transport>| -> Arc<dyn Session> {
        Arc::new(EchoSession::new(transport))
    })
}

/// Starts a coordinator on an ephemeral loopback port.
pub async fn start_coordinator(factory: Arc<dyn SessionFactory>) -> Arc<SessionCoordinator> {
    let coordinator = Arc::new(SessionCoordinator::new(Endpoint::loopback(0), factory));
    coordinator.start().await.expect("start");
    coordinator
}

/// Line-oriented test client.
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(coordinator: &SessionCoordinator) -> Self {
        let addr = coordinator.local_addr().expect("bound");
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (r, w) = stream.into_split();
        Self {
            lines: BufReader::new(r).lines(),
            writer: w,
        }
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.expect("write");
        self.writer.write_all(b"\n").await.expect("write");
        self.writer.flush().await.expect("flush");
    }

    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write");
        self.writer.flush().await.expect("flush");
    }

    /// Next line, or `None` on EOF. Panics after five seconds.
    pub async fn recv_line(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("line within timeout")
            .expect("read")
    }

    pub async fn recv_json(&mut self) -> Value {
        let line = self.recv_line().await.expect("line");
        serde_json::from_str(&line).expect("json")
    }

    pub async fn shutdown_write(&mut self) {
        self.writer.shutdown().await.expect("shutdown");
    }
}

/// Polls `cond` until it holds; panics after five seconds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}
