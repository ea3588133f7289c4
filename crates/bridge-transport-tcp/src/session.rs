//! Per-connection bridge session.
//!
//! A [`BridgeSession`] pairs one [`Connection`] with the collaborator
//! [`Session`] that interprets its messages. It owns the reader task and the
//! session's entry in the coordinator's registry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use bridge_protocol::JsonRpcMessage;

use crate::connection::{Connection, Transport};
use crate::error::{SessionError, TransportError};
use crate::metrics::DeliveryMetrics;
use crate::registry::SessionRegistry;

/// Protocol logic attached to one connection.
///
/// Implementations answer requests by sending on the [`Transport`] they
/// were created with.
#[async_trait]
pub trait Session: Send + Sync {
    /// Handles one inbound message.
    async fn handle(&self, message: JsonRpcMessage) -> Result<(), SessionError>;

    /// Pushes a server-initiated notification to the peer.
    async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), SessionError>;
}

/// Creates a [`Session`] for each accepted connection.
pub trait SessionFactory: Send + Sync {
    /// Builds the session bound to `transport`.
    fn create(&self, transport: Arc<dyn Transport>) -> Arc<dyn Session>;
}

impl<F> SessionFactory for F
where
    F: Fn(Arc<dyn Transport>) -> Arc<dyn Session> + Send + Sync,
{
    fn create(&self, transport: Arc<dyn Transport>) -> Arc<dyn Session> {
        self(transport)
    }
}

/// One accepted connection and the session serving it.
pub struct BridgeSession {
    id: u64,
    connection: Arc<dyn Connection>,
    session: Arc<dyn Session>,
    registry: Weak<SessionRegistry>,
    metrics: Arc<DeliveryMetrics>,
    closed: AtomicBool,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeSession")
            .field("id", &self.id)
            .field("peer", &self.connection.peer())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl BridgeSession {
    /// Creates a session. The reader does not run until [`start`](Self::start).
    pub fn new(
        id: u64,
        connection: Arc<dyn Connection>,
        session: Arc<dyn Session>,
        registry: &Arc<SessionRegistry>,
        metrics: Arc<DeliveryMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            connection,
            session,
            registry: Arc::downgrade(registry),
            metrics,
            closed: AtomicBool::new(false),
            reader: Mutex::new(None),
        })
    }

    /// Session id, unique within its registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote address label.
    pub fn peer(&self) -> &str {
        self.connection.peer()
    }

    /// The collaborator session.
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Spawns the reader task. Calling it twice has no effect.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.reader.lock();
        if slot.is_some() || self.is_closed() {
            return;
        }
        let this = Arc::clone(self);
        *slot = Some(tokio::spawn(async move { this.read_loop().await }));
    }

    async fn read_loop(self: Arc<Self>) {
        debug!(session = self.id, peer = %self.peer(), "reader started");
        loop {
            match self.connection.receive().await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) => {
                    info!(session = self.id, peer = %self.peer(), "client disconnected");
                    break;
                }
                Err(TransportError::Codec(e)) => {
                    self.metrics.record_malformed();
                    warn!(session = self.id, peer = %self.peer(), error = %e, "malformed message, closing connection");
                    break;
                }
                Err(e) => {
                    if !self.is_closed() {
                        error!(session = self.id, peer = %self.peer(), error = %e, "read failed");
                    }
                    break;
                }
            }
        }
        self.close().await;
    }

    fn dispatch(&self, message: JsonRpcMessage) {
        let session = Arc::clone(&self.session);
        let id = self.id;
        debug!(session = id, method = ?message.method(), msg_id = ?message.id(), "dispatching message");
        tokio::spawn(async move {
            if let Err(e) = session.handle(message).await {
                warn!(session = id, error = %e, "session failed to handle message");
            }
        });
    }

    /// Closes the session. Only the first call does any work.
    pub async fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
        self.connection.close().await;
        self.metrics.record_session_closed();
        info!(session = self.id, peer = %self.peer(), "session closed");
    }

    /// Waits for the reader task to finish, aborting it after `timeout`.
    pub async fn join(&self, timeout: Duration) {
        let handle = self.reader.lock().take();
        let Some(mut handle) = handle else {
            return;
        };
        if tokio::time::timeout(timeout, &mut handle).await.is_err() {
            warn!(session = self.id, "reader did not stop in time, aborting");
            handle.abort();
        }
    }
}
