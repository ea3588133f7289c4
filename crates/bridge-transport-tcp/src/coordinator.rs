//! TCP listener that turns accepted sockets into bridge sessions.
//!
//! The coordinator owns one accept task, the registry of live sessions and
//! the delivery metrics. It can broadcast a notification to every live
//! session and shuts everything down in a bounded amount of time.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bridge_types::Endpoint;

use crate::connection::{Connection, TcpConnection, Transport};
use crate::error::TransportError;
use crate::metrics::DeliveryMetrics;
use crate::registry::SessionRegistry;
use crate::resilient::ResilientTransport;
use crate::session::{BridgeSession, SessionFactory};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Lifecycle of a [`SessionCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Not listening.
    Stopped,
    /// Binding the listener.
    Starting,
    /// Accepting connections.
    Running,
    /// Tearing down sessions.
    Stopping,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Timeouts applied during broadcast and shutdown.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// How long shutdown waits for the accept task.
    pub accept_join_timeout: Duration,
    /// How long shutdown waits for each session's reader.
    pub session_close_timeout: Duration,
    /// Per-recipient bound on a broadcast send.
    pub notify_timeout: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            accept_join_timeout: Duration::from_secs(5),
            session_close_timeout: Duration::from_secs(2),
            notify_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared pieces an accept worker needs, cloned into each task.
#[derive(Clone)]
struct AcceptContext {
    factory: Arc<dyn SessionFactory>,
    registry: Arc<SessionRegistry>,
    metrics: Arc<DeliveryMetrics>,
    shutdown: CancellationToken,
}

/// Listens on one endpoint and manages a session per connection.
pub struct SessionCoordinator {
    endpoint: Endpoint,
    factory: Arc<dyn SessionFactory>,
    options: CoordinatorOptions,
    registry: Arc<SessionRegistry>,
    metrics: Arc<DeliveryMetrics>,
    state: Mutex<CoordinatorState>,
    local_addr: Mutex<Option<SocketAddr>>,
    shutdown: Mutex<CancellationToken>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionCoordinator {
    /// Creates a stopped coordinator for `endpoint`.
    pub fn new(endpoint: Endpoint, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            endpoint,
            factory,
            options: CoordinatorOptions::default(),
            registry: Arc::new(SessionRegistry::new()),
            metrics: DeliveryMetrics::new_shared(),
            state: Mutex::new(CoordinatorState::Stopped),
            local_addr: Mutex::new(None),
            shutdown: Mutex::new(CancellationToken::new()),
            accept_task: Mutex::new(None),
        }
    }

    /// Replaces the default timeouts.
    pub fn with_options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Delivery counters.
    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    fn transition(&self, from: CoordinatorState, to: CoordinatorState) -> bool {
        let mut state = self.state.lock();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    /// Binds the listener and starts accepting connections.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidState`] if the coordinator is not stopped.
    /// - [`TransportError::Bind`] if the address cannot be bound.
    pub async fn start(&self) -> Result<SocketAddr, TransportError> {
        if !self.transition(CoordinatorState::Stopped, CoordinatorState::Starting) {
            return Err(TransportError::InvalidState(format!(
                "cannot start while {}",
                self.state()
            )));
        }

        let listener = match TcpListener::bind(self.endpoint.as_socket_pair()).await {
            Ok(listener) => listener,
            Err(source) => {
                *self.state.lock() = CoordinatorState::Stopped;
                error!(endpoint = %self.endpoint, error = %source, "failed to bind listener");
                return Err(TransportError::Bind {
                    addr: self.endpoint.to_string(),
                    source,
                });
            }
        };
        let addr = listener.local_addr().map_err(|source| {
            *self.state.lock() = CoordinatorState::Stopped;
            TransportError::Bind {
                addr: self.endpoint.to_string(),
                source,
            }
        })?;

        let token = CancellationToken::new();
        *self.shutdown.lock() = token.clone();
        let ctx = AcceptContext {
            factory: Arc::clone(&self.factory),
            registry: Arc::clone(&self.registry),
            metrics: Arc::clone(&self.metrics),
            shutdown: token,
        };
        *self.accept_task.lock() = Some(tokio::spawn(accept_loop(listener, ctx)));
        *self.local_addr.lock() = Some(addr);
        *self.state.lock() = CoordinatorState::Running;

        info!(addr = %addr, "bridge listener started");
        Ok(addr)
    }

    /// Sends a notification to every live session.
    ///
    /// Recipients are sent to concurrently, each bounded by the notify
    /// timeout. Failures are logged and counted, never returned. Returns the
    /// number of sessions that accepted the notification.
    pub async fn notify_all(&self, method: &str, params: Option<Value>) -> usize {
        let recipients: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|s| !s.is_closed())
            .collect();
        if recipients.is_empty() {
            debug!(method, "no sessions to notify");
            return 0;
        }

        let timeout = self.options.notify_timeout;
        let sends = recipients.iter().map(|bridge| {
            let params = params.clone();
            async move {
                match tokio::time::timeout(
                    timeout,
                    bridge.session().send_notification(method, params),
                )
                .await
                {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        warn!(session = bridge.id(), peer = %bridge.peer(), error = %e, "notification failed");
                        false
                    }
                    Err(_) => {
                        warn!(session = bridge.id(), peer = %bridge.peer(), "notification timed out");
                        false
                    }
                }
            }
        });

        let results = join_all(sends).await;
        let delivered = results.iter().filter(|ok| **ok).count();
        let failed = results.len() - delivered;
        self.metrics.record_broadcast(delivered as u64, failed as u64);
        debug!(method, delivered, failed, "broadcast complete");
        delivered
    }

    /// Stops accepting and closes every session. No-op unless running.
    pub async fn shutdown(&self) {
        if !self.transition(CoordinatorState::Running, CoordinatorState::Stopping) {
            debug!(state = %self.state(), "shutdown ignored");
            return;
        }
        info!("shutting down bridge listener");

        self.shutdown.lock().cancel();

        let accept = self.accept_task.lock().take();
        if let Some(mut handle) = accept {
            if tokio::time::timeout(self.options.accept_join_timeout, &mut handle)
                .await
                .is_err()
            {
                warn!("accept loop did not stop in time, aborting");
                handle.abort();
            }
        }

        let sessions = self.registry.snapshot();
        let close_timeout = self.options.session_close_timeout;
        join_all(sessions.iter().map(|bridge| async move {
            if tokio::time::timeout(close_timeout, bridge.close())
                .await
                .is_err()
            {
                warn!(session = bridge.id(), "session close timed out");
            }
            bridge.join(close_timeout).await;
        }))
        .await;

        *self.local_addr.lock() = None;
        *self.state.lock() = CoordinatorState::Stopped;
        info!(closed = sessions.len(), "bridge listener stopped");
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shutdown.lock().cancel();
    }
}

async fn accept_loop(listener: TcpListener, ctx: AcceptContext) {
    loop {
        tokio::select! {
            biased;
            () = ctx.shutdown.cancelled() => {
                debug!("accept loop cancelled");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!(peer = %peer, "accepted connection");
                    tokio::spawn(register_connection(stream, ctx.clone()));
                }
                Err(e) => {
                    if ctx.shutdown.is_cancelled() {
                        break;
                    }
                    error!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
}

async fn register_connection(stream: TcpStream, ctx: AcceptContext) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }

    let connection = Arc::new(TcpConnection::from_tcp(stream));
    let transport: Arc<dyn Transport> = Arc::new(ResilientTransport::new(
        Arc::clone(&connection) as Arc<dyn Transport>,
        Arc::clone(&ctx.metrics),
    ));
    let session = ctx.factory.create(transport);

    let bridge = BridgeSession::new(
        ctx.registry.next_id(),
        connection as Arc<dyn Connection>,
        session,
        &ctx.registry,
        Arc::clone(&ctx.metrics),
    );
    ctx.registry.insert(Arc::clone(&bridge));
    ctx.metrics.record_session_opened();

    if ctx.shutdown.is_cancelled() {
        debug!(session = bridge.id(), "coordinator stopping, closing new session");
        bridge.close().await;
        return;
    }

    debug!(session = bridge.id(), peer = %bridge.peer(), "session registered");
    bridge.start();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let o = CoordinatorOptions::default();
        assert_eq!(o.accept_join_timeout, Duration::from_secs(5));
        assert_eq!(o.session_close_timeout, Duration::from_secs(2));
        assert_eq!(o.notify_timeout, Duration::from_secs(5));
    }

    #[test]
    fn state_display() {
        assert_eq!(CoordinatorState::Stopping.to_string(), "stopping");
        assert_eq!(CoordinatorState::Running.to_string(), "running");
    }
}
