//! Delivery wrapper that keeps a failed response from tearing down a session.
//!
//! A request handler that times out or finds its peer gone still needs its
//! response send to look successful to the caller, otherwise the session
//! layer treats the error as fatal. Only responses get this treatment.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, trace};

use bridge_protocol::JsonRpcMessage;

use crate::connection::Transport;
use crate::error::TransportError;
use crate::metrics::DeliveryMetrics;

/// Wraps a [`Transport`] and swallows failed response deliveries.
pub struct ResilientTransport {
    inner: Arc<dyn Transport>,
    metrics: Arc<DeliveryMetrics>,
}

impl ResilientTransport {
    /// Wraps `inner`, recording contained failures in `metrics`.
    pub fn new(inner: Arc<dyn Transport>, metrics: Arc<DeliveryMetrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl Transport for ResilientTransport {
    async fn send(&self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        let result = self.inner.send(message).await;
        if !message.is_response() {
            return result;
        }

        match result {
            Ok(()) => {
                self.metrics.record_response_sent();
                Ok(())
            }
            Err(e) => {
                error!(
                    peer = %self.inner.peer(),
                    id = ?message.id(),
                    error = %e,
                    "failed to deliver response, suppressing"
                );
                self.metrics.record_suppressed_failure();
                Ok(())
            }
        }
    }

    async fn close(&self) {
        trace!(peer = %self.inner.peer(), "close via resilient wrapper");
        self.inner.close().await;
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn peer(&self) -> &str {
        self.inner.peer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use bridge_protocol::{
        error_codes, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
        RequestId,
    };
    use serde_json::json;

    /// Transport whose sends always fail once `failing` is set.
    #[derive(Default)]
    struct FlakyTransport {
        failing: AtomicBool,
        sends: AtomicUsize,
        closed: AtomicBool,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn send(&self, _message: &JsonRpcMessage) -> Result<(), TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(TransportError::Write("broken pipe".into()))
            } else {
                Ok(())
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        fn peer(&self) -> &str {
            "flaky"
        }
    }

    fn wrap(failing: bool) -> (Arc<FlakyTransport>, Arc<DeliveryMetrics>, ResilientTransport) {
        let inner = Arc::new(FlakyTransport::default());
        inner.failing.store(failing, Ordering::SeqCst);
        let metrics = DeliveryMetrics::new_shared();
        let wrapper = ResilientTransport::new(inner.clone(), Arc::clone(&metrics));
        (inner, metrics, wrapper)
    }

    #[tokio::test]
    async fn failed_response_reports_success() {
        let (inner, metrics, wrapper) = wrap(true);
        let msg: JsonRpcMessage = JsonRpcResponse::success(RequestId::from(1_i64), json!("pong")).into();

        assert!(wrapper.send(&msg).await.is_ok());
        assert_eq!(inner.sends.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().suppressed_failures, 1);
        assert_eq!(metrics.snapshot().responses_sent, 0);
    }

    #[tokio::test]
    async fn failed_error_response_reports_success() {
        let (_inner, metrics, wrapper) = wrap(true);
        let msg: JsonRpcMessage =
            JsonRpcErrorResponse::error(RequestId::from(2_i64), error_codes::INTERNAL_ERROR, "boom")
                .into();

        assert!(wrapper.send(&msg).await.is_ok());
        assert_eq!(metrics.snapshot().suppressed_failures, 1);
    }

    #[tokio::test]
    async fn failed_request_propagates() {
        let (_inner, metrics, wrapper) = wrap(true);
        let msg: JsonRpcMessage = JsonRpcRequest::new(RequestId::from(3_i64), "ping", None).into();

        assert!(matches!(
            wrapper.send(&msg).await,
            Err(TransportError::Write(_))
        ));
        assert_eq!(metrics.snapshot().suppressed_failures, 0);
    }

    #[tokio::test]
    async fn failed_notification_propagates() {
        let (_inner, _metrics, wrapper) = wrap(true);
        let msg: JsonRpcMessage = JsonRpcNotification::new("tick", None).into();
        assert!(wrapper.send(&msg).await.is_err());
    }

    #[tokio::test]
    async fn successful_response_is_counted() {
        let (_inner, metrics, wrapper) = wrap(false);
        let msg: JsonRpcMessage = JsonRpcResponse::success(RequestId::from(4_i64), json!({})).into();

        wrapper.send(&msg).await.expect("send");
        assert_eq!(metrics.snapshot().responses_sent, 1);
        assert_eq!(metrics.snapshot().suppressed_failures, 0);
    }

    #[tokio::test]
    async fn close_and_state_delegate() {
        let (inner, _metrics, wrapper) = wrap(false);
        assert!(!wrapper.is_closed());
        wrapper.close().await;
        assert!(inner.is_closed());
        assert!(wrapper.is_closed());
        assert_eq!(wrapper.peer(), "flaky");
    }
}
