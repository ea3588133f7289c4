//! Built-in session served by `rpc-bridge serve`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use bridge_protocol::{
    error_codes, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcResponse,
};
use bridge_transport_tcp::{Session, SessionError, SessionFactory, Transport};

/// Answers `ping` with `"pong"` and every other request with
/// `METHOD_NOT_FOUND`. Notifications and responses are ignored.
pub struct LoopbackSession {
    transport: Arc<dyn Transport>,
}

impl LoopbackSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Factory handed to the coordinator.
    pub fn factory() -> Arc<dyn SessionFactory> {
        Arc::new(|transport: Arc<dyn Transport>| -> Arc<dyn Session> {
            Arc::new(LoopbackSession::new(transport))
        })
    }
}

/// Builds the reply for one message, if it needs one.
fn reply_to(message: JsonRpcMessage) -> Option<JsonRpcMessage> {
    match message {
        JsonRpcMessage::Request(req) if req.method == "ping" => {
            Some(JsonRpcResponse::success(req.id, json!("pong")).into())
        }
        JsonRpcMessage::Request(req) => Some(
            JsonRpcErrorResponse::error(
                req.id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {}", req.method),
            )
            .into(),
        ),
        JsonRpcMessage::Notification(n) => {
            debug!(method = %n.method, "ignoring notification");
            None
        }
        JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => None,
    }
}

#[async_trait]
impl Session for LoopbackSession {
    async fn handle(&self, message: JsonRpcMessage) -> Result<(), SessionError> {
        match reply_to(message) {
            Some(reply) => Ok(self.transport.send(&reply).await?),
            None => Ok(()),
        }
    }

    async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), SessionError> {
        let note: JsonRpcMessage = JsonRpcNotification::new(method, params).into();
        Ok(self.transport.send(&note).await?)
    }
}
