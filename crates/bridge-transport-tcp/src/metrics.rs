//! Delivery metrics for the TCP transport.
//!
//! Counters are lock-free atomics so recording from any task never blocks.
//! The suppressed-failure counter is the only trace a contained response
//! failure leaves behind; external behavior does not depend on it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, thread-safe delivery counters owned by one coordinator.
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Responses written successfully.
    pub responses_sent: AtomicU64,
    /// Response sends that failed and were converted into success.
    pub suppressed_failures: AtomicU64,
    /// Broadcast notifications delivered.
    pub notifications_sent: AtomicU64,
    /// Broadcast notifications that failed or timed out.
    pub notification_failures: AtomicU64,
    /// Bridge sessions registered.
    pub sessions_opened: AtomicU64,
    /// Bridge sessions closed.
    pub sessions_closed: AtomicU64,
    /// Lines that could not be decoded.
    pub malformed_messages: AtomicU64,
}

/// A point-in-time snapshot of [`DeliveryMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Responses written successfully.
    pub responses_sent: u64,
    /// Response sends converted into success.
    pub suppressed_failures: u64,
    /// Broadcast notifications delivered.
    pub notifications_sent: u64,
    /// Broadcast notifications that failed.
    pub notification_failures: u64,
    /// Bridge sessions registered.
    pub sessions_opened: u64,
    /// Bridge sessions closed.
    pub sessions_closed: u64,
    /// Lines that could not be decoded.
    pub malformed_messages: u64,
}

impl DeliveryMetrics {
    /// Creates a new zeroed metrics instance wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records a response written to the socket.
    pub fn record_response_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a response failure that was contained.
    pub fn record_suppressed_failure(&self) {
        self.suppressed_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one broadcast.
    pub fn record_broadcast(&self, delivered: u64, failed: u64) {
        self.notifications_sent
            .fetch_add(delivered, Ordering::Relaxed);
        self.notification_failures
            .fetch_add(failed, Ordering::Relaxed);
    }

    /// Records a newly registered session.
    pub fn record_session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a session teardown.
    pub fn record_session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an undecodable line.
    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            suppressed_failures: self.suppressed_failures.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
        }
    }
}
