//! TCP transport for newline-delimited JSON-RPC.
//!
//! A [`SessionCoordinator`] listens on an [`Endpoint`](bridge_types::Endpoint),
//! gives every accepted socket its own [`ConnectionTransport`], asks the
//! embedding application's [`SessionFactory`] for a [`Session`], and keeps the
//! resulting [`BridgeSession`] in a [`SessionRegistry`] until either side
//! hangs up. Outbound responses always go through a [`ResilientTransport`].

pub mod connection;
pub mod coordinator;
mod error;
pub mod metrics;
pub mod registry;
pub mod resilient;
pub mod session;

pub use connection::{Connection, ConnectionTransport, TcpConnection, Transport};
pub use coordinator::{CoordinatorOptions, CoordinatorState, SessionCoordinator};
pub use error::{SessionError, TransportError};
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use registry::SessionRegistry;
pub use resilient::ResilientTransport;
pub use session::{BridgeSession, Session, SessionFactory};
