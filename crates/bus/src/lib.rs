//! Durable, subject-addressed publish/subscribe for alert traffic.
//!
//! Thin wrapper over NATS JetStream: named persistent streams, ack-awaited
//! publishes, and durable push consumers whose cursor survives restarts.

pub mod bus;
pub mod error;

pub use bus::{AlertPublisher, MessageBus, Subscription};
pub use error::BusError;

/// Re-exported delivery type so subscribers do not name the client crate.
pub use async_nats::jetstream::Message;
