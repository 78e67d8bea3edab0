//! Domain-event publication to a durable stream.

use async_trait::async_trait;
use bytes::Bytes;

pub mod nats;

pub use nats::NatsEventPublisher;

/// Errors from the event broker.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event broker connection failed: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to publish event to '{subject}': {source}")]
    Publish {
        subject: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to set up subscription for '{subject}': {source}")]
    Subscribe {
        subject: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Broker-facing publication interface.
///
/// Implementations must be safe for concurrent `publish` calls from
/// request workers. `subscribe` is called once at process start; the
/// consumer loop it spawns never runs on the request path.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event payload to a subject. A transport failure is an
    /// error the caller may treat as non-fatal.
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), EventError>;

    /// Ensure the durable stream and consumer for a subject exist and
    /// start the long-lived consumption loop in the background.
    async fn subscribe(&self, subject: &str) -> Result<(), EventError>;
}
