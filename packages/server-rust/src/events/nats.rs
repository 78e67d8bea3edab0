//! NATS JetStream implementation of [`EventPublisher`].
//!
//! Publication goes through the core client (fire-and-forget from the
//! producer's side); durability comes from the JetStream stream that
//! captures the subject. Stream and consumer provisioning is
//! create-or-update, so repeated startups converge on the same
//! configuration.

use async_nats::jetstream;
use async_nats::jetstream::consumer::pull;
use async_nats::jetstream::consumer::{AckPolicy, ReplayPolicy};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use super::{EventError, EventPublisher};

/// Durable consumer name bound to the registration stream.
const DURABLE_CONSUMER: &str = "gatekey_registration";

/// Event publisher backed by a NATS connection with JetStream enabled.
///
/// The client is internally synchronized; one instance is shared across
/// request workers behind an `Arc`.
pub struct NatsEventPublisher {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl NatsEventPublisher {
    /// Connects to the broker and opens a JetStream context.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Connect`] if the broker is unreachable.
    pub async fn connect(url: &str) -> Result<Self, EventError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| EventError::Connect(Box::new(e)))?;
        let jetstream = jetstream::new(client.clone());
        tracing::debug!(%url, "connected to event broker");
        Ok(Self { client, jetstream })
    }

    /// Flushes buffered publishes before shutdown.
    pub async fn close(&self) {
        if let Err(err) = self.client.flush().await {
            tracing::warn!(error = %err, "failed to flush event broker connection");
        }
    }
}

/// Derives a stream name from a subject. Stream names may not contain
/// dots or wildcards, so those become underscores.
fn stream_name(subject: &str) -> String {
    subject
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), EventError> {
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| EventError::Publish {
                subject: subject.to_string(),
                source: Box::new(e),
            })
    }

    async fn subscribe(&self, subject: &str) -> Result<(), EventError> {
        let subscribe_err = |e: Box<dyn std::error::Error + Send + Sync>| EventError::Subscribe {
            subject: subject.to_string(),
            source: e,
        };

        let stream = self
            .jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: stream_name(subject),
                subjects: vec![subject.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| subscribe_err(Box::new(e)))?;
        tracing::debug!(stream = %stream_name(subject), "event stream ready");

        let consumer = stream
            .get_or_create_consumer(
                DURABLE_CONSUMER,
                pull::Config {
                    durable_name: Some(DURABLE_CONSUMER.to_string()),
                    filter_subject: subject.to_string(),
                    ack_policy: AckPolicy::Explicit,
                    replay_policy: ReplayPolicy::Instant,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| subscribe_err(Box::new(e)))?;
        tracing::debug!(consumer = DURABLE_CONSUMER, "durable consumer ready");

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| subscribe_err(Box::new(e)))?;

        let subject = subject.to_string();
        tokio::spawn(async move {
            while let Some(next) = messages.next().await {
                match next {
                    Ok(message) => {
                        tracing::debug!(
                            subject = %message.subject,
                            payload_len = message.payload.len(),
                            "received event"
                        );
                        // A failed ack means redelivery, not a dead loop.
                        if let Err(err) = message.ack().await {
                            tracing::error!(
                                subject = %subject,
                                error = %err,
                                "failed to acknowledge event"
                            );
                        }
                    }
                    Err(err) => {
                        tracing::error!(subject = %subject, error = %err, "event stream error");
                    }
                }
            }
            tracing::warn!(subject = %subject, "event consumer loop ended");
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_name_replaces_separators_and_uppercases() {
        assert_eq!(stream_name("user.registered"), "USER_REGISTERED");
        assert_eq!(stream_name("orders.*"), "ORDERS__");
        assert_eq!(stream_name("plain"), "PLAIN");
    }
}
