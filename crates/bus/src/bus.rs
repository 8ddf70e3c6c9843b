//! JetStream connection, stream management, and durable subscriptions.

use crate::BusError;
use async_nats::jetstream::{
    self,
    consumer::{push, AckPolicy},
    stream::{RetentionPolicy, StorageType},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Streams are capped so a stalled consumer cannot grow the store unbounded.
const MAX_STREAM_BYTES: i64 = 1024 * 1024;

/// Seam the evaluator publishes through.
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;
}

fn connection_url(host: &str, port: u16, user: &str) -> Result<String, BusError> {
    if host.is_empty() {
        return Err(BusError::Config("host cannot be empty".to_string()));
    }
    if port == 0 {
        return Err(BusError::Config("port cannot be zero".to_string()));
    }
    if user.is_empty() {
        return Err(BusError::Config("user cannot be empty".to_string()));
    }
    Ok(format!("nats://{host}:{port}"))
}

/// Handle over a running push delivery task.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivery. The durable consumer's cursor survives server-side,
    /// so a later subscription under the same name resumes where this one
    /// stopped.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

/// Connection to the bus plus its JetStream context.
#[derive(Clone)]
pub struct MessageBus {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl MessageBus {
    pub async fn connect(host: &str, port: u16, user: &str) -> Result<Self, BusError> {
        let url = connection_url(host, port, user)?;
        debug!(url = %url, "connecting to message bus");

        let client = async_nats::ConnectOptions::new()
            .user_and_password(user.to_string(), String::new())
            .connect(url.as_str())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        let jetstream = jetstream::new(client.clone());

        Ok(Self { client, jetstream })
    }

    /// Create the stream if it does not exist yet. An existing stream with
    /// the same subject set is fine; a different subject set is a
    /// configuration error, not something to silently reconcile.
    pub async fn ensure_stream(&self, name: &str, subjects: &str) -> Result<(), BusError> {
        if name.is_empty() {
            return Err(BusError::Config("stream name cannot be empty".to_string()));
        }
        if subjects.is_empty() {
            return Err(BusError::Config(
                "stream subjects cannot be empty".to_string(),
            ));
        }

        match self.jetstream.get_stream(name).await {
            Ok(stream) => {
                if stream.cached_info().config.subjects != vec![subjects.to_string()] {
                    return Err(BusError::StreamConflict(name.to_string()));
                }
                debug!(name, "stream already exists");
                Ok(())
            }
            Err(_) => {
                self.jetstream
                    .create_stream(jetstream::stream::Config {
                        name: name.to_string(),
                        subjects: vec![subjects.to_string()],
                        retention: RetentionPolicy::Interest,
                        storage: StorageType::File,
                        max_bytes: MAX_STREAM_BYTES,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| BusError::Transport(e.to_string()))?;
                debug!(name, subjects, "stream created");
                Ok(())
            }
        }
    }

    /// Publish onto the stream owning `subject` and wait for the
    /// persistence ack.
    pub async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let ack = self
            .jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        ack.await.map_err(|e| BusError::Transport(e.to_string()))?;
        debug!(subject, "message published");
        Ok(())
    }

    /// Register a durable push consumer with manual acks and feed every
    /// delivery to `handler` on a dedicated task. The same `durable` name
    /// across restarts resumes from the last acknowledged offset.
    pub async fn push_subscribe<F, Fut>(
        &self,
        durable: &str,
        stream: &str,
        subject: &str,
        handler: F,
    ) -> Result<Subscription, BusError>
    where
        F: Fn(jetstream::Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stream = self
            .jetstream
            .get_stream(stream)
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        let consumer = stream
            .create_consumer(push::Config {
                durable_name: Some(durable.to_string()),
                deliver_subject: self.client.new_inbox(),
                filter_subject: subject.to_string(),
                ack_policy: AckPolicy::Explicit,
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        debug!(durable, subject, "durable subscription established");

        let durable = durable.to_string();
        let task = tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                match message {
                    Ok(message) => handler(message).await,
                    Err(e) => warn!(consumer = %durable, error = %e, "delivery stream error"),
                }
            }
            debug!(consumer = %durable, "delivery stream closed");
        });

        Ok(Subscription { task })
    }

    /// Tear down the connection. In-flight deliveries end with it.
    pub async fn close(&self) {
        if let Err(e) = self.client.drain().await {
            warn!(error = %e, "failed to drain bus connection");
        }
        debug!("message bus connection closed");
    }
}

#[async_trait]
impl AlertPublisher for MessageBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        MessageBus::publish(self, subject, payload).await
    }
}
