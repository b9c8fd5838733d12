use lapin::{
    options::{
        BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
    BasicProperties, Channel, Consumer as LapinConsumer, ExchangeKind,
};
use serde::Serialize;

use super::rabbit::Pool;
use super::topology::{dead_letter_exchange, dead_letter_queue};

// ── Error ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ChannelError {
    Connection(String),
    Channel(String),
    /// Exchange/queue declaration or binding failed. Redeclaring an existing
    /// queue with different arguments (e.g. changed dead-letter settings)
    /// lands here — the broker refuses the declaration.
    Topology(String),
    Serialize(String),
    Publish(String),
    Qos(String),
    Start(String),
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(m) => write!(f, "channel connection error: {m}"),
            Self::Channel(m) => write!(f, "channel open error: {m}"),
            Self::Topology(m) => write!(f, "topology declaration failed: {m}"),
            Self::Serialize(m) => write!(f, "payload serialization failed: {m}"),
            Self::Publish(m) => write!(f, "publish failed: {m}"),
            Self::Qos(m) => write!(f, "QoS setup failed: {m}"),
            Self::Start(m) => write!(f, "failed to start consuming: {m}"),
        }
    }
}

impl std::error::Error for ChannelError {}

// ── MessageChannel ─────────────────────────────────────────────────────────────

/// Thin wrapper over one AMQP channel: all broker I/O of the pipeline goes
/// through here, so producers and the consumer runtime never touch lapin
/// options directly.
///
/// Cloning is cheap (Arc increment on the channel); the channel also keeps
/// the parent connection alive, lapin being Arc-backed.
#[derive(Clone)]
pub struct MessageChannel {
    channel: Channel,
}

impl MessageChannel {
    /// Check a connection out of `pool` and open a fresh channel on it.
    pub async fn open(pool: &Pool) -> Result<Self, ChannelError> {
        let conn = pool
            .get()
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        let channel = conn
            .create_channel()
            .await
            .map_err(|e| ChannelError::Channel(e.to_string()))?;

        // conn (pool Object) drops here; the channel's internal Arc keeps the
        // underlying TCP connection alive for the channel's lifetime.

        Ok(Self { channel })
    }

    /// Serialize `payload` as JSON and publish it persistently.
    pub async fn publish<T: Serialize>(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &T,
    ) -> Result<(), ChannelError> {
        let body =
            serde_json::to_vec(payload).map_err(|e| ChannelError::Serialize(e.to_string()))?;

        let props = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2); // persistent

        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                props,
            )
            .await
            .map_err(|e| ChannelError::Publish(e.to_string()))?;

        tracing::debug!(exchange, routing_key, bytes = body.len(), "published");
        Ok(())
    }

    /// Declare the dead-letter companion topology for `queue`:
    /// a direct exchange and a durable queue, both named
    /// `<queue>.dead_letter`, bound under the primary queue's name.
    ///
    /// Returns the argument table (`x-dead-letter-exchange`) the **primary**
    /// queue must be declared with. Call this before [`bind_queue`] — the
    /// argument is immutable once the primary queue exists.
    ///
    /// [`bind_queue`]: Self::bind_queue
    pub async fn declare_dead_letter_topology(
        &self,
        queue: &str,
    ) -> Result<FieldTable, ChannelError> {
        let dl_exchange = dead_letter_exchange(queue);
        let dl_queue = dead_letter_queue(queue);

        self.channel
            .exchange_declare(
                &dl_exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ChannelError::Topology(format!("exchange '{dl_exchange}': {e}")))?;

        self.channel
            .queue_declare(
                &dl_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ChannelError::Topology(format!("queue '{dl_queue}': {e}")))?;

        // Rejected messages keep their original routing key, so the binding
        // uses the primary queue's name.
        self.channel
            .queue_bind(
                &dl_queue,
                &dl_exchange,
                queue,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                ChannelError::Topology(format!("bind '{dl_queue}' → '{dl_exchange}': {e}"))
            })?;

        let mut arguments = FieldTable::default();
        arguments.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString(dl_exchange.as_bytes().to_vec().into()),
        );

        tracing::debug!(queue, dl_exchange = %dl_exchange, "dead-letter topology declared");
        Ok(arguments)
    }

    /// Declare the topic exchange and a durable queue with `arguments`, then
    /// bind them under `routing_key`. Idempotent as long as the arguments
    /// match what the queue was first declared with.
    pub async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        arguments: FieldTable,
    ) -> Result<(), ChannelError> {
        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ChannelError::Topology(format!("exchange '{exchange}': {e}")))?;

        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                arguments,
            )
            .await
            .map_err(|e| ChannelError::Topology(format!("queue '{queue}': {e}")))?;

        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                ChannelError::Topology(format!(
                    "bind '{queue}' → '{exchange}' via '{routing_key}': {e}"
                ))
            })?;

        Ok(())
    }

    /// Cap unacknowledged deliveries on this channel.
    pub async fn set_prefetch(&self, prefetch: u16) -> Result<(), ChannelError> {
        self.channel
            .basic_qos(prefetch, BasicQosOptions { global: false })
            .await
            .map_err(|e| ChannelError::Qos(e.to_string()))
    }

    /// Register a consumer on `queue` with manual acknowledgement.
    pub async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<LapinConsumer, ChannelError> {
        self.channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ChannelError::Start(e.to_string()))
    }

    /// Close the channel explicitly. Used on shutdown paths so the broker
    /// sees a clean close rather than a dropped connection.
    pub async fn close(&self) -> Result<(), ChannelError> {
        self.channel
            .close(200, "bye")
            .await
            .map_err(|e| ChannelError::Channel(e.to_string()))
    }
}
