use std::sync::Arc;

use futures_util::StreamExt;
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
    types::FieldTable,
};

use crate::messaging::topology::DEFAULT_EXCHANGE;
use crate::messaging::{ChannelError, MessageChannel};
use crate::metrics::Metrics;
use crate::shutdown::ShutdownSignal;

use super::{Consumer, Outcome};

// ── Error ──────────────────────────────────────────────────────────────────────

/// Startup/transport failures of the consumer runtime. All of these are
/// fatal to the owning process; the supervisor restarts it.
#[derive(Debug)]
pub enum ConsumerError {
    Channel(ChannelError),
}

impl std::fmt::Display for ConsumerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "consumer runtime: {e}"),
        }
    }
}

impl std::error::Error for ConsumerError {}

impl From<ChannelError> for ConsumerError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

// ── Runtime ────────────────────────────────────────────────────────────────────

/// Lifecycle shared by every consumer: queue and dead-letter declaration,
/// message decode, dispatch into [`Consumer::process`], and the terminal
/// ack/reject decision.
///
/// One message at a time: prefetch is pinned to 1 and the loop awaits the
/// terminal broker call before pulling the next delivery. Horizontal scale
/// comes from running more processes on the same queue.
pub struct ConsumerRuntime<C: Consumer> {
    channel: MessageChannel,
    consumer: C,
    metrics: Arc<Metrics>,
}

impl<C: Consumer> ConsumerRuntime<C> {
    pub fn new(channel: MessageChannel, consumer: C, metrics: Arc<Metrics>) -> Self {
        Self {
            channel,
            consumer,
            metrics,
        }
    }

    /// Declare topology and consume until `shutdown` fires.
    ///
    /// Dead-letter declaration happens before the primary queue is bound:
    /// the `x-dead-letter-exchange` argument is immutable once the queue
    /// exists, so the order is load-bearing.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<(), ConsumerError> {
        let stage = self.consumer.stage();

        let arguments = if stage.dead_letter {
            self.channel
                .declare_dead_letter_topology(stage.queue())
                .await?
        } else {
            FieldTable::default()
        };

        self.channel
            .bind_queue(
                stage.queue(),
                DEFAULT_EXCHANGE,
                stage.routing_key(),
                arguments,
            )
            .await?;

        self.channel.set_prefetch(1).await?;

        let mut deliveries = self
            .channel
            .consume(stage.queue(), &format!("quarry-{}", stage.name))
            .await?;

        tracing::info!(
            queue = stage.queue(),
            dead_letter = stage.dead_letter,
            "▶️  {} — consuming",
            self.consumer.description()
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => {
                    tracing::info!(queue = stage.queue(), "🛑 shutdown signal received");
                    break;
                }

                delivery = deliveries.next() => {
                    match delivery {
                        None => {
                            tracing::warn!(queue = stage.queue(), "delivery stream closed by broker");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "consumer stream error");
                            break;
                        }
                        Some(Ok(delivery)) => self.handle(delivery).await,
                    }
                }
            }
        }

        self.metrics.log_summary();
        Ok(())
    }

    /// Drive one delivery through decode → process → ack|reject.
    /// Every path through this function reaches exactly one terminal call.
    async fn handle(&self, delivery: Delivery) {
        self.metrics.inc_received();

        if delivery.redelivered {
            tracing::debug!(
                tag = delivery.delivery_tag,
                "redelivered message — idempotency check will decide"
            );
        }

        let payload = match serde_json::from_slice::<C::Payload>(&delivery.data) {
            Ok(payload) => payload,
            Err(e) => {
                // Malformed messages are preserved in the dead-letter queue,
                // never silently dropped and never left blocking the queue.
                tracing::error!(
                    queue = self.consumer.stage().queue(),
                    error = %e,
                    body = %String::from_utf8_lossy(&delivery.data),
                    "malformed message — rejecting"
                );
                self.reject(&delivery).await;
                return;
            }
        };

        tracing::info!(payload = ?payload, "receiving message");

        let outcome = self.consumer.process(payload).await;

        match &outcome {
            Outcome::Done => tracing::info!("✅ finished processing message"),
            Outcome::AlreadyDone => {
                self.metrics.inc_already_done();
                tracing::info!("unit of work already completed — acknowledging without work");
            }
            Outcome::MissingInput(context) => {
                tracing::error!(context = %context, "missing input — rejecting");
            }
            Outcome::Failed(context) => {
                tracing::error!(context = %context, "processing failed — rejecting");
            }
        }

        // Single terminal decision point: every outcome maps to exactly one
        // broker call.
        if outcome.acknowledges() {
            self.ack(&delivery).await;
        } else {
            self.reject(&delivery).await;
        }
    }

    async fn ack(&self, delivery: &Delivery) {
        self.metrics.inc_acked();
        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            tracing::error!(error = %e, "ack failed — broker will redeliver");
        }
    }

    /// Reject without requeue: with dead-lettering enabled the broker moves
    /// the message to the companion queue; otherwise it is dropped.
    async fn reject(&self, delivery: &Delivery) {
        self.metrics.inc_rejected();
        if let Err(e) = delivery
            .nack(BasicNackOptions {
                multiple: false,
                requeue: false,
            })
            .await
        {
            tracing::error!(error = %e, "reject failed — broker will redeliver");
        }
    }
}
