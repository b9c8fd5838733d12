pub mod analysis;
mod runtime;

pub use runtime::{ConsumerError, ConsumerRuntime};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::messaging::topology::Stage;

// ── Outcome ────────────────────────────────────────────────────────────────────

/// Terminal result of processing one delivered message.
///
/// The runtime maps each variant to exactly one acknowledge or reject call,
/// so a consumer implementation cannot leave a delivery unacknowledged or
/// terminate it twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Work performed and results persisted. Acknowledged.
    Done,
    /// The completion marker was already set — redelivery or duplicate.
    /// Acknowledged without repeating the work.
    AlreadyDone,
    /// A required external input (file, directory, upstream record) is
    /// absent. Permanent for this message instance; rejected to the
    /// dead-letter queue.
    MissingInput(String),
    /// The work itself failed (external command non-zero, expected output
    /// artifacts absent). Rejected; recovery happens via dead-letter replay.
    Failed(String),
}

impl Outcome {
    /// Whether this outcome acknowledges the delivery. Rejections never
    /// requeue — a persistently failing message would otherwise storm the
    /// queue; the dead-letter companion preserves it instead.
    pub fn acknowledges(&self) -> bool {
        matches!(self, Self::Done | Self::AlreadyDone)
    }
}

// ── Consumer ───────────────────────────────────────────────────────────────────

/// One pipeline stage's processing logic.
///
/// Implementations carry their own collaborators (store, executor, outbound
/// channel) and are composed into a [`ConsumerRuntime`], which owns all
/// broker plumbing: topology declaration, decoding, and the terminal
/// ack/reject decision.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Payload shape for this stage's routing key. Decode failures are
    /// rejected by the runtime before `process` is ever called.
    type Payload: DeserializeOwned + std::fmt::Debug + Send + 'static;

    /// The topology entry this consumer binds to.
    fn stage(&self) -> &'static Stage;

    /// Human-readable description, logged at startup.
    fn description(&self) -> &'static str;

    /// Process one unit of work. Must be infallible in the Rust sense:
    /// every failure mode is expressed as an [`Outcome`], never a panic.
    async fn process(&self, payload: Self::Payload) -> Outcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_done_and_already_done_acknowledge() {
        assert!(Outcome::Done.acknowledges());
        assert!(Outcome::AlreadyDone.acknowledges());
        assert!(!Outcome::MissingInput("gone".into()).acknowledges());
        assert!(!Outcome::Failed("boom".into()).acknowledges());
    }
}
