mod gitweb;

pub use gitweb::{build_seed, GitwebSeed, GitwebSeeder};

use crate::messaging::ChannelError;

// ── Outcome ────────────────────────────────────────────────────────────────────

/// Result of a seed command.
///
/// "Nothing to do" is a first-class success: a project without the relevant
/// source configured simply produces no message, and the command exits zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// One message was published to the configured exchange.
    Published,
    /// The project has nothing configured for this stage; no publish happened.
    NothingToDo,
}

// ── Error ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ProducerError {
    /// A configured field is malformed (e.g. a source URL that does not
    /// parse). Reported to the operator; nothing is published.
    Validation { field: String, message: String },
    /// Broker-side publish failure.
    Channel(ChannelError),
}

impl std::fmt::Display for ProducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, message } => {
                write!(f, "invalid {field}: {message}")
            }
            Self::Channel(e) => write!(f, "producer: {e}"),
        }
    }
}

impl std::error::Error for ProducerError {}

impl From<ChannelError> for ProducerError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}
