//! Explicit pipeline topology.
//!
//! Every stage of the crawl-download-analyze chain is described by one
//! [`Stage`] entry: its queue, its routing key, whether it dead-letters
//! rejected messages, and which routing keys it may publish downstream.
//! The table is the single source of truth — no stage hardcodes queue or
//! routing-key strings anywhere else.

/// Default topic exchange the pipeline runs on. Projects may override it
/// per-project in the configuration.
pub const DEFAULT_EXCHANGE: &str = "quarry";

/// Suffix appended to a queue name to derive its dead-letter companions.
pub const DEAD_LETTER_SUFFIX: &str = ".dead_letter";

/// One pipeline stage: a queue bound to the exchange under a routing key
/// that doubles as the queue name.
#[derive(Debug)]
pub struct Stage {
    /// Stage name; also the queue name and the routing key.
    pub name: &'static str,
    /// Whether rejected messages are preserved in a companion dead-letter
    /// queue instead of being dropped.
    pub dead_letter: bool,
    /// Routing keys this stage may publish follow-up messages to.
    /// Must all resolve to entries of [`STAGES`].
    pub publishes_to: &'static [&'static str],
}

impl Stage {
    /// Queue name — identical to the routing key by convention, giving a
    /// flat, discoverable `<domain>.<stage>` namespace.
    pub fn queue(&self) -> &'static str {
        self.name
    }

    pub fn routing_key(&self) -> &'static str {
        self.name
    }
}

/// The pipeline, leaf-last. A message seeded at `crawler.gitweb` fans out
/// through `download.git` into the two analysis stages.
pub const STAGES: &[Stage] = &[
    Stage {
        name: "crawler.gitweb",
        dead_letter: false,
        publishes_to: &["download.git"],
    },
    Stage {
        name: "download.git",
        dead_letter: true,
        publishes_to: &["analysis.filesize", "analysis.pdepend"],
    },
    Stage {
        name: "analysis.filesize",
        dead_letter: true,
        publishes_to: &[],
    },
    Stage {
        name: "analysis.pdepend",
        dead_letter: true,
        publishes_to: &[],
    },
];

/// Look up a stage by name.
pub fn stage(name: &str) -> Option<&'static Stage> {
    STAGES.iter().find(|s| s.name == name)
}

/// Dead-letter exchange for a primary queue, derived deterministically so
/// operators can locate poison messages without a lookup table.
pub fn dead_letter_exchange(queue: &str) -> String {
    format!("{queue}{DEAD_LETTER_SUFFIX}")
}

/// Dead-letter queue for a primary queue. Shares the exchange name — the
/// pair is bound one-to-one.
pub fn dead_letter_queue(queue: &str) -> String {
    format!("{queue}{DEAD_LETTER_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn routing_keys_are_unique() {
        let keys: HashSet<_> = STAGES.iter().map(|s| s.routing_key()).collect();
        assert_eq!(keys.len(), STAGES.len());
    }

    #[test]
    fn downstream_keys_resolve_to_stages() {
        for s in STAGES {
            for target in s.publishes_to {
                assert!(
                    stage(target).is_some(),
                    "{} publishes to unknown stage {}",
                    s.name,
                    target
                );
            }
        }
    }

    #[test]
    fn analysis_stages_dead_letter() {
        assert!(stage("analysis.filesize").unwrap().dead_letter);
        assert!(stage("analysis.pdepend").unwrap().dead_letter);
    }

    #[test]
    fn dead_letter_names_are_derived_from_the_queue() {
        assert_eq!(
            dead_letter_exchange("analysis.filesize"),
            "analysis.filesize.dead_letter"
        );
        assert_eq!(
            dead_letter_queue("analysis.filesize"),
            "analysis.filesize.dead_letter"
        );
    }
}
