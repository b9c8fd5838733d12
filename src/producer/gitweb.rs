use url::Url;

use crate::config::Config;
use crate::messaging::topology::{stage, DEFAULT_EXCHANGE};
use crate::messaging::MessageChannel;
use crate::model::GitwebMessage;

use super::{ProducerError, SeedOutcome};

/// Seeds a Gitweb crawl: publishes the first message of the
/// crawl → download → analyze chain for one project.
///
/// ```text
/// GitwebSeeder
///     └─> crawler.gitweb
///             └─> download.git
///                     ├─> analysis.filesize
///                     └─> analysis.pdepend
/// ```
pub struct GitwebSeeder<'a> {
    channel: &'a MessageChannel,
    config: &'a Config,
}

/// A validated, ready-to-publish seed. Assembly is separated from
/// publishing so the validation rules are testable without a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitwebSeed {
    pub exchange: String,
    pub routing_key: &'static str,
    pub message: GitwebMessage,
}

/// Assemble the seed message for `project`, or `None` when the project has
/// no Gitweb configured (legitimately nothing to publish).
pub fn build_seed(config: &Config, project: &str) -> Result<Option<GitwebSeed>, ProducerError> {
    let project_config = config.project(project);

    let gitweb_url = match project_config.and_then(|p| p.gitweb.as_deref()) {
        Some(url) => url,
        None => return Ok(None),
    };

    // Validate before publishing; a typo in the config must never make it
    // onto the wire.
    let url = Url::parse(gitweb_url).map_err(|e| ProducerError::Validation {
        field: format!("projects.{project}.gitweb"),
        message: format!("'{gitweb_url}' is not a valid URL: {e}"),
    })?;

    let exchange = project_config
        .and_then(|p| p.exchange.as_deref())
        .unwrap_or(DEFAULT_EXCHANGE)
        .to_string();

    let routing_key = stage("crawler.gitweb")
        .expect("crawler.gitweb is a fixed pipeline stage")
        .routing_key();

    Ok(Some(GitwebSeed {
        exchange,
        routing_key,
        message: GitwebMessage {
            project: project.to_string(),
            url: url.to_string(),
        },
    }))
}

impl<'a> GitwebSeeder<'a> {
    pub fn new(channel: &'a MessageChannel, config: &'a Config) -> Self {
        Self { channel, config }
    }

    /// Validate the project's Gitweb settings and publish exactly one seed
    /// message. Projects without a Gitweb entry return
    /// [`SeedOutcome::NothingToDo`] without touching the broker.
    pub async fn seed(&self, project: &str) -> Result<SeedOutcome, ProducerError> {
        let seed = match build_seed(self.config, project)? {
            Some(seed) => seed,
            None => {
                tracing::info!(project, "no Gitweb configured — nothing to seed");
                return Ok(SeedOutcome::NothingToDo);
            }
        };

        self.channel
            .publish(&seed.exchange, seed.routing_key, &seed.message)
            .await?;

        tracing::info!(
            project,
            url = %seed.message.url,
            exchange = %seed.exchange,
            "🌱 Gitweb crawl seeded"
        );
        Ok(SeedOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(projects: &str) -> Config {
        Config::from_yaml(&format!(
            "broker:\n  host: localhost\nstorage:\n  url: mysql://localhost/quarry\nprojects:\n{projects}"
        ))
        .unwrap()
    }

    #[test]
    fn unconfigured_gitweb_yields_no_seed() {
        let config = config("  TYPO3: {}\n");
        assert!(build_seed(&config, "TYPO3").unwrap().is_none());
        // Unknown project behaves the same way.
        assert!(build_seed(&config, "UNKNOWN").unwrap().is_none());
    }

    #[test]
    fn invalid_url_fails_validation_with_field_context() {
        let config = config("  TYPO3:\n    gitweb: \"not a url\"\n");
        let err = build_seed(&config, "TYPO3").unwrap_err();
        match err {
            ProducerError::Validation { field, .. } => {
                assert_eq!(field, "projects.TYPO3.gitweb");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_project_builds_a_crawler_gitweb_seed() {
        let config = config("  TYPO3:\n    gitweb: https://git.example.org/gitweb\n");
        let seed = build_seed(&config, "TYPO3").unwrap().unwrap();
        assert_eq!(seed.exchange, DEFAULT_EXCHANGE);
        assert_eq!(seed.routing_key, "crawler.gitweb");
        assert_eq!(seed.message.project, "TYPO3");
        assert_eq!(seed.message.url, "https://git.example.org/gitweb");
    }

    #[test]
    fn project_exchange_override_wins() {
        let config = config(
            "  TYPO3:\n    gitweb: https://git.example.org/gitweb\n    exchange: typo3\n",
        );
        let seed = build_seed(&config, "TYPO3").unwrap().unwrap();
        assert_eq!(seed.exchange, "typo3");
    }
}
