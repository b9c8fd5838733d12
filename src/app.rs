use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::consumer::analysis::{FilesizeConsumer, PDependConsumer};
use crate::consumer::{Consumer, ConsumerError, ConsumerRuntime};
use crate::executor::ShellExecutor;
use crate::messaging::{build_pool, ChannelError, MessageChannel, RabbitError};
use crate::metrics::Metrics;
use crate::producer::{GitwebSeeder, ProducerError, SeedOutcome};
use crate::shutdown;
use crate::store::{MySqlVersionStore, StoreError};

// ── Error type ─────────────────────────────────────────────────────────────────

/// Top-level application error, surfaced only at startup/shutdown.
/// Each variant wraps the underlying cause so `main.rs` can log it cleanly
/// without depending on every sub-module type.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Rabbit(RabbitError),
    Channel(ChannelError),
    Consumer(ConsumerError),
    Producer(ProducerError),
    Store(StoreError),
    /// A consumer was requested whose external tool is not configured.
    ToolNotConfigured(&'static str),
    /// The runtime task itself failed (panic).
    Runtime(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::Rabbit(e) => write!(f, "broker error: {e}"),
            Self::Channel(e) => write!(f, "channel error: {e}"),
            Self::Consumer(e) => write!(f, "consumer error: {e}"),
            Self::Producer(e) => write!(f, "producer error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::ToolNotConfigured(tool) => {
                write!(f, "consumer needs 'tools.{tool}' in the config file")
            }
            Self::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

// ── Consumer selection ─────────────────────────────────────────────────────────

/// Which consumer implementation this process runs. One process per
/// consumer type; scale-out means more processes on the same queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerKind {
    Filesize,
    PDepend,
}

// ── Entry points ───────────────────────────────────────────────────────────────

/// Run one consumer process until SIGINT/SIGTERM.
///
/// The broker connection and channel are owned here: acquired before the
/// runtime starts and closed on every exit path, including failures.
pub async fn run_consumer(config_path: &str, kind: ConsumerKind) -> Result<(), AppError> {
    let config = Config::load(config_path).map_err(AppError::Config)?;
    config.log_summary();

    let metrics = Arc::new(Metrics::new());

    let pool = build_pool(&config.amqp_url(), 2)
        .await
        .map_err(AppError::Rabbit)?;
    let channel = MessageChannel::open(&pool)
        .await
        .map_err(AppError::Channel)?;

    let result = match kind {
        ConsumerKind::Filesize => {
            let store = MySqlVersionStore::connect(&config.storage.url)
                .await
                .map_err(AppError::Store)?;
            let consumer = FilesizeConsumer::new(Arc::new(store));
            drive(channel.clone(), consumer, metrics).await
        }
        ConsumerKind::PDepend => {
            let pdepend = config
                .tools
                .pdepend
                .clone()
                .ok_or(AppError::ToolNotConfigured("pdepend"))?;
            let consumer = PDependConsumer::new(Arc::new(ShellExecutor), pdepend);
            drive(channel.clone(), consumer, metrics).await
        }
    };

    // Clean close regardless of how the runtime ended.
    if let Err(e) = channel.close().await {
        tracing::warn!(error = %e, "channel close failed");
    }

    result
}

/// Spawn the runtime, wait for an OS signal, then drain and join.
async fn drive<C>(
    channel: MessageChannel,
    consumer: C,
    metrics: Arc<Metrics>,
) -> Result<(), AppError>
where
    C: Consumer + 'static,
{
    let (shutdown_handle, shutdown_signal) = shutdown::new_pair();

    let runtime = ConsumerRuntime::new(channel, consumer, metrics);
    let mut runtime_task = tokio::spawn(runtime.run(shutdown_signal));

    tokio::select! {
        // Runtime ended on its own: startup failure or broker stream closed.
        result = &mut runtime_task => {
            return result
                .map_err(|e| AppError::Runtime(e.to_string()))?
                .map_err(AppError::Consumer);
        }
        _ = shutdown::wait_for_os_signal() => {
            tracing::info!("🛑 signal received — initiating graceful shutdown...");
            shutdown_handle.trigger();
        }
    }

    runtime_task
        .await
        .map_err(|e| AppError::Runtime(e.to_string()))?
        .map_err(AppError::Consumer)?;

    tracing::info!("✅ shutdown complete");
    Ok(())
}

/// Seed a Gitweb crawl for `project` and exit.
///
/// Success covers both "message published" and "nothing configured for this
/// project"; only invalid configuration or broker failures are errors.
pub async fn run_seed_gitweb(config_path: &str, project: &str) -> Result<(), AppError> {
    let config = Config::load(config_path).map_err(AppError::Config)?;

    let pool = build_pool(&config.amqp_url(), 1)
        .await
        .map_err(AppError::Rabbit)?;
    let channel = MessageChannel::open(&pool)
        .await
        .map_err(AppError::Channel)?;

    let outcome = GitwebSeeder::new(&channel, &config).seed(project).await;

    if let Err(e) = channel.close().await {
        tracing::warn!(error = %e, "channel close failed");
    }

    match outcome.map_err(AppError::Producer)? {
        SeedOutcome::Published => tracing::info!(project, "seed message published"),
        SeedOutcome::NothingToDo => tracing::info!(project, "nothing to publish"),
    }
    Ok(())
}
