use deadpool_lapin::Manager;
use lapin::ConnectionProperties;

/// Re-exported so other modules inside `messaging/` can import Pool from here.
pub type Pool = deadpool_lapin::Pool;

// ── Error ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum RabbitError {
    /// The broker is unreachable or rejected the credentials.
    Connection(String),
    /// Failed to build the connection pool itself.
    Pool(String),
}

impl std::fmt::Display for RabbitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "broker connection failed: {msg}"),
            Self::Pool(msg) => write!(f, "connection pool build failed: {msg}"),
        }
    }
}

impl std::error::Error for RabbitError {}

// ── Pool constructor ───────────────────────────────────────────────────────────

/// Build a [`deadpool_lapin`] connection pool and verify connectivity with a
/// single checkout.
///
/// There is deliberately no retry loop here: a worker that cannot reach the
/// broker exits with an error, and the process supervisor decides when to
/// start it again.
pub async fn build_pool(url: &str, max_connections: usize) -> Result<Pool, RabbitError> {
    let manager = Manager::new(url, ConnectionProperties::default());

    let pool = Pool::builder(manager)
        .max_size(max_connections)
        .build()
        .map_err(|e| RabbitError::Pool(e.to_string()))?;

    // One checkout up front so credential or network problems surface at
    // startup instead of on the first publish.
    pool.get()
        .await
        .map_err(|e| RabbitError::Connection(e.to_string()))?;

    tracing::info!("📡 broker connected");
    Ok(pool)
}
