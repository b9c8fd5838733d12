mod memory;
mod mysql;

pub use memory::MemoryVersionStore;
pub use mysql::MySqlVersionStore;

use async_trait::async_trait;

// ── Error ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StoreError {
    Connection(String),
    Query(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(m) => write!(f, "store connection error: {m}"),
            Self::Query(m) => write!(f, "store query error: {m}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ── Record ─────────────────────────────────────────────────────────────────────

/// One row of the `versions` table, reduced to what the analysis stages need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub id: i64,
    /// Size of the release tarball in bytes. Write-once: a non-empty value is
    /// a completion marker and is never reset.
    pub size_tar: Option<i64>,
}

impl VersionRecord {
    /// Whether the filesize analysis already ran for this record.
    /// Zero counts as unset — legacy rows carry `0` instead of NULL.
    pub fn has_tarball_size(&self) -> bool {
        matches!(self.size_tar, Some(size) if size != 0)
    }
}

// ── Trait ──────────────────────────────────────────────────────────────────────

/// Read/write access to version records, keyed by primary id.
///
/// Consumers use this for the idempotency check before doing work and for
/// persisting results afterwards. Mutations are single-row, keyed updates;
/// write-once fields use a conditional update so two instances racing on the
/// same record cannot both win.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Fetch a single version record, or `None` if the id does not exist.
    async fn fetch(&self, id: i64) -> Result<Option<VersionRecord>, StoreError>;

    /// Record the tarball size for `id`, but only if no size is stored yet.
    ///
    /// Returns `true` when this call performed the write, `false` when the
    /// completion marker was already set (another instance got there first,
    /// or the work was done in an earlier delivery).
    async fn record_tarball_size(&self, id: i64, size: i64) -> Result<bool, StoreError>;
}
