use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::consumer::{Consumer, Outcome};
use crate::messaging::topology::{stage, Stage};
use crate::model::FilesizeMessage;
use crate::store::VersionStore;

/// Measures the size of a downloaded release tarball and writes it back
/// into the version record.
///
/// No external tool is involved — the size comes straight from file
/// metadata. The `size_tar` column doubles as the completion marker: a
/// redelivered message for an already-measured version is acknowledged
/// without touching the filesystem or the store.
pub struct FilesizeConsumer {
    store: Arc<dyn VersionStore>,
}

impl FilesizeConsumer {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Consumer for FilesizeConsumer {
    type Payload = FilesizeMessage;

    fn stage(&self) -> &'static Stage {
        stage("analysis.filesize").expect("analysis.filesize is a fixed pipeline stage")
    }

    fn description(&self) -> &'static str {
        "measures tarball sizes and stores them on the version record"
    }

    async fn process(&self, payload: Self::Payload) -> Outcome {
        // Idempotency check precedes everything else.
        let record = match self.store.fetch(payload.version_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Outcome::MissingInput(format!(
                    "version record {} does not exist",
                    payload.version_id
                ));
            }
            Err(e) => {
                return Outcome::Failed(format!(
                    "store lookup for version {} failed: {e}",
                    payload.version_id
                ));
            }
        };

        if record.has_tarball_size() {
            return Outcome::AlreadyDone;
        }

        let path = Path::new(&payload.filename);
        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata.len() as i64,
            Ok(_) => {
                return Outcome::MissingInput(format!(
                    "'{}' is not a regular file",
                    payload.filename
                ));
            }
            Err(_) => {
                return Outcome::MissingInput(format!(
                    "file '{}' does not exist",
                    payload.filename
                ));
            }
        };

        tracing::info!(
            version_id = payload.version_id,
            filename = %payload.filename,
            size,
            "measured tarball size"
        );

        match self.store.record_tarball_size(record.id, size).await {
            // Another instance slipped in between our check and the write;
            // the conditional update makes that harmless.
            Ok(false) => Outcome::AlreadyDone,
            Ok(true) => Outcome::Done,
            Err(e) => Outcome::Failed(format!(
                "storing size for version {} failed: {e}",
                record.id
            )),
        }
    }
}
