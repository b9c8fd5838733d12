use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PDependConfig;
use crate::consumer::{Consumer, Outcome};
use crate::executor::CommandExecutor;
use crate::messaging::topology::{stage, Stage};
use crate::model::PDependMessage;

/// Runs the pDepend static-analysis tool on a source directory.
///
/// pDepend writes four artifacts next to the analyzed directory; their
/// joint existence is the completion marker. A message for a directory
/// whose artifacts all exist is acknowledged without running the tool.
pub struct PDependConsumer {
    executor: Arc<dyn CommandExecutor>,
    config: PDependConfig,
}

/// The four output artifacts of one pDepend run, derived from the target
/// directory: they live in its parent, suffixed with the directory name.
#[derive(Debug, PartialEq, Eq)]
pub struct PDependArtifacts {
    pub jdepend_chart: PathBuf,
    pub jdepend_xml: PathBuf,
    pub overview_pyramid: PathBuf,
    pub summary_xml: PathBuf,
}

impl PDependArtifacts {
    /// Derive artifact paths for `directory` (trailing separators ignored).
    /// Returns `None` when the path has no parent/file-name to derive from.
    pub fn for_directory(directory: &str) -> Option<Self> {
        let dir = Path::new(directory.trim_end_matches('/'));
        let name = dir.file_name()?.to_str()?;
        let base = dir.parent()?;

        Some(Self {
            jdepend_chart: base.join(format!("jdepend-chart-{name}.svg")),
            jdepend_xml: base.join(format!("jdepend-xml-{name}.xml")),
            overview_pyramid: base.join(format!("overview-pyramid-{name}.svg")),
            summary_xml: base.join(format!("summary-xml-{name}.xml")),
        })
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            &self.jdepend_chart,
            &self.jdepend_xml,
            &self.overview_pyramid,
            &self.summary_xml,
        ]
    }

    fn all_exist(&self) -> bool {
        self.all().iter().all(|p| p.exists())
    }

    fn missing(&self) -> Vec<String> {
        self.all()
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect()
    }
}

impl PDependConsumer {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: PDependConfig) -> Self {
        Self { executor, config }
    }

    /// Argument list for one run. Kept separate from `process` so the exact
    /// flag set is testable without touching the filesystem.
    pub fn build_args(&self, directory: &str, artifacts: &PDependArtifacts) -> Vec<String> {
        let dir = directory.trim_end_matches('/');
        vec![
            format!("--jdepend-chart={}", artifacts.jdepend_chart.display()),
            format!("--jdepend-xml={}", artifacts.jdepend_xml.display()),
            format!("--overview-pyramid={}", artifacts.overview_pyramid.display()),
            format!("--summary-xml={}", artifacts.summary_xml.display()),
            format!("--suffix={}", self.config.file_pattern),
            "--coderank-mode=inheritance,property,method".to_string(),
            format!("{dir}/"),
        ]
    }
}

#[async_trait]
impl Consumer for PDependConsumer {
    type Payload = PDependMessage;

    fn stage(&self) -> &'static Stage {
        stage("analysis.pdepend").expect("analysis.pdepend is a fixed pipeline stage")
    }

    fn description(&self) -> &'static str {
        "runs the pDepend analysis on a source directory"
    }

    async fn process(&self, payload: Self::Payload) -> Outcome {
        let dir = Path::new(&payload.directory);
        if !dir.is_dir() {
            return Outcome::MissingInput(format!(
                "directory '{}' does not exist",
                payload.directory
            ));
        }

        let artifacts = match PDependArtifacts::for_directory(&payload.directory) {
            Some(artifacts) => artifacts,
            None => {
                return Outcome::MissingInput(format!(
                    "cannot derive artifact paths from '{}'",
                    payload.directory
                ));
            }
        };

        // A previous run left all four artifacts behind — nothing to do.
        if artifacts.all_exist() {
            tracing::info!(
                version_id = payload.version_id,
                directory = %payload.directory,
                "directory already analyzed with pDepend"
            );
            return Outcome::AlreadyDone;
        }

        tracing::info!(
            version_id = payload.version_id,
            directory = %payload.directory,
            "start analyzing with pDepend"
        );

        let args = self.build_args(&payload.directory, &artifacts);
        if let Err(e) = self.executor.execute(&self.config.binary, &args).await {
            return Outcome::Failed(format!("pDepend execution failed: {e}"));
        }

        // The tool exiting zero is not enough: partial artifact sets have
        // been observed, so presence is verified explicitly.
        if !artifacts.all_exist() {
            return Outcome::Failed(format!(
                "pDepend result files missing after run: {}",
                artifacts.missing().join(", ")
            ));
        }

        Outcome::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CommandOutput, ExecError};
    use std::fs::{self, File};
    use std::sync::Mutex;

    /// Executor double: records every invocation and either fails or
    /// fabricates the artifact files the way a real run would.
    #[derive(Default)]
    struct FakeExecutor {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
        create_artifacts: Option<Vec<PathBuf>>,
    }

    impl FakeExecutor {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandExecutor for FakeExecutor {
        async fn execute(
            &self,
            program: &str,
            args: &[String],
        ) -> Result<CommandOutput, ExecError> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));

            if self.fail {
                return Err(ExecError::Failed {
                    code: Some(2),
                    stderr: "parse error".into(),
                });
            }
            if let Some(paths) = &self.create_artifacts {
                for path in paths {
                    File::create(path).unwrap();
                }
            }
            Ok(CommandOutput {
                stdout: String::new(),
            })
        }
    }

    fn test_config() -> PDependConfig {
        PDependConfig {
            binary: "/usr/bin/pdepend".into(),
            file_pattern: ".*\\.php$".into(),
        }
    }

    #[test]
    fn artifacts_are_derived_next_to_the_directory() {
        let artifacts = PDependArtifacts::for_directory("/srv/sources/typo3_6-2-0/").unwrap();
        assert_eq!(
            artifacts.jdepend_chart,
            PathBuf::from("/srv/sources/jdepend-chart-typo3_6-2-0.svg")
        );
        assert_eq!(
            artifacts.summary_xml,
            PathBuf::from("/srv/sources/summary-xml-typo3_6-2-0.xml")
        );
    }

    #[test]
    fn args_carry_every_expected_flag() {
        let consumer = PDependConsumer::new(Arc::new(FakeExecutor::default()), test_config());
        let artifacts = PDependArtifacts::for_directory("/srv/sources/pkg").unwrap();
        let args = consumer.build_args("/srv/sources/pkg", &artifacts);

        assert_eq!(args[0], "--jdepend-chart=/srv/sources/jdepend-chart-pkg.svg");
        assert_eq!(args[4], "--suffix=.*\\.php$");
        assert_eq!(args[5], "--coderank-mode=inheritance,property,method");
        assert_eq!(args.last().unwrap(), "/srv/sources/pkg/");
    }

    #[tokio::test]
    async fn missing_directory_rejects_without_executing() {
        let executor = Arc::new(FakeExecutor::default());
        let consumer = PDependConsumer::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, test_config());

        let outcome = consumer
            .process(PDependMessage {
                version_id: 7,
                directory: "/nonexistent/source-tree".into(),
            })
            .await;

        assert!(matches!(outcome, Outcome::MissingInput(_)));
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn existing_artifacts_short_circuit_the_run() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("pkg");
        fs::create_dir(&dir).unwrap();
        let artifacts = PDependArtifacts::for_directory(dir.to_str().unwrap()).unwrap();
        for path in artifacts.all() {
            File::create(path).unwrap();
        }

        let executor = Arc::new(FakeExecutor::default());
        let consumer = PDependConsumer::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, test_config());

        let outcome = consumer
            .process(PDependMessage {
                version_id: 7,
                directory: dir.to_str().unwrap().into(),
            })
            .await;

        assert_eq!(outcome, Outcome::AlreadyDone);
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_execution_rejects() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("pkg");
        fs::create_dir(&dir).unwrap();

        let executor = Arc::new(FakeExecutor {
            fail: true,
            ..Default::default()
        });
        let consumer = PDependConsumer::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, test_config());

        let outcome = consumer
            .process(PDependMessage {
                version_id: 7,
                directory: dir.to_str().unwrap().into(),
            })
            .await;

        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_artifacts_after_run_reject() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("pkg");
        fs::create_dir(&dir).unwrap();
        let artifacts = PDependArtifacts::for_directory(dir.to_str().unwrap()).unwrap();

        // Tool "succeeds" but only produces half of the artifact set.
        let executor = Arc::new(FakeExecutor {
            create_artifacts: Some(vec![
                artifacts.jdepend_chart.clone(),
                artifacts.jdepend_xml.clone(),
            ]),
            ..Default::default()
        });
        let consumer = PDependConsumer::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, test_config());

        let outcome = consumer
            .process(PDependMessage {
                version_id: 7,
                directory: dir.to_str().unwrap().into(),
            })
            .await;

        assert!(matches!(outcome, Outcome::Failed(_)));
    }

    #[tokio::test]
    async fn complete_run_succeeds() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("pkg");
        fs::create_dir(&dir).unwrap();
        let artifacts = PDependArtifacts::for_directory(dir.to_str().unwrap()).unwrap();

        let executor = Arc::new(FakeExecutor {
            create_artifacts: Some(artifacts.all().iter().map(|p| p.to_path_buf()).collect()),
            ..Default::default()
        });
        let consumer = PDependConsumer::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, test_config());

        let outcome = consumer
            .process(PDependMessage {
                version_id: 7,
                directory: dir.to_str().unwrap().into(),
            })
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(executor.call_count(), 1);
    }
}
