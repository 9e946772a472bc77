//! Removal of generated worker class files at session end.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::ledger::WorkerNameLedger;
use crate::names::ClassName;
use crate::runtime::{Runtime, CLASS_PATH_PROPERTY};

/// Outcome of a sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    /// Already gone before the sweep reached them.
    pub missing: Vec<PathBuf>,
    /// Recoverable [`AgentError::Cleanup`] failures, already logged.
    pub failed: Vec<AgentError>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes the file of every worker class in a [`WorkerNameLedger`].
///
/// A worker named `com/acme/App_Worker_0` lives at
/// `<dir>/com/acme/App_Worker_0.class`. Names that would resolve outside
/// the directory (`..` segments, absolute paths) are never touched.
#[derive(Debug, Clone)]
pub struct ShutdownSweeper {
    artifact_dir: PathBuf,
}

impl ShutdownSweeper {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        ShutdownSweeper { artifact_dir: artifact_dir.into() }
    }

    /// Picks the configured directory, else the first class path entry,
    /// else the working directory.
    pub fn resolve<R: Runtime + ?Sized>(config: &AgentConfig, runtime: &R) -> Self {
        if let Some(dir) = &config.artifact_dir {
            return ShutdownSweeper::new(dir);
        }
        let dir = runtime
            .system_property(CLASS_PATH_PROPERTY)
            .and_then(|cp| std::env::split_paths(&cp).next())
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        ShutdownSweeper::new(dir)
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// File of worker `name`, or `None` if the name would escape the
    /// artifact directory.
    pub fn artifact_path(&self, name: &ClassName) -> Option<PathBuf> {
        let relative = PathBuf::from(format!("{name}.class"));
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.artifact_dir.join(relative))
    }

    pub fn sweep(&self, ledger: &WorkerNameLedger) -> SweepReport {
        self.sweep_names(ledger.entries())
    }

    /// Best effort: a failure on one file never stops the rest.
    pub fn sweep_names(&self, names: &[ClassName]) -> SweepReport {
        let mut report = SweepReport::default();

        for name in names {
            let Some(path) = self.artifact_path(name) else {
                let err = AgentError::Cleanup {
                    path: PathBuf::from(name.as_str()),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "worker name escapes the artifact directory"),
                };
                warn!("{err}");
                report.failed.push(err);
                continue;
            };
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed worker artifact");
                    report.removed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing.push(path),
                Err(source) => {
                    let err = AgentError::Cleanup { path, source };
                    warn!("{err}");
                    report.failed.push(err);
                }
            }
        }

        info!(
            removed = report.removed.len(),
            missing = report.missing.len(),
            failed = report.failed.len(),
            "worker artifact sweep finished"
        );
        report
    }
}
