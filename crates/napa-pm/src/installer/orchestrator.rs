//! The install pipeline: cache check, download, verify, extract.
//!
//! Every package in the resolved set is installed concurrently under a
//! bounded semaphore. Within one package the steps are strictly ordered
//! (verification always precedes extraction, extraction precedes archive
//! deletion); across packages there is no ordering at all. A failing
//! package is recorded and never aborts its siblings; partial success is
//! the normal terminal state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::downloader::{digests_match, extract, Fetcher};
use crate::error::{NapaError, Result};
use crate::http::HttpClient;
use crate::installer::cache;
use crate::package::{InstallTarget, ResolutionSet, ResolvedPackage};

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// Downloaded, verified, and unpacked.
    Installed,
    /// Already on disk; nothing was downloaded.
    CacheHit,
    /// The recorded reason; siblings were unaffected.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub fqpid: String,
    pub status: InstallStatus,
}

/// Per-package outcomes in resolution order, plus the tallies callers
/// report. The aggregate run itself never fails.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub outcomes: Vec<InstallOutcome>,
}

impl InstallReport {
    pub fn installed(&self) -> usize {
        self.count(|s| matches!(s, InstallStatus::Installed))
    }

    pub fn cache_hits(&self) -> usize {
        self.count(|s| matches!(s, InstallStatus::CacheHit))
    }

    pub fn failures(&self) -> usize {
        self.count(|s| matches!(s, InstallStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&InstallStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

pub struct InstallOrchestrator {
    fetcher: Arc<Fetcher>,
    install_root: PathBuf,
    limiter: Arc<Semaphore>,
}

impl InstallOrchestrator {
    pub fn new(http: Arc<HttpClient>, install_root: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            fetcher: Arc::new(Fetcher::new(http)),
            install_root: install_root.into(),
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Install every package in the resolved set.
    pub async fn install(&self, resolution: &ResolutionSet) -> InstallReport {
        let mut tasks = JoinSet::new();

        for package in resolution.values() {
            let fetcher = Arc::clone(&self.fetcher);
            let limiter = Arc::clone(&self.limiter);
            let target = InstallTarget::for_package(package, &self.install_root);
            let package = package.clone();

            tasks.spawn(async move {
                let _permit = limiter
                    .acquire_owned()
                    .await
                    .expect("installer semaphore closed");

                let fqpid = target.fqpid.clone();
                let status = match install_one(&fetcher, &package, &target).await {
                    Ok(true) => {
                        log::info!("found cached package for {fqpid}");
                        InstallStatus::CacheHit
                    }
                    Ok(false) => {
                        log::info!("installed {fqpid}");
                        InstallStatus::Installed
                    }
                    Err(err) => {
                        log::error!("failed to install {fqpid}: {err}");
                        InstallStatus::Failed(err.to_string())
                    }
                };

                InstallOutcome { fqpid, status }
            });
        }

        let mut by_fqpid: HashMap<String, InstallOutcome> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    by_fqpid.insert(outcome.fqpid.clone(), outcome);
                }
                Err(err) => log::error!("install task panicked: {err}"),
            }
        }

        // Report in resolution order, not completion order
        InstallReport {
            outcomes: resolution
                .keys()
                .filter_map(|fqpid| by_fqpid.remove(fqpid))
                .collect(),
        }
    }
}

/// Install a single package. Returns true on a cache hit.
async fn install_one(
    fetcher: &Fetcher,
    package: &ResolvedPackage,
    target: &InstallTarget,
) -> Result<bool> {
    if cache::is_installed(&target.output_dir) {
        return Ok(true);
    }

    tokio::fs::create_dir_all(&target.output_dir).await?;

    let digest = fetcher.fetch(&package.download_url, &target.archive_path).await?;

    if !digests_match(&digest, &package.shasum) {
        // Corrupt download: discard the archive, never extract it
        let _ = tokio::fs::remove_file(&target.archive_path).await;
        return Err(NapaError::ChecksumMismatch {
            path: target.archive_path.clone(),
            expected: package.shasum.clone(),
            actual: digest,
        });
    }

    extract(&target.archive_path, &target.output_dir)?;

    // Archive cleanup is best-effort; the install itself already succeeded
    if let Err(err) = tokio::fs::remove_file(&target.archive_path).await {
        log::warn!(
            "could not remove archive {}: {err}",
            target.archive_path.display()
        );
    }

    Ok(false)
}
