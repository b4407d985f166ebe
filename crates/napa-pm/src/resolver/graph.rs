//! Recursive dependency graph resolution.
//!
//! Starting from the manifest's top-level specs, each spec is resolved to a
//! concrete version and its own dependencies are queued for the next wave,
//! until no new packages appear. The shared result store is keyed by FQPID
//! and is insert-once: the first branch to claim an FQPID resolves it, any
//! later branch observing the key stops. That single invariant is what
//! makes diamonds cheap and cycles terminate.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::NapaError;
use crate::package::{DependencySpec, PackageId, ResolutionSet, ResolvedPackage};
use crate::registry::RegistryClient;

use super::version::{normalize_spec, select_version};

/// Per-FQPID resolution state.
#[derive(Debug)]
enum ResolutionState {
    Resolving,
    Resolved(ResolvedPackage),
    Failed,
}

/// Shared store for concurrent resolution branches.
///
/// `begin` is an atomic check-and-insert: exactly one branch per FQPID
/// gets to proceed, later callers no-op.
#[derive(Debug, Default)]
struct ResolutionStore {
    entries: Mutex<IndexMap<String, ResolutionState>>,
}

impl ResolutionStore {
    /// Claim an FQPID. Returns false when another branch already owns it.
    fn begin(&self, fqpid: &str) -> bool {
        let mut entries = self.entries.lock().expect("resolution store poisoned");
        if entries.contains_key(fqpid) {
            return false;
        }
        entries.insert(fqpid.to_string(), ResolutionState::Resolving);
        true
    }

    fn complete(&self, fqpid: &str, package: ResolvedPackage) {
        let mut entries = self.entries.lock().expect("resolution store poisoned");
        entries.insert(fqpid.to_string(), ResolutionState::Resolved(package));
    }

    fn fail(&self, fqpid: &str) {
        let mut entries = self.entries.lock().expect("resolution store poisoned");
        entries.insert(fqpid.to_string(), ResolutionState::Failed);
    }

    fn resolved(&self) -> ResolutionSet {
        let entries = self.entries.lock().expect("resolution store poisoned");
        entries
            .iter()
            .filter_map(|(fqpid, state)| match state {
                ResolutionState::Resolved(package) => Some((fqpid.clone(), package.clone())),
                _ => None,
            })
            .collect()
    }
}

/// A branch that could not be resolved. Recorded, never fatal to siblings.
#[derive(Debug)]
pub struct ResolutionFailure {
    pub name: String,
    pub range: String,
    pub error: NapaError,
}

/// Everything a resolution run produced: the deduplicated package set and
/// the branches that failed along the way.
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub set: ResolutionSet,
    pub failures: Vec<ResolutionFailure>,
}

impl ResolutionOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct GraphResolver {
    registry: Arc<dyn RegistryClient>,
    limiter: Arc<Semaphore>,
}

impl GraphResolver {
    pub fn new(registry: Arc<dyn RegistryClient>, concurrency: usize) -> Self {
        Self {
            registry,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Resolve the full transitive graph rooted at `top_level`.
    ///
    /// All specs of a wave run concurrently (bounded by the semaphore);
    /// the call returns once every branch has completed or failed.
    pub async fn resolve_all(&self, top_level: &[DependencySpec]) -> ResolutionOutcome {
        let store = Arc::new(ResolutionStore::default());
        let mut failures = Vec::new();
        let mut pending: Vec<DependencySpec> = top_level.to_vec();

        while !pending.is_empty() {
            let mut tasks = JoinSet::new();

            for spec in pending.drain(..) {
                let registry = Arc::clone(&self.registry);
                let store = Arc::clone(&store);
                let limiter = Arc::clone(&self.limiter);

                tasks.spawn(async move {
                    let _permit = limiter
                        .acquire_owned()
                        .await
                        .expect("resolver semaphore closed");
                    resolve_one(registry, store, spec).await
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(discovered)) => pending.extend(discovered),
                    Ok(Err(failure)) => {
                        log::warn!(
                            "failed to resolve {}@{}: {}",
                            failure.name,
                            failure.range,
                            failure.error
                        );
                        failures.push(failure);
                    }
                    Err(err) => log::error!("resolution task panicked: {err}"),
                }
            }
        }

        ResolutionOutcome {
            set: store.resolved(),
            failures,
        }
    }
}

/// Resolve one spec to a concrete package and return the dependency specs
/// it introduces for the next wave.
async fn resolve_one(
    registry: Arc<dyn RegistryClient>,
    store: Arc<ResolutionStore>,
    spec: DependencySpec,
) -> Result<Vec<DependencySpec>, ResolutionFailure> {
    let (name, range) = normalize_spec(&spec.name, &spec.range);

    fn fail(name: &str, range: &str, error: NapaError) -> ResolutionFailure {
        ResolutionFailure {
            name: name.to_string(),
            range: range.to_string(),
            error,
        }
    }

    let metadata = registry
        .metadata(&name)
        .await
        .map_err(|e| fail(&name, &range, e))?;
    let version =
        select_version(&name, &range, &metadata.versions).map_err(|e| fail(&name, &range, e))?;

    let fqpid = PackageId::new(&name, &version).to_string();

    // Another branch already handles this exact package
    if !store.begin(&fqpid) {
        return Ok(Vec::new());
    }

    match registry.version_metadata(&name, &version).await {
        Ok(meta) => {
            log::debug!("resolved {fqpid} -> {}", meta.tarball);
            store.complete(
                &fqpid,
                ResolvedPackage {
                    name,
                    version,
                    download_url: meta.tarball,
                    shasum: meta.shasum,
                },
            );

            Ok(meta
                .dependencies
                .into_iter()
                .map(|(dep_name, dep_range)| DependencySpec::new(dep_name, dep_range))
                .collect())
        }
        Err(error) => {
            store.fail(&fqpid);
            Err(fail(&name, &range, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PackageMetadata, VersionMetadata};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory registry for resolver tests.
    #[derive(Default)]
    struct FakeRegistry {
        packages: HashMap<String, Vec<(String, Vec<(String, String)>)>>,
        version_metadata_calls: Mutex<HashMap<String, usize>>,
        metadata_calls: AtomicUsize,
    }

    impl FakeRegistry {
        fn publish(&mut self, name: &str, version: &str, dependencies: &[(&str, &str)]) {
            self.packages.entry(name.to_string()).or_default().push((
                version.to_string(),
                dependencies
                    .iter()
                    .map(|(n, r)| (n.to_string(), r.to_string()))
                    .collect(),
            ));
        }

        fn version_metadata_count(&self, fqpid: &str) -> usize {
            self.version_metadata_calls
                .lock()
                .unwrap()
                .get(fqpid)
                .copied()
                .unwrap_or(0)
        }

        fn tarball_url(name: &str, version: &str) -> String {
            format!("https://registry.test/{name}/-/{name}-{version}.tgz")
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn metadata(&self, name: &str) -> crate::Result<PackageMetadata> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);

            let versions = self.packages.get(name).ok_or_else(|| {
                NapaError::MetadataFetch {
                    name: name.to_string(),
                    reason: "Not found".to_string(),
                }
            })?;

            Ok(PackageMetadata {
                versions: versions.iter().map(|(v, _)| v.clone()).collect(),
                latest: versions.last().map(|(v, _)| v.clone()),
            })
        }

        async fn version_metadata(
            &self,
            name: &str,
            version: &str,
        ) -> crate::Result<VersionMetadata> {
            let fqpid = format!("{name}@{version}");
            *self
                .version_metadata_calls
                .lock()
                .unwrap()
                .entry(fqpid)
                .or_insert(0) += 1;

            let versions = self.packages.get(name).ok_or_else(|| {
                NapaError::MetadataFetch {
                    name: name.to_string(),
                    reason: "Not found".to_string(),
                }
            })?;

            let (_, dependencies) = versions
                .iter()
                .find(|(v, _)| v == version)
                .ok_or_else(|| NapaError::MetadataFetch {
                    name: name.to_string(),
                    reason: format!("version {version} not found"),
                })?;

            Ok(VersionMetadata {
                dependencies: dependencies.iter().cloned().collect(),
                tarball: Self::tarball_url(name, version),
                shasum: "0000000000000000000000000000000000000000".to_string(),
            })
        }
    }

    fn resolver(registry: FakeRegistry) -> (Arc<FakeRegistry>, GraphResolver) {
        let registry = Arc::new(registry);
        let resolver = GraphResolver::new(Arc::clone(&registry) as Arc<dyn RegistryClient>, 4);
        (registry, resolver)
    }

    #[tokio::test]
    async fn test_resolves_transitive_chain() {
        let mut fake = FakeRegistry::default();
        fake.publish("a", "1.0.0", &[("b", "^1.0.0")]);
        fake.publish("b", "1.0.0", &[]);
        fake.publish("b", "1.4.0", &[]);
        let (_, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[DependencySpec::new("a", "^1.0.0")])
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.set.len(), 2);
        assert!(outcome.set.contains_key("a@1.0.0"));
        assert!(outcome.set.contains_key("b@1.4.0"));

        let b = &outcome.set["b@1.4.0"];
        assert_eq!(b.download_url, FakeRegistry::tarball_url("b", "1.4.0"));
    }

    #[tokio::test]
    async fn test_diamond_resolves_shared_dependency_once() {
        let mut fake = FakeRegistry::default();
        fake.publish("a", "1.0.0", &[("b", "^1.0.0"), ("c", "^1.0.0")]);
        fake.publish("b", "1.0.0", &[("d", "^1.0.0")]);
        fake.publish("c", "1.0.0", &[("d", "^1.0.0")]);
        fake.publish("d", "1.0.0", &[]);
        let (registry, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[DependencySpec::new("a", "^1.0.0")])
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.set.len(), 4);
        assert!(outcome.set.contains_key("d@1.0.0"));
        // Both paths reference d, but only the first claimant fetched it
        assert_eq!(registry.version_metadata_count("d@1.0.0"), 1);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let mut fake = FakeRegistry::default();
        fake.publish("a", "1.0.0", &[("b", "^1.0.0")]);
        fake.publish("b", "1.0.0", &[("a", "^1.0.0")]);
        let (registry, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[DependencySpec::new("a", "^1.0.0")])
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.set.len(), 2);
        assert_eq!(registry.version_metadata_count("a@1.0.0"), 1);
        assert_eq!(registry.version_metadata_count("b@1.0.0"), 1);
    }

    #[tokio::test]
    async fn test_branch_failure_does_not_abort_siblings() {
        let mut fake = FakeRegistry::default();
        fake.publish("a", "1.0.0", &[]);
        let (_, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[
                DependencySpec::new("a", "^1.0.0"),
                DependencySpec::new("ghost", "^1.0.0"),
            ])
            .await;

        assert_eq!(outcome.set.len(), 1);
        assert!(outcome.set.contains_key("a@1.0.0"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "ghost");
        assert!(matches!(
            outcome.failures[0].error,
            NapaError::MetadataFetch { .. }
        ));
    }

    #[tokio::test]
    async fn test_no_satisfying_version_is_branch_local() {
        let mut fake = FakeRegistry::default();
        fake.publish("a", "1.0.0", &[]);
        fake.publish("b", "1.0.0", &[]);
        let (_, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[
                DependencySpec::new("a", "^1.0.0"),
                DependencySpec::new("b", "^5.0.0"),
            ])
            .await;

        assert_eq!(outcome.set.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0].error,
            NapaError::NoSatisfyingVersion { .. }
        ));
    }

    #[tokio::test]
    async fn test_alias_spec_resolves_real_package() {
        let mut fake = FakeRegistry::default();
        fake.publish("wrap-ansi", "7.0.0", &[]);
        let (_, resolver) = resolver(fake);

        let outcome = resolver
            .resolve_all(&[DependencySpec::new("wrap-ansi-cjs", "npm:wrap-ansi@^7.0.0")])
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.set.len(), 1);
        assert!(outcome.set.contains_key("wrap-ansi@7.0.0"));
    }

    #[tokio::test]
    async fn test_empty_top_level() {
        let (_, resolver) = resolver(FakeRegistry::default());
        let outcome = resolver.resolve_all(&[]).await;
        assert!(outcome.set.is_empty());
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_store_begin_is_first_writer_wins() {
        let store = ResolutionStore::default();
        assert!(store.begin("a@1.0.0"));
        assert!(!store.begin("a@1.0.0"));

        // A failed entry stays claimed
        store.fail("a@1.0.0");
        assert!(!store.begin("a@1.0.0"));
        assert!(store.resolved().is_empty());
    }
}
