pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod installer;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod resolver;

pub use config::Config;
pub use downloader::Fetcher;
pub use error::{NapaError, Result};
pub use http::{HttpClient, HttpClientConfig, HttpError};
pub use installer::{InstallOrchestrator, InstallOutcome, InstallReport, InstallStatus};
pub use manifest::{DependencyMap, FileManifestStore, ManifestStore};
pub use package::{DependencySpec, InstallTarget, PackageId, ResolutionSet, ResolvedPackage};
pub use registry::{HttpRegistryClient, PackageMetadata, RegistryClient, VersionMetadata};
pub use resolver::{GraphResolver, ResolutionFailure, ResolutionOutcome};
