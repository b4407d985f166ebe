//! Add command - record a dependency in package.json.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use napa_pm::{Config, FileManifestStore, HttpClient, HttpRegistryClient, ManifestStore, PackageId, RegistryClient};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Package to add, as `name` or `name@versionRange`
    #[arg(value_name = "PACKAGE")]
    pub package: Option<String>,

    /// Working directory
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub async fn execute(args: AddArgs) -> Result<i32> {
    let working_dir = args
        .working_dir
        .canonicalize()
        .context("Failed to resolve working directory")?;

    let config = Config::for_working_dir(&working_dir);

    let id = PackageId::parse(args.package.as_deref().unwrap_or(""));
    if id.name.is_empty() {
        eprintln!(
            "{} Skipped. Package name is not provided.",
            style("Warning:").yellow().bold()
        );
        return Ok(0);
    }

    // No range given: pin to whatever the registry currently tags as latest
    let range = if id.version.is_empty() {
        let http = Arc::new(HttpClient::new().context("Failed to create HTTP client")?);
        let registry = HttpRegistryClient::new(http, config.registry_url.clone());

        match registry.latest_version(&id.name).await {
            Ok(Some(latest)) => latest,
            Ok(None) => {
                eprintln!(
                    "{} Skipped. No published version found for {}.",
                    style("Warning:").yellow().bold(),
                    id.name
                );
                return Ok(0);
            }
            Err(err) => {
                eprintln!(
                    "{} Skipped. Could not determine a version for {}: {}",
                    style("Warning:").yellow().bold(),
                    id.name,
                    err
                );
                return Ok(0);
            }
        }
    } else {
        id.version.clone()
    };

    let manifest = FileManifestStore::new(&config.manifest_path);
    let mut dependencies = manifest.read().context("Failed to read package.json")?;
    dependencies.insert(id.name.clone(), range.clone());
    manifest
        .write(&dependencies)
        .context("Failed to write package.json")?;

    println!(
        "  {} {} {}",
        style("+").green(),
        style(&id.name).white().bold(),
        style(&range).yellow()
    );

    Ok(0)
}
