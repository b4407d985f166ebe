//! Install command - resolve the dependency graph and populate node_modules.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use napa_pm::{
    Config, DependencySpec, FileManifestStore, GraphResolver, HttpClient, HttpRegistryClient,
    InstallOrchestrator, InstallStatus, ManifestStore, RegistryClient, ResolutionOutcome,
    ResolutionSet,
};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Working directory
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Maximum concurrent registry requests and downloads
    #[arg(long, default_value_t = napa_pm::config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

pub async fn execute(args: InstallArgs) -> Result<i32> {
    let working_dir = args
        .working_dir
        .canonicalize()
        .context("Failed to resolve working directory")?;

    let config = Config::for_working_dir(&working_dir).with_concurrency(args.concurrency);

    let manifest = FileManifestStore::new(&config.manifest_path);
    let dependencies = manifest.read().context("Failed to read package.json")?;

    if dependencies.is_empty() {
        println!("{} Nothing to install.", style("Info:").cyan());
        return Ok(0);
    }

    let specs: Vec<DependencySpec> = dependencies
        .into_iter()
        .map(|(name, range)| DependencySpec::new(name, range))
        .collect();

    println!("{} Installing dependencies", style("Napa").green().bold());
    log::debug!("using registry {}", config.registry_url);

    let http = Arc::new(HttpClient::new().context("Failed to create HTTP client")?);
    let registry: Arc<dyn RegistryClient> = Arc::new(HttpRegistryClient::new(
        Arc::clone(&http),
        config.registry_url.clone(),
    ));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Resolving dependencies...");

    let resolver = GraphResolver::new(registry, config.concurrency);
    let outcome = resolver.resolve_all(&specs).await;

    spinner.finish_and_clear();

    report_resolution_failures(&outcome);

    if outcome.set.is_empty() {
        println!("{} No packages could be resolved.", style("Warning:").yellow().bold());
        return Ok(0);
    }

    print_resolution_table(&outcome.set);

    let progress = ProgressBar::new(outcome.set.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_message("Installing packages...");

    let orchestrator =
        InstallOrchestrator::new(http, config.install_root.clone(), config.concurrency);
    let report = orchestrator.install(&outcome.set).await;

    progress.finish_and_clear();

    for item in &report.outcomes {
        match &item.status {
            InstallStatus::Installed => {
                println!("  {} {}", style("-").green(), style(&item.fqpid).white().bold());
            }
            InstallStatus::CacheHit => {
                println!(
                    "  {} {} {}",
                    style("-").green(),
                    style(&item.fqpid).white().bold(),
                    style("(cached)").dim()
                );
            }
            InstallStatus::Failed(reason) => {
                eprintln!(
                    "  {} {}: {}",
                    style("x").red(),
                    style(&item.fqpid).white().bold(),
                    reason
                );
            }
        }
    }

    println!(
        "{} {} installed, {} cached, {} failed",
        style("Done:").green().bold(),
        report.installed(),
        report.cache_hits(),
        report.failures()
    );

    // Per-package failures are reported above but do not fail the command
    Ok(0)
}

fn report_resolution_failures(outcome: &ResolutionOutcome) {
    for failure in &outcome.failures {
        eprintln!(
            "{} could not resolve {}@{}: {}",
            style("Warning:").yellow().bold(),
            failure.name,
            failure.range,
            failure.error
        );
    }
}

/// Show what was resolved before any download starts.
fn print_resolution_table(set: &ResolutionSet) {
    let id_width = set
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("package".len());

    println!(
        "{}",
        style(format!("{:<id_width$}  {:<40}  {}", "package", "shasum", "tarball")).dim()
    );
    for (fqpid, package) in set {
        println!(
            "{:<id_width$}  {:<40}  {}",
            fqpid, package.shasum, package.download_url
        );
    }
}
