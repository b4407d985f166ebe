//! Package installation: cache inspection and the install pipeline.

pub mod cache;
mod orchestrator;

pub use orchestrator::{InstallOrchestrator, InstallOutcome, InstallReport, InstallStatus};
