//! Step domain model

use crate::core::{DeployContext, InstallConfig};
use crate::error::InstallError;
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of a step that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work
    Done,
    /// The step found nothing to do (idempotent create hit an existing resource)
    AlreadyExists,
}

/// A single named step of the install procedure
///
/// Steps are defined once, executed at most once per run, and gated by an
/// enablement predicate over the immutable configuration.
#[async_trait]
pub trait Task: Send + Sync {
    /// Human-readable step title, shown in progress output
    fn title(&self) -> String;

    /// Whether this step runs for the given configuration
    fn enabled(&self, _config: &InstallConfig) -> bool {
        true
    }

    /// Run the step, reading the configuration and mutating the shared context
    async fn run(
        &self,
        config: &InstallConfig,
        ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError>;
}

/// Terminal status of a step within one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    AlreadyExists,
    Skipped,
    Failed(String),
}

/// Per-step record produced by the pipeline
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Title annotated with the outcome ("...done" / "...already exists")
    pub title: String,
    pub status: StepStatus,
    pub elapsed: Duration,
}

impl StepReport {
    pub(crate) fn annotated(title: &str, outcome: StepOutcome, elapsed: Duration) -> Self {
        let (suffix, status) = match outcome {
            StepOutcome::Done => ("...done", StepStatus::Done),
            StepOutcome::AlreadyExists => ("...already exists", StepStatus::AlreadyExists),
        };
        Self {
            title: format!("{}{}", title, suffix),
            status,
            elapsed,
        }
    }
}
