//! Chart staging - copy the chart into the cache and resolve dependencies
//!
//! All chart-scoped commands run against the staged copy; the source
//! templates tree is never written to, so repeated installer runs always
//! start from a clean re-stageable copy.

use crate::core::{DeployContext, InstallConfig, StepOutcome, Task};
use crate::error::InstallError;
use crate::exec::{CommandLine, CommandRunner};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Timeout for dependency resolution, which may fetch remote charts
const DEPENDENCY_TIMEOUT: Duration = Duration::from_secs(600);

/// Copies the chart template tree into the staging cache
pub struct StageChart;

impl StageChart {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StageChart {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Task for StageChart {
    fn title(&self) -> String {
        "Staging chart templates".to_string()
    }

    async fn run(
        &self,
        config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let source = config.chart_source();
        let destination = config.staged_chart();
        debug!(
            "staging chart from {} to {}",
            source.display(),
            destination.display()
        );
        fs::create_dir_all(&destination)?;
        copy_tree(&source, &destination)?;
        Ok(StepOutcome::Done)
    }
}

/// Resolves chart dependencies inside the staged copy
pub struct UpdateDependencies {
    runner: Arc<dyn CommandRunner>,
}

impl UpdateDependencies {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for UpdateDependencies {
    fn title(&self) -> String {
        "Updating chart dependencies".to_string()
    }

    async fn run(
        &self,
        config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let cmd = CommandLine::new("helm")
            .args(["dependency", "update"])
            .arg(config.staged_chart().display().to_string());
        self.runner.run_checked(&cmd, DEPENDENCY_TIMEOUT).await?;
        Ok(StepOutcome::Done)
    }
}

/// Recursively copy a directory tree, overwriting files at the destination
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let to = dst.join(entry.file_name());
        if ty.is_dir() {
            copy_tree(&entry.path(), &to)?;
        } else {
            fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}
