//! Deployment executor and failure recovery
//!
//! The upgrade-or-install attempt is the only step with local recovery: on a
//! failed attempt the release history decides between purging the release
//! (first revision ever, nothing to roll back to) and rolling back to the
//! latest recorded revision, after which the original command is re-run
//! exactly once. The read-history-then-decide window races against concurrent
//! installers touching the same release; the tool assumes one invocation at a
//! time per release.

use crate::core::{DeployContext, InstallConfig, StepOutcome, Task};
use crate::error::InstallError;
use crate::exec::{CommandLine, CommandRunner, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for the upgrade-or-install command, which waits on rollouts
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(600);

/// Release revision identifier, tolerating both number and string encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the first revision ever recorded for the release
    pub fn is_first(&self) -> bool {
        self.0 == "1"
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(n) => Ok(Revision(n.to_string())),
            serde_json::Value::String(s) => Ok(Revision(s)),
            other => Err(serde::de::Error::custom(format!(
                "revision must be a number or string, got {}",
                other
            ))),
        }
    }
}

/// One entry of the release history, most-recent-first
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseRecord {
    pub revision: Revision,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Runs the upgrade-or-install command with one-shot failure recovery
pub struct DeployChart {
    runner: Arc<dyn CommandRunner>,
}

impl DeployChart {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Compose the upgrade-or-install command from the configuration
    ///
    /// The multi-tenant values file is included only in multi-tenant mode;
    /// the TLS values file and certificate overrides only when TLS is
    /// requested, with the contact email read from the deploy context.
    pub fn upgrade_command(config: &InstallConfig, ctx: &DeployContext) -> CommandLine {
        let chart = config.staged_chart();
        let mut cmd = CommandLine::new("helm")
            .args(["upgrade", "--install", &config.release])
            .args(["--namespace", &config.namespace])
            .args(["--set", &format!("global.ingressDomain={}", config.domain)])
            .args(["--set", &format!("workbenchImage={}", config.image)])
            .args([
                "--set",
                &format!("global.workspacesNamespace={}", config.namespace),
            ])
            .args([
                "--set",
                &format!("global.pluginRegistryUrl={}", config.plugin_registry_url),
            ])
            .args([
                "--set",
                &format!("global.stackRegistryUrl={}", config.stack_registry_url),
            ]);

        if config.multi_tenant {
            cmd = cmd
                .arg("-f")
                .arg(chart.join("values/multi-tenant.yaml").display().to_string());
        }

        if config.tls {
            cmd = cmd.args(["--set", &format!("certManager.domain={}", config.domain)]);
            if let Some(email) = &ctx.tls_email {
                cmd = cmd.args(["--set", &format!("certManager.email={}", email)]);
            }
            cmd = cmd
                .arg("-f")
                .arg(chart.join("values/tls.yaml").display().to_string());
        }

        cmd.arg(chart.display().to_string())
    }

    /// Inspect release history and purge or roll back before the retry
    async fn recover(
        &self,
        config: &InstallConfig,
        upgrade_cmd: &CommandLine,
        failed_stderr: &str,
    ) -> Result<(), InstallError> {
        let history_cmd = CommandLine::new("helm")
            .args(["history", &config.release])
            .args(["--output", "json"]);
        let history = self.runner.run(&history_cmd, DEFAULT_TIMEOUT).await?;
        if !history.success() {
            return Err(InstallError::HistoryQueryFailed {
                upgrade_command: upgrade_cmd.to_string(),
                stderr: failed_stderr.to_string(),
            });
        }

        let entries: Vec<ReleaseRecord> = serde_json::from_str(&history.stdout)
            .map_err(|source| InstallError::HistoryParseFailed { source })?;

        let latest = match entries.first() {
            // Nothing recorded at all: no revision to roll back to and
            // nothing to purge. Surface the original failure to the operator.
            None => {
                return Err(InstallError::NoHistory {
                    upgrade_command: upgrade_cmd.to_string(),
                    stderr: failed_stderr.to_string(),
                });
            }
            Some(latest) => latest,
        };

        if latest.is_first_revision() {
            // The only revision ever recorded is the failed first install:
            // nothing good to roll back to, so delete the release entirely.
            // Purge failure is advisory; the retry will tell us either way.
            info!("release {} has no prior good revision, purging", config.release);
            let purge_cmd = CommandLine::new("helm")
                .args(["delete", &config.release])
                .arg("--purge");
            match self.runner.run(&purge_cmd, DEFAULT_TIMEOUT).await {
                Ok(result) if !result.success() => {
                    warn!(
                        "purge of release {} failed (exit {}): {}",
                        config.release,
                        result.exit_code,
                        result.stderr.trim()
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("purge of release {} failed: {}", config.release, e),
            }
        } else {
            info!(
                "rolling back release {} to revision {}",
                config.release,
                latest.revision.as_str()
            );
            let rollback_cmd = CommandLine::new("helm")
                .args(["rollback", &config.release, latest.revision.as_str()]);
            self.runner.run_checked(&rollback_cmd, DEFAULT_TIMEOUT).await?;
        }

        Ok(())
    }
}

impl ReleaseRecord {
    fn is_first_revision(&self) -> bool {
        self.revision.is_first()
    }
}

#[async_trait]
impl Task for DeployChart {
    fn title(&self) -> String {
        "Deploying workbench chart".to_string()
    }

    async fn run(
        &self,
        config: &InstallConfig,
        ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let cmd = Self::upgrade_command(config, ctx);
        debug!("upgrade command: {}", cmd);

        let first = self.runner.run(&cmd, UPGRADE_TIMEOUT).await?;
        if first.success() {
            return Ok(StepOutcome::Done);
        }

        warn!(
            "upgrade of release {} failed (exit {}), attempting recovery",
            config.release, first.exit_code
        );
        self.recover(config, &cmd, &first.stderr).await?;

        // One retry with the identical command; a second failure is fatal.
        self.runner
            .run_checked(&cmd, UPGRADE_TIMEOUT)
            .await
            .map_err(|e| InstallError::UnrecoverableAfterRetry {
                source: Box::new(e),
            })?;
        Ok(StepOutcome::Done)
    }
}
