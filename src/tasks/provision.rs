//! Idempotent provisioning of manager-side cluster resources
//!
//! Each resource is created only if a read command says it is absent. The
//! check-then-create window is not atomic: a concurrent installer run can
//! create the resource between the two calls. The underlying CLIs offer no
//! create-if-absent primitive, so the tool assumes one invocation at a time
//! per cluster.

use crate::core::config::{
    ADMIN_ROLE_BINDING, MANAGER_SERVICE, MANAGER_SERVICE_ACCOUNT, SYSTEM_NAMESPACE,
};
use crate::core::{DeployContext, InstallConfig, StepOutcome, Task};
use crate::error::InstallError;
use crate::exec::{CommandLine, CommandRunner, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// The cluster-scoped resources provisioned before deploying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedResource {
    /// Binds the built-in admin role to the system default service account
    ClusterAdminBinding,
    /// Service account the chart manager runs under
    ManagerServiceAccount,
    /// Headless service backing the chart manager, materialized via the
    /// package manager's init command
    ManagerService,
}

impl ManagedResource {
    fn title(&self) -> String {
        match self {
            Self::ClusterAdminBinding => {
                format!("Creating cluster role binding {}", ADMIN_ROLE_BINDING)
            }
            Self::ManagerServiceAccount => {
                format!("Creating service account {}", MANAGER_SERVICE_ACCOUNT)
            }
            Self::ManagerService => format!("Creating manager service {}", MANAGER_SERVICE),
        }
    }

    fn check_command(&self) -> CommandLine {
        match self {
            Self::ClusterAdminBinding => {
                CommandLine::new("kubectl").args(["get", "clusterrolebinding", ADMIN_ROLE_BINDING])
            }
            Self::ManagerServiceAccount => CommandLine::new("kubectl")
                .args(["get", "serviceaccount", MANAGER_SERVICE_ACCOUNT])
                .args(["-n", SYSTEM_NAMESPACE]),
            Self::ManagerService => CommandLine::new("kubectl")
                .args(["get", "services", MANAGER_SERVICE])
                .args(["-n", SYSTEM_NAMESPACE]),
        }
    }

    fn create_command(&self) -> CommandLine {
        match self {
            Self::ClusterAdminBinding => CommandLine::new("kubectl")
                .args(["create", "clusterrolebinding", ADMIN_ROLE_BINDING])
                .arg("--clusterrole=cluster-admin")
                .arg(format!("--serviceaccount={}:default", SYSTEM_NAMESPACE)),
            Self::ManagerServiceAccount => CommandLine::new("kubectl")
                .args(["create", "serviceaccount", MANAGER_SERVICE_ACCOUNT])
                .args(["-n", SYSTEM_NAMESPACE]),
            Self::ManagerService => CommandLine::new("helm")
                .arg("init")
                .args(["--service-account", MANAGER_SERVICE_ACCOUNT])
                .arg("--wait"),
        }
    }
}

/// Check-then-create step for one managed resource
pub struct EnsureResource {
    resource: ManagedResource,
    runner: Arc<dyn CommandRunner>,
}

impl EnsureResource {
    pub fn new(resource: ManagedResource, runner: Arc<dyn CommandRunner>) -> Self {
        Self { resource, runner }
    }
}

#[async_trait]
impl Task for EnsureResource {
    fn title(&self) -> String {
        self.resource.title()
    }

    async fn run(
        &self,
        _config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        // The check never errors: any non-zero exit (including lookup
        // failures) reads as "absent".
        let exists = match self
            .runner
            .run(&self.resource.check_command(), DEFAULT_TIMEOUT)
            .await
        {
            Ok(result) => result.success(),
            Err(_) => false,
        };

        if exists {
            debug!("{:?} already exists, skipping creation", self.resource);
            return Ok(StepOutcome::AlreadyExists);
        }

        self.runner
            .run_checked(&self.resource.create_command(), DEFAULT_TIMEOUT)
            .await?;
        Ok(StepOutcome::Done)
    }
}

/// Applies the fixed manager RBAC manifest
///
/// Apply is declarative and safe to repeat, so no existence check precedes it.
pub struct ApplyManagerRbac {
    runner: Arc<dyn CommandRunner>,
}

impl ApplyManagerRbac {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for ApplyManagerRbac {
    fn title(&self) -> String {
        "Applying manager RBAC manifest".to_string()
    }

    async fn run(
        &self,
        config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let cmd = CommandLine::new("kubectl")
            .args(["apply", "-f"])
            .arg(config.rbac_manifest().display().to_string());
        self.runner.run_checked(&cmd, DEFAULT_TIMEOUT).await?;
        Ok(StepOutcome::Done)
    }
}
