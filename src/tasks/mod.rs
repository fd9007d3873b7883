//! Install procedure steps

pub mod deploy;
pub mod preflight;
pub mod provision;
pub mod stage;

use crate::core::Pipeline;
use crate::exec::CommandRunner;
use std::sync::Arc;

pub use deploy::{DeployChart, ReleaseRecord, Revision};
pub use preflight::{CertManagerCheck, HelmPresent, TlsSecretCheck};
pub use provision::{ApplyManagerRbac, EnsureResource, ManagedResource};
pub use stage::{StageChart, UpdateDependencies};

/// Build the fixed install/upgrade pipeline in execution order
pub fn install_pipeline(runner: Arc<dyn CommandRunner>) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.push(HelmPresent::new(runner.clone()));
    pipeline.push(TlsSecretCheck::new(runner.clone()));
    pipeline.push(CertManagerCheck::new(runner.clone()));
    pipeline.push(EnsureResource::new(
        ManagedResource::ClusterAdminBinding,
        runner.clone(),
    ));
    pipeline.push(EnsureResource::new(
        ManagedResource::ManagerServiceAccount,
        runner.clone(),
    ));
    pipeline.push(ApplyManagerRbac::new(runner.clone()));
    pipeline.push(EnsureResource::new(
        ManagedResource::ManagerService,
        runner.clone(),
    ));
    pipeline.push(StageChart::new());
    pipeline.push(UpdateDependencies::new(runner.clone()));
    pipeline.push(DeployChart::new(runner));
    pipeline
}
