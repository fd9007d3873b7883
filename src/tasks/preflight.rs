//! Prerequisite checks - read-only predicates over cluster and tool state

use crate::core::config::{
    CERT_MANAGER_API_GROUP, TLS_SECRET, TLS_SECRET_FIELD,
};
use crate::core::{DeployContext, InstallConfig, StepOutcome, Task};
use crate::error::InstallError;
use crate::exec::{CommandLine, CommandRunner, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use tracing::debug;

/// Verifies the deployment tool binary is resolvable
pub struct HelmPresent {
    runner: Arc<dyn CommandRunner>,
}

impl HelmPresent {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for HelmPresent {
    fn title(&self) -> String {
        "Verifying helm is installed".to_string()
    }

    async fn run(
        &self,
        _config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        // Client-only version query: proves the binary resolves without
        // touching the cluster.
        let cmd = CommandLine::new("helm").args(["version", "--client"]);
        let present = match self.runner.run(&cmd, DEFAULT_TIMEOUT).await {
            Ok(result) => result.success(),
            Err(_) => false,
        };
        if !present {
            return Err(InstallError::MissingTool {
                tool: "helm".to_string(),
                hint: "Install it from https://helm.sh/docs/intro/install/ and re-run."
                    .to_string(),
            });
        }
        Ok(StepOutcome::Done)
    }
}

/// Verifies the TLS secret exists and carries the contact email
///
/// Only runs when TLS is requested. On success the decoded email is written
/// into the deploy context for the certificate overrides of the upgrade
/// command.
pub struct TlsSecretCheck {
    runner: Arc<dyn CommandRunner>,
}

impl TlsSecretCheck {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn creation_example(namespace: &str) -> String {
        format!(
            "kubectl create secret generic {} --from-literal={}=admin@example.com -n {}",
            TLS_SECRET, TLS_SECRET_FIELD, namespace
        )
    }
}

#[async_trait]
impl Task for TlsSecretCheck {
    fn title(&self) -> String {
        format!("Checking TLS secret {}", TLS_SECRET)
    }

    fn enabled(&self, config: &InstallConfig) -> bool {
        config.tls
    }

    async fn run(
        &self,
        config: &InstallConfig,
        ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let cmd = CommandLine::new("kubectl")
            .args(["get", "secret", TLS_SECRET])
            .args(["-n", &config.namespace])
            .args(["-o", "json"]);
        let result = self.runner.run(&cmd, DEFAULT_TIMEOUT).await?;
        if !result.success() {
            return Err(InstallError::MissingSecret {
                name: TLS_SECRET.to_string(),
                namespace: config.namespace.clone(),
                example: Self::creation_example(&config.namespace),
            });
        }

        let invalid = || InstallError::InvalidSecret {
            name: TLS_SECRET.to_string(),
            namespace: config.namespace.clone(),
            field: TLS_SECRET_FIELD.to_string(),
            example: Self::creation_example(&config.namespace),
        };

        // Secret data values are base64-encoded by the API server.
        let secret: serde_json::Value =
            serde_json::from_str(&result.stdout).map_err(|_| invalid())?;
        let encoded = secret["data"][TLS_SECRET_FIELD]
            .as_str()
            .ok_or_else(invalid)?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| invalid())?;
        let email = String::from_utf8(decoded).map_err(|_| invalid())?;

        debug!("TLS contact email resolved from secret {}", TLS_SECRET);
        ctx.tls_email = Some(email.trim().to_string());
        Ok(StepOutcome::Done)
    }
}

/// Verifies the cert-manager API group is registered on the cluster
///
/// Only runs when TLS is requested.
pub struct CertManagerCheck {
    runner: Arc<dyn CommandRunner>,
}

impl CertManagerCheck {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Task for CertManagerCheck {
    fn title(&self) -> String {
        "Checking cert-manager support".to_string()
    }

    fn enabled(&self, config: &InstallConfig) -> bool {
        config.tls
    }

    async fn run(
        &self,
        _config: &InstallConfig,
        _ctx: &mut DeployContext,
    ) -> Result<StepOutcome, InstallError> {
        let cmd = CommandLine::new("kubectl").arg("api-versions");
        let result = self.runner.run_checked(&cmd, DEFAULT_TIMEOUT).await?;

        let registered = result
            .stdout
            .lines()
            .any(|line| line.trim().starts_with(CERT_MANAGER_API_GROUP));
        if !registered {
            return Err(InstallError::MissingClusterFeature {
                group: CERT_MANAGER_API_GROUP.to_string(),
                hint: "Install cert-manager first:\n  \
                       kubectl create namespace cert-manager\n  \
                       kubectl apply -f https://github.com/jetstack/cert-manager/releases/download/v0.8.1/cert-manager.yaml"
                    .to_string(),
            });
        }
        Ok(StepOutcome::Done)
    }
}
