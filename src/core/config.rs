//! Installation configuration loaded from YAML and/or CLI flags

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Namespace holding the chart-manager components
pub const SYSTEM_NAMESPACE: &str = "kube-system";

/// Service account the chart manager runs under
pub const MANAGER_SERVICE_ACCOUNT: &str = "tiller";

/// Headless service backing the chart manager
pub const MANAGER_SERVICE: &str = "tiller-deploy";

/// Cluster role binding granting the default service account admin rights
pub const ADMIN_ROLE_BINDING: &str = "add-cluster-admin";

/// Chart location relative to the templates directory
pub const CHART_SUBPATH: &str = "helm/workbench";

/// Manager RBAC manifest relative to the templates directory
pub const MANAGER_RBAC_MANIFEST: &str = "helm/manager-rbac.yaml";

/// Secret carrying the TLS contact email, looked up in the target namespace
pub const TLS_SECRET: &str = "workbench-tls";

/// Required data field inside the TLS secret
pub const TLS_SECRET_FIELD: &str = "email";

/// API group that must be registered when TLS is requested
pub const CERT_MANAGER_API_GROUP: &str = "certmanager.k8s.io";

/// Immutable description of one install/upgrade invocation
///
/// Supplied once at pipeline start and never mutated; mutable per-run state
/// lives in [`crate::core::DeployContext`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Target namespace for the release
    pub namespace: String,

    /// Release name tracked by the package manager
    pub release: String,

    /// Server image deployed by the chart
    pub image: String,

    /// Ingress domain the application is exposed under
    pub domain: String,

    /// Deploy the multi-tenant variant of the chart
    pub multi_tenant: bool,

    /// Terminate ingress traffic with TLS certificates
    pub tls: bool,

    /// Plugin registry the deployed application points at
    pub plugin_registry_url: String,

    /// Stack registry the deployed application points at
    pub stack_registry_url: String,

    /// Source tree holding the chart templates (never written to)
    pub templates_dir: PathBuf,

    /// Working directory the chart is staged into before deploying
    pub cache_dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            namespace: "workbench".to_string(),
            release: "workbench".to_string(),
            image: "ghcr.io/workbench/workbench-server:latest".to_string(),
            domain: String::new(),
            multi_tenant: false,
            tls: false,
            plugin_registry_url: "https://plugins.workbench.io/v3".to_string(),
            stack_registry_url: "https://stacks.workbench.io/v3".to_string(),
            templates_dir: PathBuf::from("templates"),
            cache_dir: default_cache_dir(),
        }
    }
}

impl InstallConfig {
    /// Load a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse install configuration")
    }

    /// Chart directory inside the source templates tree
    pub fn chart_source(&self) -> PathBuf {
        self.templates_dir.join(CHART_SUBPATH)
    }

    /// Chart directory inside the staging cache
    pub fn staged_chart(&self) -> PathBuf {
        self.cache_dir.join(CHART_SUBPATH)
    }

    /// Manager RBAC manifest inside the source templates tree
    pub fn rbac_manifest(&self) -> PathBuf {
        self.templates_dir.join(MANAGER_RBAC_MANIFEST)
    }
}

/// Default staging root, under the user cache directory
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chartup")
        .join("templates")
}
