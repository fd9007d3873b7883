//! CLI command definitions

use crate::core::InstallConfig;
use anyhow::{ensure, Result};
use clap::Args;
use std::path::PathBuf;

/// Install or upgrade the application
#[derive(Debug, Args, Clone)]
pub struct DeployCommand {
    /// Path to an install configuration YAML file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Target namespace for the release
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Release name
    #[arg(long)]
    pub release: Option<String>,

    /// Server image to deploy
    #[arg(short, long)]
    pub image: Option<String>,

    /// Ingress domain the application is exposed under
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Deploy the multi-tenant variant of the chart
    #[arg(long)]
    pub multi_tenant: bool,

    /// Terminate ingress traffic with TLS certificates
    #[arg(long)]
    pub tls: bool,

    /// Plugin registry URL override
    #[arg(long)]
    pub plugin_registry_url: Option<String>,

    /// Stack registry URL override
    #[arg(long)]
    pub stack_registry_url: Option<String>,

    /// Source directory holding the chart templates
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Staging directory for the chart copy
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

impl DeployCommand {
    /// Build the effective configuration: file values first, flags win
    pub fn resolve(&self) -> Result<InstallConfig> {
        let mut config = match &self.file {
            Some(path) => InstallConfig::from_file(path)?,
            None => InstallConfig::default(),
        };

        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(release) = &self.release {
            config.release = release.clone();
        }
        if let Some(image) = &self.image {
            config.image = image.clone();
        }
        if let Some(domain) = &self.domain {
            config.domain = domain.clone();
        }
        if self.multi_tenant {
            config.multi_tenant = true;
        }
        if self.tls {
            config.tls = true;
        }
        if let Some(url) = &self.plugin_registry_url {
            config.plugin_registry_url = url.clone();
        }
        if let Some(url) = &self.stack_registry_url {
            config.stack_registry_url = url.clone();
        }
        if let Some(templates) = &self.templates {
            config.templates_dir = templates.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }

        ensure!(
            !config.domain.is_empty(),
            "an ingress domain is required (--domain or 'domain' in the config file)"
        );
        Ok(config)
    }
}

/// Validate an install configuration file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to an install configuration YAML file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output the resolved configuration in JSON format
    #[arg(long)]
    pub json: bool,
}
