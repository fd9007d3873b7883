//! chartup - installs and upgrades the workbench application via its chart

pub mod cli;
pub mod core;
pub mod error;
pub mod exec;
pub mod tasks;

// Re-export commonly used types
pub use crate::core::{
    DeployContext, InstallConfig, Pipeline, StepEvent, StepOutcome, StepReport, StepStatus, Task,
};
pub use error::InstallError;
pub use exec::{CommandLine, CommandResult, CommandRunner, ProcessRunner};
pub use tasks::install_pipeline;
