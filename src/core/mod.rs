//! Core domain models

pub mod config;
pub mod context;
pub mod pipeline;
pub mod step;

pub use config::InstallConfig;
pub use context::DeployContext;
pub use pipeline::{Pipeline, StepEvent};
pub use step::{StepOutcome, StepReport, StepStatus, Task};
