//! Sequential task pipeline

use crate::core::{DeployContext, InstallConfig, StepReport, StepStatus, Task};
use crate::error::InstallError;
use std::time::Instant;
use tracing::{error, info};

/// Events emitted while the pipeline runs, for progress rendering
#[derive(Debug, Clone)]
pub enum StepEvent {
    Started {
        index: usize,
        total: usize,
        title: String,
    },
    Skipped {
        title: String,
    },
    Completed {
        /// Annotated title ("...done" / "...already exists")
        title: String,
        elapsed_ms: u128,
    },
    Failed {
        title: String,
        error: String,
    },
}

/// Type for event handlers
pub type EventHandler = Box<dyn Fn(&StepEvent) + Send + Sync>;

/// Ordered list of install steps, executed strictly sequentially
///
/// Step N+1 never starts until step N's async body has fully completed. The
/// pipeline aborts on the first failure; there is no partial continuation.
pub struct Pipeline {
    steps: Vec<Box<dyn Task>>,
    handlers: Vec<EventHandler>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Append a step to the end of the pipeline
    pub fn push(&mut self, task: impl Task + 'static) {
        self.steps.push(Box::new(task));
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&StepEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn emit(&self, event: &StepEvent) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    /// Execute all enabled steps in order against a fresh context
    ///
    /// Returns the per-step reports on success. The first step failure aborts
    /// the run and surfaces the step's error unchanged.
    pub async fn run(&self, config: &InstallConfig) -> Result<Vec<StepReport>, InstallError> {
        let mut ctx = DeployContext::new();
        let mut reports = Vec::with_capacity(self.steps.len());
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            let title = step.title();

            if !step.enabled(config) {
                info!("skipping step: {}", title);
                self.emit(&StepEvent::Skipped {
                    title: title.clone(),
                });
                reports.push(StepReport {
                    title,
                    status: StepStatus::Skipped,
                    elapsed: std::time::Duration::ZERO,
                });
                continue;
            }

            info!("running step {}/{}: {}", index + 1, total, title);
            self.emit(&StepEvent::Started {
                index,
                total,
                title: title.clone(),
            });

            let started = Instant::now();
            match step.run(config, &mut ctx).await {
                Ok(outcome) => {
                    let report = StepReport::annotated(&title, outcome, started.elapsed());
                    self.emit(&StepEvent::Completed {
                        title: report.title.clone(),
                        elapsed_ms: report.elapsed.as_millis(),
                    });
                    reports.push(report);
                }
                Err(e) => {
                    error!("step '{}' failed: {}", title, e);
                    self.emit(&StepEvent::Failed {
                        title: title.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        Ok(reports)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
