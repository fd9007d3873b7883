//! Deploy context - mutable state shared across one pipeline run

/// Scratch state created at pipeline start and discarded at pipeline end
///
/// Fields are statically known and written once by the step that produces
/// them. Execution is strictly sequential, so no synchronization is needed.
#[derive(Debug, Clone, Default)]
pub struct DeployContext {
    /// TLS contact email, read from the TLS secret by the prerequisite step
    /// and consumed by the deploy step's certificate overrides
    pub tls_email: Option<String>,
}

impl DeployContext {
    pub fn new() -> Self {
        Self::default()
    }
}
