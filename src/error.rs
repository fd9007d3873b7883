//! Installer error taxonomy

use thiserror::Error;

/// Errors surfaced by the install/upgrade pipeline
///
/// Prerequisite and provisioning errors carry the exact remediation command
/// in their message so the operator can act without digging through docs.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("'{tool}' was not found on the PATH. {hint}")]
    MissingTool { tool: String, hint: String },

    #[error(
        "secret '{name}' was not found in namespace '{namespace}'.\nCreate it with:\n  {example}"
    )]
    MissingSecret {
        name: String,
        namespace: String,
        example: String,
    },

    #[error(
        "secret '{name}' in namespace '{namespace}' has no '{field}' field.\nRecreate it with:\n  {example}"
    )]
    InvalidSecret {
        name: String,
        namespace: String,
        field: String,
        example: String,
    },

    #[error("API group '{group}' is not registered on this cluster.\n{hint}")]
    MissingClusterFeature { group: String, hint: String },

    #[error("command timed out after {timeout_secs}s: {command}")]
    CommandTimedOut { command: String, timeout_secs: u64 },

    #[error("command failed (exit {exit_code}): {command}\nstdout: {stdout}\nstderr: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error(
        "could not query release history after a failed upgrade.\nupgrade command: {upgrade_command}\nupgrade stderr: {stderr}"
    )]
    HistoryQueryFailed {
        upgrade_command: String,
        stderr: String,
    },

    #[error("could not parse release history output: {source}")]
    HistoryParseFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "upgrade failed and the release has no recorded history to roll back to.\nupgrade command: {upgrade_command}\nupgrade stderr: {stderr}"
    )]
    NoHistory {
        upgrade_command: String,
        stderr: String,
    },

    #[error("upgrade failed again after recovery: {source}")]
    UnrecoverableAfterRetry {
        #[source]
        source: Box<InstallError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
