//! Test utility functions for the install pipeline

use async_trait::async_trait;
use chartup::{CommandLine, CommandResult, CommandRunner, InstallConfig, InstallError};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Successful command result with the given stdout
pub fn ok(stdout: &str) -> CommandResult {
    CommandResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
        timed_out: false,
    }
}

/// Failed command result with the given exit code and stderr
pub fn fail(exit_code: i32, stderr: &str) -> CommandResult {
    CommandResult {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
        timed_out: false,
    }
}

/// Timed-out command result
pub fn timed_out() -> CommandResult {
    CommandResult {
        exit_code: -1,
        stdout: String::new(),
        stderr: String::new(),
        timed_out: true,
    }
}

/// Mock runner that serves scripted results in order and records every
/// command line it was asked to run
///
/// When the script is exhausted it keeps returning empty successes, so tests
/// only script the calls whose results matter.
pub struct MockRunner {
    responses: Mutex<VecDeque<CommandResult>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(responses: Vec<CommandResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls_starting_with(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn has_call_containing(&self, needle: &str) -> bool {
        self.calls().iter().any(|call| call.contains(needle))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        cmd: &CommandLine,
        _timeout: Duration,
    ) -> Result<CommandResult, InstallError> {
        self.calls.lock().unwrap().push(cmd.to_string());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok("")))
    }
}

/// Configuration pointing at throwaway paths, with a domain set
pub fn test_config(templates_dir: &Path, cache_dir: &Path) -> InstallConfig {
    InstallConfig {
        domain: "apps.example.com".to_string(),
        templates_dir: templates_dir.to_path_buf(),
        cache_dir: cache_dir.to_path_buf(),
        ..Default::default()
    }
}

/// `ops@example.com`, base64-encoded as the API server stores secret data
pub const ENCODED_EMAIL: &str = "b3BzQGV4YW1wbGUuY29t";

/// Secret payload as returned by `kubectl get secret -o json`
pub fn tls_secret_json() -> String {
    format!(r#"{{"apiVersion":"v1","kind":"Secret","data":{{"email":"{}"}}}}"#, ENCODED_EMAIL)
}
