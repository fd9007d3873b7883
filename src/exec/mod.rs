//! External command execution

pub mod runner;

pub use runner::{CommandLine, CommandResult, CommandRunner, ProcessRunner, DEFAULT_TIMEOUT};
