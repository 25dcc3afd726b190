use thiserror::Error;

/// An external program could not be launched (missing binary, permission denied).
///
/// A program that runs and exits non-zero is *not* an execution error; most
/// linters signal findings that way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Could not execute \"{command}\".\nMake sure all required programs are installed")]
pub struct ExecutionError {
    /// The full command line, program first.
    pub command: String,
    /// The OS-level reason, kept for logs.
    pub reason: String,
}
