use scopelint_types::ExitStatus;
use thiserror::Error;

/// Fatal errors that end a run before or instead of producing a report.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("fatal: Not a git repository")]
    NotARepository,

    /// One message per problem, in argument order.
    #[error("{}", .messages.join("\n"))]
    InvalidFiles { messages: Vec<String> },

    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("{0:#}")]
    Runtime(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NotARepository => ExitStatus::NotARepository.code(),
            CliError::InvalidFiles { .. } => ExitStatus::InvalidInput.code(),
            CliError::Config(_) | CliError::Runtime(_) => 1,
        }
    }
}
