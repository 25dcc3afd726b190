//! Error types for scopelint-domain.
//!
//! - `InvalidArgument` is raised by user input checks before any file is processed.
//! - `Config` and `Template` describe malformed rule definitions; both are fatal at startup.
//! - `Pattern` is an output pattern that fails to compile for a particular file.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("invalid template {template:?}: {message}")]
    Template { template: String, message: String },

    #[error("invalid output pattern: {message}")]
    Pattern { message: String },
}

impl DomainError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DomainError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        DomainError::Config {
            message: message.into(),
        }
    }

    /// True for errors caused by the rule definitions rather than the command line.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DomainError::Config { .. } | DomainError::Template { .. } | DomainError::Pattern { .. }
        )
    }
}
