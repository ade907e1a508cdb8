//! Block-level error type.

use thiserror::Error;

/// Errors returned by a block invocation.
///
/// None of these are retried: the engine aborts the whole run on the first
/// block failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlockError {
    /// A required argument was not supplied.
    #[error("missing argument '{0}'")]
    MissingArgument(String),

    /// An argument was supplied but has the wrong type or an illegal value.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// Any other failure raised by the block itself.
    #[error("block failed: {0}")]
    Failed(String),
}

impl BlockError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}
