//! Errors raised by filters and the pipeline.

use thiserror::Error;

/// Filter construction and processing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A parameter violated its contract when the filter was built.
    #[error("invalid parameter for {filter}: {reason}")]
    InvalidParameter {
        filter: &'static str,
        reason: String,
    },

    /// The filter was handed a frame it cannot process.
    #[error("{filter} cannot process frame: {reason}")]
    IncompatibleFrame {
        filter: &'static str,
        reason: String,
    },
}

impl FilterError {
    pub(crate) fn invalid(filter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            filter,
            reason: reason.into(),
        }
    }

    pub(crate) fn incompatible(filter: &'static str, reason: impl Into<String>) -> Self {
        Self::IncompatibleFrame {
            filter,
            reason: reason.into(),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FilterError>;
