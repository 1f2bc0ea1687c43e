//! Error type of the page controllers.

use campus_client::ApiError;
use campus_core::error::CoreError;

/// Errors surfaced by page controllers.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Field-level validation failed; the form stays open.
    #[error("Form is invalid: {0}")]
    FormInvalid(#[from] validator::ValidationErrors),

    /// A submission for the same form or dialog is still in flight.
    #[error("A submission is already in progress")]
    Busy,

    /// The page was disposed while the operation was pending.
    #[error("Page was closed")]
    Cancelled,
}

impl AdminError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            AdminError::Api(e) => Some(e),
            _ => None,
        }
    }
}
