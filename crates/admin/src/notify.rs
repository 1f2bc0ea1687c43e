//! Notification collaborator.
//!
//! Controllers report every mutation outcome and every failed read through
//! a [`Notifier`]. Rendering is up to the implementation.

use campus_client::ApiError;
use campus_core::models::describe_validation_errors;

use crate::error::AdminError;

/// Description used when a failure carries nothing worth showing.
pub const TRY_AGAIN: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success".into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    /// Build an error notification. Never fails, whatever the body of the
    /// underlying response looked like.
    pub fn from_error(err: &AdminError) -> Self {
        match err {
            AdminError::Api(api) => Self::error(describe_api_error(api)),
            AdminError::FormInvalid(errors) => {
                Self::error(describe_validation_errors(errors).join("; "))
            }
            other => Self::error(other.to_string()),
        }
    }
}

/// Human-readable description of an API failure.
///
/// Structured bodies show their `message` verbatim, unstructured non-2xx
/// bodies show their raw text, and transport failures ask to try again.
pub fn describe_api_error(err: &ApiError) -> String {
    match err {
        ApiError::Http { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
        ApiError::Http { .. } | ApiError::Decode(_) => TRY_AGAIN.to_string(),
        ApiError::Transport(_) | ApiError::Timeout => {
            "Network error. Please check your connection and try again.".to_string()
        }
        ApiError::Validation(body)
        | ApiError::NotFound(body)
        | ApiError::Unauthorized(body)
        | ApiError::BusinessRule { body, .. } => body.message.clone(),
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as log lines.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            Variant::Default => tracing::info!(title = %n.title, "{}", n.description),
            Variant::Destructive => tracing::warn!(title = %n.title, "{}", n.description),
        }
    }
}
