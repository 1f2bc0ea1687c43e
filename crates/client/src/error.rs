//! Error taxonomy of the remote resource client.

use serde::Deserialize;

/// Structured error body returned by the backend on failure, e.g.
/// `{"success": false, "error": "VALIDATION_ERROR", "message": "Name is required"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error name.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message, shown verbatim.
    pub message: String,
    /// Optional business-rule code for callers that special-case failures.
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorBody {
    /// A body carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: message.into(),
            code: None,
        }
    }
}

/// Coarse classification used at the controller boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transport failure, timeout, or an unstructured non-2xx response.
    Network,
    Validation,
    BusinessRule,
    NotFound,
    Unauthorized,
}

/// Errors from the remote resource client.
///
/// `Clone` so that one deduplicated in-flight fetch can hand the same
/// failure to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connection, TLS...).
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response whose body is not a structured error.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 400/422 with a structured body.
    #[error("{}", .0.message)]
    Validation(ErrorBody),

    /// Any other structured non-2xx failure, e.g. "cannot delete a
    /// department with active courses".
    #[error("{}", .body.message)]
    BusinessRule { status: u16, body: ErrorBody },

    #[error("{}", .0.message)]
    NotFound(ErrorBody),

    #[error("{}", .0.message)]
    Unauthorized(ErrorBody),

    /// A 2xx response whose payload does not match the expected schema.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// The body is parsed as an [`ErrorBody`] first; if that fails the raw
    /// text is kept so it can still be shown to the user. 401 and 404 are
    /// classified by status alone.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let fallback = |default: &str| {
            let text = body.trim();
            ErrorBody::message(if text.is_empty() { default } else { text })
        };

        match (status, parsed) {
            (401, parsed) => {
                ApiError::Unauthorized(parsed.unwrap_or_else(|| fallback("Session expired")))
            }
            (404, parsed) => ApiError::NotFound(parsed.unwrap_or_else(|| fallback("Not found"))),
            (400 | 422, Some(body)) => ApiError::Validation(body),
            (_, Some(body)) => ApiError::BusinessRule { status, body },
            (_, None) => ApiError::Http {
                status,
                body: body.to_string(),
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_)
            | ApiError::Timeout
            | ApiError::Http { .. }
            | ApiError::Decode(_) => FailureKind::Network,
            ApiError::Validation(_) => FailureKind::Validation,
            ApiError::BusinessRule { .. } => FailureKind::BusinessRule,
            ApiError::NotFound(_) => FailureKind::NotFound,
            ApiError::Unauthorized(_) => FailureKind::Unauthorized,
        }
    }

    /// Whether a read may be retried automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// The structured body, when the server sent one.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Validation(body)
            | ApiError::NotFound(body)
            | ApiError::Unauthorized(body)
            | ApiError::BusinessRule { body, .. } => Some(body),
            _ => None,
        }
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::BusinessRule { status, .. } => Some(*status),
            ApiError::Validation(_) => Some(400),
            ApiError::NotFound(_) => Some(404),
            ApiError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
