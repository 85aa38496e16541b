use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Everything the client can fail with.
///
/// `Clone` because a single refresh outcome is handed to every caller that
/// waited on it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("No access token found")]
    NotAuthenticated,
    #[error("Session expired, please log in again")]
    SessionExpired,
    #[error("Failed to refresh token: {0}")]
    RefreshFailed(String),
    #[error("Request failed: {0}")]
    Network(String),
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        body: Option<Value>,
    },
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Session storage unavailable: {0}")]
    Storage(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Builds the error for a non-success response, preferring the message
    /// the backend put in the body.
    pub fn from_status(status: StatusCode, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(body_message)
            .unwrap_or_else(|| fallback_message(status).to_string());
        ApiError::Http {
            status,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller should send the user back to a login surface.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated | ApiError::SessionExpired)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else if error.is_builder() {
            ApiError::InvalidRequest(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

impl From<ApiError> for String {
    fn from(error: ApiError) -> Self {
        error.to_string()
    }
}

fn body_message(body: &Value) -> Option<String> {
    ["error", "message", "detail"].iter().find_map(|key| {
        body.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn fallback_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Invalid request. Please check your input.",
        401 => "Invalid credentials. Please check your email and password.",
        403 => "Access denied. Your account may be disabled.",
        404 => "Not found.",
        409 => "Email already exists. Please use a different email.",
        s if s >= 500 => "Server error. Please try again later.",
        _ => "An unexpected error occurred",
    }
}
