//! Fetch error exposed through table state

use std::fmt;

use super::SourceError;

/// Message shown when the backend could not be reached at all.
pub const TRANSPORT_MESSAGE: &str = "The server could not be reached. Check your connection and retry.";

/// Broad category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network failure, timeout or unusable endpoint.
    Transport,
    /// Non-2xx response from the backend.
    Backend,
    /// 401/403 response; also reported to the session guard.
    Unauthorized,
    /// The response arrived but could not be decoded into rows.
    Decode,
}

/// A failed fetch as stored in [`FetchState`](crate::fetch::FetchState).
///
/// Unlike [`SourceError`] this is `Clone` and carries only what a renderer
/// needs to present the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    /// Failure category.
    pub kind: FetchErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Machine error code from the backend, if any.
    pub code: Option<String>,
    /// HTTP status, if the backend answered.
    pub status: Option<u16>,
}

impl FetchError {
    /// Creates a new error of the given kind.
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status: None,
        }
    }

    /// Returns `true` for 401/403 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == FetchErrorKind::Unauthorized
    }
}

impl From<&SourceError> for FetchError {
    fn from(err: &SourceError) -> Self {
        match err {
            SourceError::Http {
                status,
                message,
                code,
            } => {
                let kind = if matches!(status, 401 | 403) {
                    FetchErrorKind::Unauthorized
                } else {
                    FetchErrorKind::Backend
                };
                let message = if message.trim().is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    message.clone()
                };
                Self {
                    kind,
                    message,
                    code: code.clone(),
                    status: Some(*status),
                }
            }
            SourceError::Network(_) | SourceError::Timeout(_) | SourceError::InvalidUrl(_) => {
                let mut error = Self::new(FetchErrorKind::Transport, TRANSPORT_MESSAGE);
                error.status = err.status_code();
                error
            }
            SourceError::Parse { message, .. } => Self::new(
                FetchErrorKind::Decode,
                format!("The server response could not be read: {}", message),
            ),
        }
    }
}

impl From<SourceError> for FetchError {
    fn from(err: SourceError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for FetchError {}
