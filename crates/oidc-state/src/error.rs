//! Error types for the login session store.
//!
//! Uses `thiserror` for a closed taxonomy the HTTP layer maps onto OAuth error codes.

/// Errors from session store operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown, already consumed, or expired session
    #[error("Session not found")]
    NotFound,

    /// Malformed arguments or an operation invalid for the session's state
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput {
        /// Field or aspect that was rejected
        field: String,
        /// Validation error message
        message: String,
    },

    /// Identifier generation kept colliding with live sessions
    #[error("Could not allocate a unique session identifier after {attempts} attempts")]
    Conflict {
        /// Number of generation attempts made
        attempts: usize,
    },
}

impl SessionError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), message: message.into() }
    }

    /// Returns true if the caller should answer with a client error rather than a server error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::InvalidInput { .. })
    }

    /// OAuth 2.0 `error` code for this failure (RFC 6749 §5.2).
    #[must_use]
    pub const fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "invalid_grant",
            Self::InvalidInput { .. } => "invalid_request",
            Self::Conflict { .. } => "server_error",
        }
    }
}

/// Result type alias for session store operations.
pub type SessionResult<T> = Result<T, SessionError>;
