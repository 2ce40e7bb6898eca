use std::fmt;

/// Machine-readable error codes for API clients and operator tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AuthenticationRequired,
    Forbidden,
    NotFound,
    Validation,
    Internal,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "E1001",
            Self::Forbidden => "E1002",
            Self::NotFound => "E2001",
            Self::Validation => "E2002",
            Self::Internal => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "Authentication required",
            Self::Forbidden => "Insufficient authorization",
            Self::NotFound => "Not found",
            Self::Validation => "Validation failed",
            Self::Internal => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::AuthenticationRequired => {
                Some("Attach a verified identity (`--as <user>`) and retry.")
            }
            Self::Forbidden => Some("Broadcast creation requires a role above the lowest tier."),
            Self::NotFound => None,
            Self::Validation => Some("Check title, body, and id format."),
            Self::Internal => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The error taxonomy surfaced by every service operation.
///
/// Push and cache side effects never produce these: hook failures are logged
/// and swallowed at the sink boundary because the persisted recipient state
/// is the single source of truth.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No verified identity was attached to the request.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Identity present but lacks the authorization level for this action.
    #[error("role '{role}' may not {action}")]
    Forbidden { role: String, action: &'static str },

    /// Unknown message id, or the recipient holds no state entry for it.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Missing title/content or malformed id.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence or other unexpected failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// The stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AuthenticationRequired => ErrorCode::AuthenticationRequired,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::Validation,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}
