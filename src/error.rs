use thiserror::Error;

/// Failures surfaced by the desk services.
///
/// Permission denials are not represented here: the route guard returns them
/// as a redirect decision.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("backend unavailable: {message}")]
    ConnectionUnavailable { message: String },

    #[error("malformed persisted value for {key}: {message}")]
    MalformedPersistedState { key: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DeskError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
        }
    }

    /// Stable code used in IPC error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::ConnectionUnavailable { .. } => "connection_unavailable",
            Self::MalformedPersistedState { .. } => "malformed_state",
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "bad_params",
            Self::NotAuthenticated => "not_authenticated",
            Self::Storage(_) => "db_query_failed",
        }
    }

    /// Whether the caller may simply retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionUnavailable { .. })
    }
}

impl From<rusqlite::Error> for DeskError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.into())
    }
}

pub type DeskResult<T> = Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DeskError::InvalidCredentials.code(), "invalid_credentials");
        assert_eq!(DeskError::unavailable("x").code(), "connection_unavailable");
        assert_eq!(
            DeskError::invalid_input("email", "missing").to_string(),
            "invalid email: missing"
        );
        assert!(DeskError::unavailable("timeout").is_retryable());
        assert!(!DeskError::InvalidCredentials.is_retryable());
    }
}
