use thiserror::Error;

/// Why an authentication attempt failed.
///
/// Deliberately collapsed into one generic message in user-facing output so
/// callers cannot probe which accounts exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    UserNotFound,
    BadCredential,
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid credentials")]
    Auth(AuthFailure),

    /// Opaque passthrough of a backing-store failure.
    #[error("backing store error: {0}")]
    Store(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
