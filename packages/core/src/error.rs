//! Error taxonomy shared by every layer of the shim.

use serde::Serialize;
use thiserror::Error;

/// Classification of a failure, as reported across the sandbox boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The storage capability has not been installed yet.
    #[serde(rename = "InitializationError")]
    Initialization,
    /// A named resource (space, database, object store) is absent.
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// Malformed input.
    #[serde(rename = "ValidationError")]
    Validation,
    /// A precondition on the current state was violated.
    #[serde(rename = "StateError")]
    State,
    /// The shim intentionally does not implement this capability.
    #[serde(rename = "UnsupportedOperationError")]
    Unsupported,
    /// Failure raised by the storage capability itself.
    #[serde(rename = "CapabilityError")]
    Capability,
}

impl ErrorKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Initialization => "InitializationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::State => "StateError",
            ErrorKind::Unsupported => "UnsupportedOperationError",
            ErrorKind::Capability => "CapabilityError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the shim.
///
/// The display form is the bare message: it is what ends up in the `error`
/// field of a failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShimError {
    #[error("{0}")]
    Initialization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    State(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Capability(String),
}

impl ShimError {
    pub fn initialization(message: impl Into<String>) -> Self {
        ShimError::Initialization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ShimError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ShimError::Validation(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        ShimError::State(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ShimError::Unsupported(message.into())
    }

    pub fn capability(message: impl Into<String>) -> Self {
        ShimError::Capability(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShimError::Initialization(_) => ErrorKind::Initialization,
            ShimError::NotFound(_) => ErrorKind::NotFound,
            ShimError::Validation(_) => ErrorKind::Validation,
            ShimError::State(_) => ErrorKind::State,
            ShimError::Unsupported(_) => ErrorKind::Unsupported,
            ShimError::Capability(_) => ErrorKind::Capability,
        }
    }

    /// The message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            ShimError::Initialization(m)
            | ShimError::NotFound(m)
            | ShimError::Validation(m)
            | ShimError::State(m)
            | ShimError::Unsupported(m)
            | ShimError::Capability(m) => m,
        }
    }
}

/// Result type alias for shim operations.
pub type Result<T> = std::result::Result<T, ShimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_message() {
        let e = ShimError::initialization("Client not initialized");
        assert_eq!(e.to_string(), "Client not initialized");
        assert_eq!(e.message(), "Client not initialized");
    }

    #[test]
    fn kinds_match_variants() {
        assert_eq!(ShimError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(ShimError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(ShimError::state("x").kind(), ErrorKind::State);
        assert_eq!(ShimError::unsupported("x").kind(), ErrorKind::Unsupported);
        assert_eq!(ShimError::capability("x").kind(), ErrorKind::Capability);
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(ErrorKind::Unsupported.to_string(), "UnsupportedOperationError");
        let json = serde_json::to_value(ErrorKind::Initialization).unwrap();
        assert_eq!(json, serde_json::json!("InitializationError"));
    }
}
