use hostshim_core::{ErrorKind, ShimError};
use thiserror::Error;

/// Failures of the key-value emulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    #[error("Database {0} not found")]
    DatabaseNotFound(String),

    #[error("Object store {0} is not in the transaction scope")]
    StoreNotInScope(String),

    #[error("Requested version {requested} is lower than the current version {current}")]
    VersionDowngrade { requested: u64, current: u64 },

    #[error("Version must be at least 1")]
    InvalidVersion,

    #[error("Cannot {0} in a read-only transaction")]
    ReadOnly(&'static str),

    #[error("Upgrade failed: {0}")]
    Upgrade(String),
}

impl KvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KvError::DatabaseNotFound(_) | KvError::StoreNotInScope(_) => ErrorKind::NotFound,
            KvError::VersionDowngrade { .. } | KvError::InvalidVersion => ErrorKind::Validation,
            KvError::ReadOnly(_) | KvError::Upgrade(_) => ErrorKind::State,
        }
    }
}

impl From<KvError> for ShimError {
    fn from(error: KvError) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::Initialization => ShimError::initialization(message),
            ErrorKind::NotFound => ShimError::not_found(message),
            ErrorKind::Validation => ShimError::validation(message),
            ErrorKind::State => ShimError::state(message),
            ErrorKind::Unsupported => ShimError::unsupported(message),
            ErrorKind::Capability => ShimError::capability(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_matching_kind() {
        let err: ShimError = KvError::DatabaseNotFound("uploads".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Database uploads not found");

        let err: ShimError = KvError::ReadOnly("put").into();
        assert_eq!(err.kind(), ErrorKind::State);

        let err: ShimError = KvError::VersionDowngrade {
            requested: 1,
            current: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
