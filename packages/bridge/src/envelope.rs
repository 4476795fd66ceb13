//! The uniform result of every bridge operation.

use hostshim_core::{ErrorKind, ShimError};
use serde::ser::{Serialize, Serializer};

/// Success with a payload, or failure with a kind and message.
///
/// Serializes flat: `{"success": true, ...payload}` or
/// `{"success": false, "error": message, "kind": kind}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure { kind: ErrorKind, error: String },
}

impl<T> Envelope<T> {
    pub fn from_result(result: Result<T, ShimError>) -> Self {
        match result {
            Ok(payload) => Envelope::Success(payload),
            Err(e) => Envelope::failure(&e),
        }
    }

    pub fn failure(error: &ShimError) -> Self {
        Envelope::Failure {
            kind: error.kind(),
            error: error.message().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Envelope::Success(payload) => Some(payload),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { error, .. } => Some(error),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serialize to a JSON object.
    ///
    /// A payload that cannot be represented in JSON turns the envelope into
    /// a validation failure.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": format!("cannot encode result: {}", e),
                "kind": ErrorKind::Validation.as_str(),
            })
        })
    }
}

#[derive(serde::Serialize)]
struct SuccessShape<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
}

#[derive(serde::Serialize)]
struct FailureShape<'a> {
    success: bool,
    error: &'a str,
    kind: ErrorKind,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(payload) => SuccessShape {
                success: true,
                payload,
            }
            .serialize(serializer),
            Envelope::Failure { kind, error } => FailureShape {
                success: false,
                error,
                kind: *kind,
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(serde::Serialize)]
    struct Uploaded {
        cid: String,
    }

    #[test]
    fn success_is_flattened() {
        let envelope = Envelope::from_result(Ok(Uploaded {
            cid: "bafy".to_string(),
        }));
        assert_eq!(envelope.to_json(), json!({"success": true, "cid": "bafy"}));
    }

    #[test]
    fn unit_success_has_only_the_flag() {
        let envelope: Envelope<()> = Envelope::Success(());
        assert_eq!(envelope.to_json(), json!({"success": true}));
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let envelope: Envelope<()> =
            Envelope::from_result(Err(ShimError::initialization("Client not initialized")));

        assert!(!envelope.is_success());
        assert_eq!(envelope.error(), Some("Client not initialized"));
        assert_eq!(envelope.kind(), Some(ErrorKind::Initialization));
        assert_eq!(
            envelope.to_json(),
            json!({
                "success": false,
                "error": "Client not initialized",
                "kind": "InitializationError",
            })
        );
    }

    #[test]
    fn unencodable_payload_becomes_failure() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1);
        let envelope = Envelope::Success(map);

        let json = envelope.to_json();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "ValidationError");
    }
}
