//! JSON entry point: `{"operation": name, "args": {...}}` in, envelope out.

use bytes::Bytes;
use hostshim_core::ShimError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::payload::{ByteInput, UploadItem};
use crate::{Bridge, ClientFactory, Envelope, InitConfig, Session};

/// A parsed bridge request.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    Initialize(InitConfig),
    Authenticate { email: String },
    IdentifyCurrentUser,
    ListSpaces,
    UploadSingleItem { data: ByteInput, name: String },
    UploadCollection { items: Vec<UploadItem> },
    ListUploads { cursor: Option<String>, size: Option<usize> },
    RemoveUpload { cid: String },
}

#[derive(Deserialize)]
struct RawCall {
    operation: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Deserialize)]
struct EmailArgs {
    email: String,
}

#[derive(Deserialize)]
struct UploadArgs {
    data: ByteInput,
    name: String,
}

#[derive(Deserialize)]
struct CollectionArgs {
    #[serde(alias = "files")]
    items: Vec<UploadItem>,
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    size: Option<usize>,
}

#[derive(Deserialize)]
struct CidArgs {
    cid: String,
}

fn args<T: DeserializeOwned>(operation: &str, args: serde_json::Value) -> Result<T, ShimError> {
    serde_json::from_value(args).map_err(|e| {
        ShimError::validation(format!("Invalid arguments for {}: {}", operation, e))
    })
}

/// Wire name for an operation name or alias.
fn canonical(operation: &str) -> Option<&'static str> {
    let name = match operation {
        "initialize" | "initClient" => "initialize",
        "authenticate" | "login" => "authenticate",
        "identifyCurrentUser" | "whoami" => "identifyCurrentUser",
        "listSpaces" => "listSpaces",
        "uploadSingleItem" | "uploadFile" => "uploadSingleItem",
        "uploadCollection" | "uploadDirectory" => "uploadCollection",
        "listUploads" => "listUploads",
        "removeUpload" => "removeUpload",
        _ => return None,
    };
    Some(name)
}

impl RawCall {
    fn from_json(request: serde_json::Value) -> Result<Self, ShimError> {
        let mut raw: RawCall = serde_json::from_value(request)
            .map_err(|e| ShimError::validation(format!("Malformed request: {}", e)))?;
        if raw.args.is_null() {
            raw.args = serde_json::Value::Object(Default::default());
        }
        Ok(raw)
    }

    fn operation(&self) -> Result<&'static str, ShimError> {
        canonical(&self.operation).ok_or_else(|| {
            ShimError::unsupported(format!("Unknown operation: {}", self.operation))
        })
    }
}

impl BridgeCall {
    /// Parse a JSON request. Null or missing `args` count as `{}`.
    ///
    /// # Errors
    ///
    /// A request that is not an object with a string `operation`, or whose
    /// arguments do not fit the operation, is a validation error. An unknown
    /// operation name is an unsupported-operation error.
    pub fn parse(request: serde_json::Value) -> Result<Self, ShimError> {
        let raw = RawCall::from_json(request)?;
        let op = raw.operation()?;
        Self::from_args(op, raw.args)
    }

    fn from_args(op: &'static str, raw: serde_json::Value) -> Result<Self, ShimError> {
        let call = match op {
            "initialize" => BridgeCall::Initialize(args(op, raw)?),
            "authenticate" => {
                let EmailArgs { email } = args(op, raw)?;
                BridgeCall::Authenticate { email }
            }
            "identifyCurrentUser" => BridgeCall::IdentifyCurrentUser,
            "listSpaces" => BridgeCall::ListSpaces,
            "uploadSingleItem" => {
                let UploadArgs { data, name } = args(op, raw)?;
                BridgeCall::UploadSingleItem { data, name }
            }
            "uploadCollection" => {
                let CollectionArgs { items } = args(op, raw)?;
                BridgeCall::UploadCollection { items }
            }
            "listUploads" => {
                let ListArgs { cursor, size } = args(op, raw)?;
                BridgeCall::ListUploads { cursor, size }
            }
            "removeUpload" => {
                let CidArgs { cid } = args(op, raw)?;
                BridgeCall::RemoveUpload { cid }
            }
            other => {
                return Err(ShimError::unsupported(format!(
                    "Unknown operation: {}",
                    other
                )))
            }
        };
        Ok(call)
    }
}

impl<F: ClientFactory> Bridge<F> {
    /// Run a parsed call and serialize its envelope.
    ///
    /// Upload payloads are decoded only once a client is installed.
    pub async fn dispatch(
        &self,
        session: &mut Session<F::Client>,
        call: BridgeCall,
    ) -> serde_json::Value {
        match call {
            BridgeCall::Initialize(config) => self.initialize(session, config).await.to_json(),
            BridgeCall::Authenticate { email } => {
                self.authenticate(session, &email).await.to_json()
            }
            BridgeCall::IdentifyCurrentUser => self.identify_current_user(session).await.to_json(),
            BridgeCall::ListSpaces => self.list_spaces(session).await.to_json(),
            BridgeCall::UploadSingleItem { data, name } => match session
                .require_client()
                .and_then(|_| data.into_bytes())
            {
                Ok(bytes) => self.upload_single_item(session, bytes, &name).await.to_json(),
                Err(e) => rejected("uploadSingleItem", &e),
            },
            BridgeCall::UploadCollection { items } => match session
                .require_client()
                .and_then(|_| decode_items(items))
            {
                Ok(items) => self.upload_collection(session, items).await.to_json(),
                Err(e) => rejected("uploadCollection", &e),
            },
            BridgeCall::ListUploads { cursor, size } => {
                self.list_uploads(session, cursor, size).await.to_json()
            }
            BridgeCall::RemoveUpload { cid } => self.remove_upload(session, &cid).await.to_json(),
        }
    }

    /// Parse a JSON request, run it, and return the JSON envelope.
    ///
    /// Never fails: malformed requests come back as failure envelopes too.
    /// Before `initialize`, every other known operation fails as
    /// uninitialized whatever its arguments.
    pub async fn call(
        &self,
        session: &mut Session<F::Client>,
        request: serde_json::Value,
    ) -> serde_json::Value {
        let parsed = RawCall::from_json(request).and_then(|raw| {
            let op = raw.operation()?;
            if op != "initialize" {
                session.require_client()?;
            }
            BridgeCall::from_args(op, raw.args)
        });
        match parsed {
            Ok(call) => self.dispatch(session, call).await,
            Err(e) => rejected("call", &e),
        }
    }
}

fn decode_items(items: Vec<UploadItem>) -> Result<Vec<(Bytes, String)>, ShimError> {
    items
        .into_iter()
        .map(|item| Ok((item.data.into_bytes()?, item.name)))
        .collect()
}

fn rejected(operation: &'static str, error: &ShimError) -> serde_json::Value {
    tracing::warn!(
        operation,
        kind = %error.kind(),
        error = %error,
        "bridge request rejected"
    );
    Envelope::<()>::failure(error).to_json()
}
