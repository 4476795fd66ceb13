//! The storage client capability the bridge delegates to.

use async_trait::async_trait;
use hostshim_core::{NamedBinaryContainer, ShimError};
use serde::{Deserialize, Serialize};

/// An upload destination known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub did: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registered: bool,
}

impl SpaceInfo {
    pub fn new(did: impl Into<String>, name: impl Into<String>, registered: bool) -> Self {
        Self {
            did: did.into(),
            name: name.into(),
            registered,
        }
    }
}

/// Paging options for [`StorageClient::list_uploads`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub cursor: Option<String>,
    pub size: Option<usize>,
}

/// One upload: its root identifier and the shards holding its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub root: String,
    #[serde(default)]
    pub shards: Vec<String>,
}

/// A page of uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPage {
    pub results: Vec<UploadRecord>,
    /// Where the next page starts, if there is one.
    pub cursor: Option<String>,
    pub size: usize,
}

/// A storage client, as seen by the bridge.
///
/// The bridge never looks behind this trait; any client that can answer
/// these calls can be installed.
#[async_trait(?Send)]
pub trait StorageClient {
    async fn login(&self, email: &str) -> Result<(), ShimError>;

    /// Identifiers of the accounts the client is logged in to.
    fn accounts(&self) -> Result<Vec<String>, ShimError>;

    fn spaces(&self) -> Result<Vec<SpaceInfo>, ShimError>;

    async fn set_current_space(&self, did: &str) -> Result<(), ShimError>;

    /// Upload one file, returning its content identifier.
    async fn upload_file(&self, file: NamedBinaryContainer) -> Result<String, ShimError>;

    /// Upload files as one directory, returning the root identifier.
    async fn upload_directory(&self, files: Vec<NamedBinaryContainer>)
        -> Result<String, ShimError>;

    async fn list_uploads(&self, options: ListOptions) -> Result<UploadPage, ShimError>;

    async fn remove(&self, cid: &str) -> Result<(), ShimError>;
}

/// Creates storage clients for `initialize`.
#[async_trait(?Send)]
pub trait ClientFactory {
    type Client: StorageClient;

    /// Create a client. `store_config` is passed through from the
    /// initialize call untouched.
    async fn create(
        &self,
        store_config: Option<&serde_json::Value>,
    ) -> Result<Self::Client, ShimError>;
}
