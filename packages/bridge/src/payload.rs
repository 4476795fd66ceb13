//! Success payloads and wire argument types.

use bytes::Bytes;
use hostshim_core::{codec, ShimError};
use serde::{Deserialize, Serialize};

use crate::{SpaceInfo, UploadPage, UploadRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    pub did: String,
}

/// Payload of `identifyCurrentUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accounts {
    pub accounts: Vec<AccountRef>,
}

/// Payload of `listSpaces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spaces {
    pub spaces: Vec<SpaceInfo>,
}

/// Payload of both upload operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uploaded {
    pub cid: String,
}

/// Payload of `listUploads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadListing {
    pub uploads: Vec<UploadRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub size: usize,
}

impl From<UploadPage> for UploadListing {
    fn from(page: UploadPage) -> Self {
        Self {
            uploads: page.results,
            cursor: page.cursor,
            size: page.size,
        }
    }
}

/// Upload data as it arrives over the wire: a base64 string or an array of
/// byte values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteInput {
    Base64(String),
    Array(Vec<u8>),
}

impl ByteInput {
    pub fn into_bytes(self) -> Result<Bytes, ShimError> {
        match self {
            ByteInput::Base64(text) => codec::base64_decode(&text),
            ByteInput::Array(bytes) => Ok(Bytes::from(bytes)),
        }
    }
}

/// One entry of `uploadCollection`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadItem {
    pub data: ByteInput,
    pub name: String,
}
