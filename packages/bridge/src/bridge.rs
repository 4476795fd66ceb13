//! The eight façade operations.
//!
//! Every operation is a containment boundary: whatever fails inside it comes
//! back as a failure [`Envelope`], never as a panic or an `Err`.

use bytes::Bytes;
use hostshim_core::{BinaryContainer, NamedBinaryContainer, NamedOptions, Part, ShimError};

use crate::payload::{AccountRef, Accounts, Spaces, UploadListing, Uploaded};
use crate::{ClientFactory, Envelope, InitConfig, ListOptions, Session, StorageClient};

const UPLOAD_TYPE: &str = "application/octet-stream";

/// Storage façade over an installable client.
///
/// # Example
///
/// ```rust
/// use hostshim_bridge::{Bridge, ErrorKind, MemoryClientFactory, Session};
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// runtime.block_on(async {
///     let bridge = Bridge::new(MemoryClientFactory::standalone());
///     let session = Session::new();
///
///     let envelope = bridge.list_spaces(&session).await;
///     assert_eq!(envelope.error(), Some("Client not initialized"));
///     assert_eq!(envelope.kind(), Some(ErrorKind::Initialization));
/// });
/// ```
#[derive(Debug, Clone)]
pub struct Bridge<F> {
    factory: F,
}

impl<F: ClientFactory> Bridge<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Create and install a new client, optionally selecting a space.
    ///
    /// The selected space is always cleared first. If the requested space
    /// does not exist the call fails but the new client stays installed.
    pub async fn initialize(
        &self,
        session: &mut Session<F::Client>,
        config: InitConfig,
    ) -> Envelope<()> {
        let result = self.try_initialize(session, config).await;
        finish("initialize", result)
    }

    async fn try_initialize(
        &self,
        session: &mut Session<F::Client>,
        config: InitConfig,
    ) -> Result<(), ShimError> {
        let client = self.factory.create(config.store_config.as_ref()).await?;
        session.install(client);

        let Some(space) = config.space_id else {
            return Ok(());
        };

        let client = session.require_client()?;
        if !client.spaces()?.iter().any(|s| s.did == space) {
            return Err(ShimError::not_found(format!("Space {} not found", space)));
        }
        client.set_current_space(&space).await?;
        session.select_space(space);
        Ok(())
    }

    pub async fn authenticate(&self, session: &Session<F::Client>, email: &str) -> Envelope<()> {
        let result: Result<_, ShimError> = async {
            let client = session.require_client()?;
            client.login(email).await
        }
        .await;
        finish("authenticate", result)
    }

    pub async fn identify_current_user(&self, session: &Session<F::Client>) -> Envelope<Accounts> {
        let result = session.require_client().and_then(|client| {
            let accounts = client
                .accounts()?
                .into_iter()
                .map(|did| AccountRef { did })
                .collect();
            Ok(Accounts { accounts })
        });
        finish("identifyCurrentUser", result)
    }

    pub async fn list_spaces(&self, session: &Session<F::Client>) -> Envelope<Spaces> {
        let result = session.require_client().and_then(|client| {
            Ok(Spaces {
                spaces: client.spaces()?,
            })
        });
        finish("listSpaces", result)
    }

    /// Upload one named item into the selected space.
    pub async fn upload_single_item(
        &self,
        session: &Session<F::Client>,
        data: Bytes,
        name: &str,
    ) -> Envelope<Uploaded> {
        let result: Result<_, ShimError> = async {
            let client = session.require_client()?;
            session.require_space()?;
            let cid = client.upload_file(named_upload(data, name)?).await?;
            Ok(Uploaded { cid })
        }
        .await;
        finish("uploadSingleItem", result)
    }

    /// Upload several named items as one directory into the selected space.
    pub async fn upload_collection(
        &self,
        session: &Session<F::Client>,
        items: Vec<(Bytes, String)>,
    ) -> Envelope<Uploaded> {
        let result: Result<_, ShimError> = async {
            let client = session.require_client()?;
            session.require_space()?;
            let files = items
                .into_iter()
                .map(|(data, name)| named_upload(data, &name))
                .collect::<Result<Vec<_>, _>>()?;
            let cid = client.upload_directory(files).await?;
            Ok(Uploaded { cid })
        }
        .await;
        finish("uploadCollection", result)
    }

    /// List uploads. An empty cursor and a zero size count as absent.
    pub async fn list_uploads(
        &self,
        session: &Session<F::Client>,
        cursor: Option<String>,
        size: Option<usize>,
    ) -> Envelope<UploadListing> {
        let result: Result<_, ShimError> = async {
            let client = session.require_client()?;
            let options = ListOptions {
                cursor: cursor.filter(|c| !c.is_empty()),
                size: size.filter(|s| *s > 0),
            };
            let page = client.list_uploads(options).await?;
            Ok(UploadListing::from(page))
        }
        .await;
        finish("listUploads", result)
    }

    pub async fn remove_upload(&self, session: &Session<F::Client>, cid: &str) -> Envelope<()> {
        let result: Result<_, ShimError> = async {
            let client = session.require_client()?;
            client.remove(cid).await
        }
        .await;
        finish("removeUpload", result)
    }
}

/// An octet-stream container nested in a named one.
fn named_upload(data: Bytes, name: &str) -> Result<NamedBinaryContainer, ShimError> {
    let blob = BinaryContainer::with_type([Part::from(data)], UPLOAD_TYPE)?;
    NamedBinaryContainer::new([Part::from(blob)], name, NamedOptions::default())
}

fn finish<T>(operation: &'static str, result: Result<T, ShimError>) -> Envelope<T> {
    match &result {
        Ok(_) => tracing::debug!(operation, "bridge operation succeeded"),
        Err(e) => tracing::warn!(
            operation,
            kind = %e.kind(),
            error = %e,
            "bridge operation failed"
        ),
    }
    Envelope::from_result(result)
}
