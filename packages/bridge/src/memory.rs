//! An in-memory storage client built on the emulated host APIs.
//!
//! Uploads are materialized, given a deterministic pseudo content
//! identifier, and recorded in a key-value database, one object store per
//! space. Logins are remembered in a [`WebStorage`]. Nothing leaves the
//! process. Identifiers are stable for equal content but are not real
//! content identifiers.

use std::cell::RefCell;

use async_trait::async_trait;
use hostshim_core::{
    from_value, to_value, DeferredQueue, NamedBinaryContainer, ShimError, WebStorage,
};
use hostshim_kv::{
    Database, Key, KeyRange, KvFactory, KvRequest, ObjectStore, ReadyState, TransactionMode,
};
use serde::{Deserialize, Serialize};

use crate::{ClientFactory, ListOptions, SpaceInfo, StorageClient, UploadPage, UploadRecord};

const DATABASE: &str = "hostshim-uploads";
const ACCOUNTS_KEY: &str = "hostshim.accounts";

/// Configuration read from `storeConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryClientConfig {
    /// Accounts the client starts out logged in to.
    pub accounts: Vec<String>,
    pub spaces: Vec<SpaceInfo>,
    /// Uploads per page when `list_uploads` gets no size.
    pub page_size: usize,
}

impl Default for MemoryClientConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            spaces: Vec::new(),
            page_size: 25,
        }
    }
}

impl MemoryClientConfig {
    pub fn with_space(mut self, space: SpaceInfo) -> Self {
        self.spaces.push(space);
        self
    }

    pub fn with_account(mut self, did: impl Into<String>) -> Self {
        self.accounts.push(did.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUpload {
    root: String,
    shards: Vec<String>,
    names: Vec<String>,
    size: u64,
    inserted_at: i64,
}

/// Deterministic 128-bit digest rendered as an identifier.
///
/// Two FNV-1a passes with different offset bases.
fn pseudo_cid(chunks: &[&[u8]]) -> String {
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut high: u64 = 0xcbf2_9ce4_8422_2325;
    let mut low: u64 = 0x6c62_272e_07bb_0142;
    for chunk in chunks {
        for &byte in chunk.iter() {
            high = (high ^ u64::from(byte)).wrapping_mul(PRIME);
            low = (low ^ u64::from(byte)).wrapping_mul(PRIME);
        }
        // Separate chunks so ["ab", "c"] and ["a", "bc"] differ.
        high = (high ^ 0xff).wrapping_mul(PRIME);
        low = (low ^ 0xfe).wrapping_mul(PRIME);
    }
    format!("bafy{:016x}{:016x}", high, low)
}

/// The in-memory client.
pub struct MemoryClient {
    config: MemoryClientConfig,
    queue: DeferredQueue,
    kv: KvFactory,
    storage: WebStorage,
    database: RefCell<Option<Database>>,
    current_space: RefCell<Option<String>>,
}

impl MemoryClient {
    pub fn new(
        config: MemoryClientConfig,
        queue: DeferredQueue,
        kv: KvFactory,
        storage: WebStorage,
    ) -> Self {
        Self {
            config,
            queue,
            kv,
            storage,
            database: RefCell::new(None),
            current_space: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &MemoryClientConfig {
        &self.config
    }

    pub fn current_space(&self) -> Option<String> {
        self.current_space.borrow().clone()
    }

    /// Run queued units in order until `request` settles, then take its
    /// outcome. Units queued behind it stay queued for the host.
    fn settle<T: Clone + 'static>(&self, request: &KvRequest<T>) -> Result<T, ShimError> {
        while request.ready_state() == ReadyState::Pending && self.queue.run_next() {}
        match request.outcome() {
            Some(outcome) => outcome.map_err(ShimError::from),
            None => Err(ShimError::state("key-value request did not settle")),
        }
    }

    fn database(&self) -> Result<Database, ShimError> {
        if let Some(db) = self.database.borrow().as_ref() {
            return Ok(db.clone());
        }
        let db = self.settle(self.kv.open(DATABASE, Some(1)).request())?;
        *self.database.borrow_mut() = Some(db.clone());
        Ok(db)
    }

    fn space_store(&self, mode: TransactionMode) -> Result<ObjectStore, ShimError> {
        let space = self
            .current_space()
            .ok_or_else(|| ShimError::state("No space selected"))?;
        let store = self
            .database()?
            .transaction([space.as_str()], mode)
            .object_store(&space)?;
        Ok(store)
    }

    fn remembered_accounts(&self) -> Result<Vec<String>, ShimError> {
        match self.storage.get_item(ACCOUNTS_KEY) {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| ShimError::capability(format!("Corrupt account list: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    fn record(&self, stored: StoredUpload) -> Result<String, ShimError> {
        let store = self.space_store(TransactionMode::ReadWrite)?;
        let root = stored.root.clone();
        let value = to_value(&stored)?;
        self.settle(&store.put(value, Some(Key::from(root.clone()))))?;
        tracing::debug!(root = %root, files = stored.names.len(), "upload recorded");
        Ok(root)
    }
}

fn account_did(email: &str) -> Result<String, ShimError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(format!("did:mailto:{}:{}", domain, local))
        }
        _ => Err(ShimError::validation(format!("Invalid email: {}", email))),
    }
}

#[async_trait(?Send)]
impl StorageClient for MemoryClient {
    async fn login(&self, email: &str) -> Result<(), ShimError> {
        let did = account_did(email)?;
        let mut accounts = self.remembered_accounts()?;
        if !accounts.contains(&did) {
            accounts.push(did);
        }
        let json = serde_json::to_string(&accounts)
            .map_err(|e| ShimError::capability(format!("Cannot store accounts: {}", e)))?;
        self.storage.set_item(ACCOUNTS_KEY, json);
        Ok(())
    }

    fn accounts(&self) -> Result<Vec<String>, ShimError> {
        let mut accounts = self.config.accounts.clone();
        for did in self.remembered_accounts()? {
            if !accounts.contains(&did) {
                accounts.push(did);
            }
        }
        Ok(accounts)
    }

    fn spaces(&self) -> Result<Vec<SpaceInfo>, ShimError> {
        Ok(self.config.spaces.clone())
    }

    async fn set_current_space(&self, did: &str) -> Result<(), ShimError> {
        if !self.config.spaces.iter().any(|s| s.did == did) {
            return Err(ShimError::not_found(format!("Space {} not found", did)));
        }
        *self.current_space.borrow_mut() = Some(did.to_string());
        Ok(())
    }

    async fn upload_file(&self, file: NamedBinaryContainer) -> Result<String, ShimError> {
        let data = file.materialize().await;
        let shard = pseudo_cid(&[&b"shard"[..], &data[..]]);
        let root = pseudo_cid(&[file.name().as_bytes(), &data[..]]);
        self.record(StoredUpload {
            root,
            shards: vec![shard],
            names: vec![file.name().to_string()],
            size: data.len() as u64,
            inserted_at: now_millis(),
        })
    }

    async fn upload_directory(
        &self,
        files: Vec<NamedBinaryContainer>,
    ) -> Result<String, ShimError> {
        let mut shards = Vec::with_capacity(files.len());
        let mut names = Vec::with_capacity(files.len());
        let mut size = 0u64;
        for file in &files {
            let data = file.materialize().await;
            shards.push(pseudo_cid(&[&b"shard"[..], file.name().as_bytes(), &data[..]]));
            names.push(file.name().to_string());
            size += data.len() as u64;
        }
        let shard_ids: Vec<&[u8]> = shards.iter().map(|s| s.as_bytes()).collect();
        let root = pseudo_cid(&shard_ids);
        self.record(StoredUpload {
            root,
            shards,
            names,
            size,
            inserted_at: now_millis(),
        })
    }

    async fn list_uploads(&self, options: ListOptions) -> Result<UploadPage, ShimError> {
        let store = self.space_store(TransactionMode::ReadOnly)?;
        let range = options
            .cursor
            .map(|cursor| KeyRange::lower_bound(cursor, true));
        let values = self.settle(&store.get_all(range))?;

        let limit = options.size.unwrap_or(self.config.page_size).max(1);
        let more = values.len() > limit;
        let results = values
            .into_iter()
            .take(limit)
            .map(|value| {
                let stored: StoredUpload = from_value(value)?;
                Ok(UploadRecord {
                    root: stored.root,
                    shards: stored.shards,
                })
            })
            .collect::<Result<Vec<_>, ShimError>>()?;

        let cursor = if more {
            results.last().map(|r| r.root.clone())
        } else {
            None
        };
        Ok(UploadPage {
            size: results.len(),
            results,
            cursor,
        })
    }

    async fn remove(&self, cid: &str) -> Result<(), ShimError> {
        let store = self.space_store(TransactionMode::ReadWrite)?;
        if self.settle(&store.get(cid))?.is_none() {
            return Err(ShimError::not_found(format!("Upload {} not found", cid)));
        }
        self.settle(&store.delete(cid))?;
        tracing::debug!(root = cid, "upload removed");
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClient")
            .field("config", &self.config)
            .field("current_space", &self.current_space.borrow())
            .finish()
    }
}

/// Builds [`MemoryClient`]s that share one queue, database namespace and
/// storage.
#[derive(Debug, Clone)]
pub struct MemoryClientFactory {
    queue: DeferredQueue,
    kv: KvFactory,
    storage: WebStorage,
}

impl MemoryClientFactory {
    pub fn new(queue: DeferredQueue, kv: KvFactory, storage: WebStorage) -> Self {
        Self { queue, kv, storage }
    }

    /// A factory with its own queue, namespace and storage.
    pub fn standalone() -> Self {
        let queue = DeferredQueue::new();
        Self::new(queue.clone(), KvFactory::new(queue), WebStorage::new())
    }
}

#[async_trait(?Send)]
impl ClientFactory for MemoryClientFactory {
    type Client = MemoryClient;

    async fn create(
        &self,
        store_config: Option<&serde_json::Value>,
    ) -> Result<MemoryClient, ShimError> {
        let config = match store_config {
            Some(json) => MemoryClientConfig::deserialize(json).map_err(|e| {
                ShimError::validation(format!("Invalid store configuration: {}", e))
            })?,
            None => MemoryClientConfig::default(),
        };
        Ok(MemoryClient::new(
            config,
            self.queue.clone(),
            self.kv.clone(),
            self.storage.clone(),
        ))
    }
}
