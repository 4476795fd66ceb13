//! hostshim: browser host APIs for sandboxed runtimes.
//!
//! Code running inside a sandbox expects the platform surfaces a browser
//! provides: text codecs, binary containers, a key-value database, web
//! storage, events, timers and network access. This crate bundles the
//! emulated versions into one [`Environment`] and re-exports the layers:
//!
//! - [`core`]: codecs, containers, events, scheduling, storage, host services
//! - [`kv`]: the asynchronous key-value store
//! - [`bridge`]: the envelope-returning storage façade
//!
//! # Example
//!
//! ```rust
//! use hostshim::Environment;
//!
//! let env = Environment::sandbox();
//! env.local_storage().set_item("theme", "dark");
//!
//! let open = env.indexed_db().open("notes", Some(1));
//! open.on_upgrade_needed(|upgrade| {
//!     upgrade.database.create_object_store("pages");
//!     Ok(())
//! });
//! env.run_until_idle();
//!
//! let db = open.result().unwrap();
//! assert_eq!(db.version(), 1);
//! assert_eq!(env.local_storage().get_item("theme").as_deref(), Some("dark"));
//! ```

pub use hostshim_bridge as bridge;
pub use hostshim_core as core;
pub use hostshim_kv as kv;

pub use hostshim_bridge::{Bridge, Envelope, InitConfig, MemoryClientFactory, Session};
pub use hostshim_core::{ErrorKind, HostServices, Result, SandboxHost, ShimError};

use hostshim_core::{
    DeferredQueue, EventTarget, FetchRequest, FetchResponse, Timers, Unproxied, WebStorage,
};
use hostshim_kv::KvFactory;

/// One sandbox's worth of emulated host surfaces.
///
/// Every surface shares the same [`DeferredQueue`]; key-value requests only
/// complete when the embedder drives it with [`run_until_idle`](Self::run_until_idle).
/// Clones share all state.
#[derive(Debug, Clone)]
pub struct Environment<H: HostServices = SandboxHost<Unproxied>> {
    queue: DeferredQueue,
    timers: Timers,
    indexed_db: KvFactory,
    local_storage: WebStorage,
    session_storage: WebStorage,
    events: EventTarget,
    host: H,
}

impl Environment {
    /// An environment with the standard host and no network proxy.
    pub fn sandbox() -> Self {
        Self::with_host(SandboxHost::new())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::sandbox()
    }
}

impl<H: HostServices> Environment<H> {
    pub fn with_host(host: H) -> Self {
        let queue = DeferredQueue::new();
        tracing::debug!("host environment created");
        Self {
            timers: Timers::new(queue.clone()),
            indexed_db: KvFactory::new(queue.clone()),
            local_storage: WebStorage::new(),
            session_storage: WebStorage::new(),
            events: EventTarget::new(),
            host,
            queue,
        }
    }

    pub fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// The key-value database namespace.
    pub fn indexed_db(&self) -> &KvFactory {
        &self.indexed_db
    }

    pub fn local_storage(&self) -> &WebStorage {
        &self.local_storage
    }

    pub fn session_storage(&self) -> &WebStorage {
        &self.session_storage
    }

    /// Global event target.
    pub fn events(&self) -> &EventTarget {
        &self.events
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Perform a network request through the host.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        self.host.fetch(request).await
    }

    /// Run deferred work until nothing is pending. Returns the number of
    /// tasks run.
    pub fn run_until_idle(&self) -> usize {
        self.queue.run_until_idle()
    }

    /// A storage client factory backed by this environment's database and
    /// local storage.
    pub fn memory_client_factory(&self) -> MemoryClientFactory {
        MemoryClientFactory::new(
            self.queue.clone(),
            self.indexed_db.clone(),
            self.local_storage.clone(),
        )
    }
}
