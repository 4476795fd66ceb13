//! The database namespace: open, upgrade and delete.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::rc::Rc;

use hostshim_core::{DeferredQueue, ListenerError};

use crate::{Database, KvError, KvRequest};

/// Passed to the upgrade hook when an open raises the version.
#[derive(Debug, Clone)]
pub struct UpgradeEvent {
    /// The database being upgraded. Stores created here persist.
    pub database: Database,
    /// 0 for a database created by this open.
    pub old_version: u64,
    pub new_version: u64,
}

type UpgradeHook = Box<dyn FnOnce(&UpgradeEvent) -> Result<(), ListenerError>>;

/// Request returned by [`KvFactory::open`].
///
/// Dereferences to the underlying [`KvRequest`]; additionally accepts an
/// upgrade hook, which must be set before the queue runs the open.
pub struct OpenRequest {
    request: KvRequest<Database>,
    upgrade: Rc<RefCell<Option<UpgradeHook>>>,
}

impl OpenRequest {
    pub fn on_upgrade_needed(
        &self,
        hook: impl FnOnce(&UpgradeEvent) -> Result<(), ListenerError> + 'static,
    ) {
        *self.upgrade.borrow_mut() = Some(Box::new(hook));
    }

    pub fn request(&self) -> &KvRequest<Database> {
        &self.request
    }
}

impl Deref for OpenRequest {
    type Target = KvRequest<Database>;

    fn deref(&self) -> &KvRequest<Database> {
        &self.request
    }
}

/// In-memory database namespace.
///
/// Databases live until deleted; nothing is persisted. Clones share one
/// namespace.
///
/// # Example
///
/// ```rust
/// use hostshim_core::{DeferredQueue, Value};
/// use hostshim_kv::{Key, KvFactory, TransactionMode};
///
/// let queue = DeferredQueue::new();
/// let factory = KvFactory::new(queue.clone());
///
/// let open = factory.open("app", Some(1));
/// open.on_upgrade_needed(|event| {
///     event.database.create_object_store("settings");
///     Ok(())
/// });
/// queue.run_until_idle();
///
/// let db = open.result().unwrap();
/// let store = db
///     .transaction(["settings"], TransactionMode::ReadWrite)
///     .object_store("settings")
///     .unwrap();
/// store.put(Value::from("dark"), Some(Key::from("theme")));
/// let theme = store.get("theme");
/// queue.run_until_idle();
///
/// assert_eq!(theme.result(), Some(Some(Value::from("dark"))));
/// ```
#[derive(Clone, Debug)]
pub struct KvFactory {
    databases: Rc<RefCell<BTreeMap<String, Database>>>,
    queue: DeferredQueue,
}

impl KvFactory {
    pub fn new(queue: DeferredQueue) -> Self {
        Self {
            databases: Rc::default(),
            queue,
        }
    }

    /// Open (creating if needed) a database at `version`, default 1.
    ///
    /// A new database starts at version 0. When the requested version is
    /// higher than the stored one the upgrade hook runs first; if it fails,
    /// the open fails and the version is left as it was. Requesting a lower
    /// version fails with [`KvError::VersionDowngrade`].
    pub fn open(&self, name: impl Into<String>, version: Option<u64>) -> OpenRequest {
        let name = name.into();
        let request = KvRequest::new();
        let upgrade: Rc<RefCell<Option<UpgradeHook>>> = Rc::default();

        let handle = request.clone();
        let hook = Rc::clone(&upgrade);
        let databases = Rc::clone(&self.databases);
        let queue = self.queue.clone();

        self.queue.enqueue(move || {
            let outcome = open_database(&databases, &queue, &name, version, &hook);
            handle.settle(outcome);
        });

        OpenRequest { request, upgrade }
    }

    /// Remove a database and everything in it.
    pub fn delete_database(&self, name: impl Into<String>) -> KvRequest<()> {
        let name = name.into();
        let request = KvRequest::new();
        let handle = request.clone();
        let databases = Rc::clone(&self.databases);

        self.queue.enqueue(move || {
            let outcome = match databases.borrow_mut().remove(&name) {
                Some(_) => {
                    tracing::debug!(database = %name, "database deleted");
                    Ok(())
                }
                None => Err(KvError::DatabaseNotFound(name)),
            };
            handle.settle(outcome);
        });

        request
    }

    /// Names of live databases, sorted.
    pub fn database_names(&self) -> Vec<String> {
        self.databases.borrow().keys().cloned().collect()
    }
}

fn open_database(
    databases: &RefCell<BTreeMap<String, Database>>,
    queue: &DeferredQueue,
    name: &str,
    version: Option<u64>,
    hook: &RefCell<Option<UpgradeHook>>,
) -> Result<Database, KvError> {
    let requested = version.unwrap_or(1);
    if requested == 0 {
        return Err(KvError::InvalidVersion);
    }

    let database = databases
        .borrow_mut()
        .entry(name.to_string())
        .or_insert_with(|| Database::new(name, 0, queue.clone()))
        .clone();

    let current = database.version();
    if requested < current {
        return Err(KvError::VersionDowngrade { requested, current });
    }
    if requested == current {
        return Ok(database);
    }

    database.set_version(requested);
    let hook = hook.borrow_mut().take();
    if let Some(hook) = hook {
        let event = UpgradeEvent {
            database: database.clone(),
            old_version: current,
            new_version: requested,
        };
        if let Err(e) = hook(&event) {
            database.set_version(current);
            return Err(KvError::Upgrade(e.to_string()));
        }
    }

    tracing::debug!(
        database = name,
        old_version = current,
        new_version = requested,
        "database upgraded"
    );
    Ok(database)
}
