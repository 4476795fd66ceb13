//! Databases and transactions.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hostshim_core::DeferredQueue;

use crate::object_store::{ObjectStore, Records};
use crate::KvError;

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

struct DatabaseState {
    name: String,
    version: u64,
    stores: BTreeMap<String, Records>,
}

/// A named, versioned set of object stores.
///
/// Clones refer to the same database.
#[derive(Clone)]
pub struct Database {
    state: Rc<RefCell<DatabaseState>>,
    queue: DeferredQueue,
}

impl Database {
    pub(crate) fn new(name: impl Into<String>, version: u64, queue: DeferredQueue) -> Self {
        Self {
            state: Rc::new(RefCell::new(DatabaseState {
                name: name.into(),
                version,
                stores: BTreeMap::new(),
            })),
            queue,
        }
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    pub(crate) fn set_version(&self, version: u64) {
        self.state.borrow_mut().version = version;
    }

    /// Store names in sorted order.
    pub fn object_store_names(&self) -> Vec<String> {
        self.state.borrow().stores.keys().cloned().collect()
    }

    pub fn contains_object_store(&self, name: &str) -> bool {
        self.state.borrow().stores.contains_key(name)
    }

    /// Create an empty store, replacing any store of the same name.
    pub fn create_object_store(&self, name: impl Into<String>) -> ObjectStore {
        let name = name.into();
        let records = Records::default();
        self.state
            .borrow_mut()
            .stores
            .insert(name.clone(), Rc::clone(&records));
        ObjectStore::new(name, records, TransactionMode::ReadWrite, self.queue.clone())
    }

    /// Returns whether a store was removed.
    pub fn delete_object_store(&self, name: &str) -> bool {
        self.state.borrow_mut().stores.remove(name).is_some()
    }

    /// Open a transaction over the named stores.
    pub fn transaction<I, S>(&self, scope: I, mode: TransactionMode) -> Transaction
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Transaction {
            database: self.clone(),
            scope: scope.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Nothing to release in memory.
    pub fn close(&self) {}

    fn records(&self, name: &str) -> Records {
        let mut state = self.state.borrow_mut();
        Rc::clone(state.stores.entry(name.to_string()).or_default())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Database")
            .field("name", &state.name)
            .field("version", &state.version)
            .field("stores", &state.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A scope of stores with an access mode.
///
/// Transactions do not isolate anything: they only gate which stores can
/// be addressed and whether they can be written.
#[derive(Debug, Clone)]
pub struct Transaction {
    database: Database,
    scope: Vec<String>,
    mode: TransactionMode,
}

impl Transaction {
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Address a store in scope, creating it if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Fails with [`KvError::StoreNotInScope`] for a store outside the
    /// transaction's scope.
    pub fn object_store(&self, name: &str) -> Result<ObjectStore, KvError> {
        if !self.scope.iter().any(|s| s == name) {
            return Err(KvError::StoreNotInScope(name.to_string()));
        }
        Ok(ObjectStore::new(
            name.to_string(),
            self.database.records(name),
            self.mode,
            self.database.queue.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> Database {
        Database::new("test", 1, DeferredQueue::new())
    }

    #[test]
    fn store_created_on_first_use() {
        let db = database();
        assert!(db.object_store_names().is_empty());

        let tx = db.transaction(["uploads"], TransactionMode::ReadWrite);
        tx.object_store("uploads").unwrap();

        assert!(db.contains_object_store("uploads"));
        assert_eq!(db.object_store_names(), vec!["uploads".to_string()]);
    }

    #[test]
    fn store_outside_scope_is_rejected() {
        let db = database();
        let tx = db.transaction(["a"], TransactionMode::ReadOnly);

        let err = tx.object_store("b").unwrap_err();
        assert_eq!(err, KvError::StoreNotInScope("b".to_string()));
        assert!(!db.contains_object_store("b"));
    }

    #[test]
    fn create_and_delete_stores() {
        let db = database();
        db.create_object_store("b");
        db.create_object_store("a");
        assert_eq!(db.object_store_names(), vec!["a".to_string(), "b".to_string()]);

        assert!(db.delete_object_store("a"));
        assert!(!db.delete_object_store("a"));
        assert_eq!(db.object_store_names(), vec!["b".to_string()]);
    }

    #[test]
    fn transaction_defaults() {
        assert_eq!(TransactionMode::default(), TransactionMode::ReadOnly);
        let db = database();
        let tx = db.transaction(vec!["x".to_string()], TransactionMode::ReadOnly);
        assert_eq!(tx.scope(), ["x".to_string()]);
        assert_eq!(tx.database().name(), "test");
    }
}
