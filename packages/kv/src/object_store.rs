//! Object stores: ordered key to value maps with deferred operations.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hostshim_core::{DeferredQueue, Value};

use crate::{Key, KeyRange, KvError, KvRequest, TransactionMode};

pub(crate) type Records = Rc<RefCell<BTreeMap<Key, Value>>>;

/// A handle to one store, bound to the mode of the transaction that
/// produced it.
///
/// Every operation returns a [`KvRequest`] at once and does its work when
/// the shared [`DeferredQueue`] reaches it. Values are copied on the way in
/// and on the way out.
#[derive(Clone)]
pub struct ObjectStore {
    name: String,
    records: Records,
    mode: TransactionMode,
    queue: DeferredQueue,
}

impl ObjectStore {
    pub(crate) fn new(
        name: String,
        records: Records,
        mode: TransactionMode,
        queue: DeferredQueue,
    ) -> Self {
        Self {
            name,
            records,
            mode,
            queue,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn defer<T, F>(&self, op: &'static str, f: F) -> KvRequest<T>
    where
        T: Clone + 'static,
        F: FnOnce(&mut BTreeMap<Key, Value>) -> Result<T, KvError> + 'static,
    {
        let request = KvRequest::new();
        let handle = request.clone();
        let records = Rc::clone(&self.records);
        let store = self.name.clone();

        self.queue.enqueue(move || {
            let outcome = f(&mut *records.borrow_mut());
            tracing::trace!(store = %store, op, ok = outcome.is_ok(), "store operation ran");
            handle.settle(outcome);
        });

        request
    }

    fn defer_write<T, F>(&self, op: &'static str, f: F) -> KvRequest<T>
    where
        T: Clone + 'static,
        F: FnOnce(&mut BTreeMap<Key, Value>) -> Result<T, KvError> + 'static,
    {
        match self.mode {
            TransactionMode::ReadWrite => self.defer(op, f),
            TransactionMode::ReadOnly => self.defer(op, move |_| Err(KvError::ReadOnly(op))),
        }
    }

    /// Store a copy of `value`.
    ///
    /// Without an explicit key the value's `id` field is used (string or
    /// integer), and failing that the current time in milliseconds as a
    /// string. Timestamp keys collide when two puts land in the same
    /// millisecond; the later one overwrites.
    pub fn put(&self, value: Value, key: Option<Key>) -> KvRequest<Key> {
        self.defer_write("put", move |records| {
            let key = key.unwrap_or_else(|| derive_key(&value));
            records.insert(key.clone(), value);
            Ok(key)
        })
    }

    pub fn get(&self, key: impl Into<Key>) -> KvRequest<Option<Value>> {
        let key = key.into();
        self.defer("get", move |records| Ok(records.get(&key).cloned()))
    }

    /// Deleting a missing key succeeds.
    pub fn delete(&self, key: impl Into<Key>) -> KvRequest<()> {
        let key = key.into();
        self.defer_write("delete", move |records| {
            records.remove(&key);
            Ok(())
        })
    }

    pub fn clear(&self) -> KvRequest<()> {
        self.defer_write("clear", |records| {
            records.clear();
            Ok(())
        })
    }

    /// Values in key order, optionally restricted to a range.
    pub fn get_all(&self, range: Option<KeyRange>) -> KvRequest<Vec<Value>> {
        self.defer("get_all", move |records| {
            Ok(records
                .iter()
                .filter(|(k, _)| in_range(&range, k))
                .map(|(_, v)| v.clone())
                .collect())
        })
    }

    /// Keys in order, optionally restricted to a range.
    pub fn get_all_keys(&self, range: Option<KeyRange>) -> KvRequest<Vec<Key>> {
        self.defer("get_all_keys", move |records| {
            Ok(records
                .keys()
                .filter(|k| in_range(&range, k))
                .cloned()
                .collect())
        })
    }

    pub fn count(&self, range: Option<KeyRange>) -> KvRequest<usize> {
        self.defer("count", move |records| {
            Ok(records.keys().filter(|k| in_range(&range, k)).count())
        })
    }
}

fn in_range(range: &Option<KeyRange>, key: &Key) -> bool {
    range.as_ref().map_or(true, |r| r.contains(key))
}

fn derive_key(value: &Value) -> Key {
    value
        .field("id")
        .and_then(Key::from_value)
        .unwrap_or_else(|| Key::Text(chrono::Utc::now().timestamp_millis().to_string()))
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("records", &self.records.borrow().len())
            .finish()
    }
}
