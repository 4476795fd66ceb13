//! Synchronous string key-value storage.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// An in-memory string map with the web storage surface.
///
/// Clones share one map. Keys are enumerated in sorted order.
#[derive(Clone, Default, Debug)]
pub struct WebStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl WebStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The key at `index` in enumeration order.
    pub fn key(&self, index: usize) -> Option<String> {
        self.entries.borrow().keys().nth(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = WebStorage::new();
        assert!(storage.is_empty());
        assert_eq!(storage.get_item("a"), None);

        storage.set_item("a", "1");
        storage.set_item("a", "2");
        assert_eq!(storage.get_item("a").as_deref(), Some("2"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("a");
        storage.remove_item("missing");
        assert!(storage.is_empty());
    }

    #[test]
    fn keys_enumerate_sorted() {
        let storage = WebStorage::new();
        storage.set_item("b", "");
        storage.set_item("a", "");

        assert_eq!(storage.key(0).as_deref(), Some("a"));
        assert_eq!(storage.key(1).as_deref(), Some("b"));
        assert_eq!(storage.key(2), None);
    }

    #[test]
    fn clones_share_entries() {
        let storage = WebStorage::new();
        let alias = storage.clone();
        alias.set_item("k", "v");
        assert_eq!(storage.get_item("k").as_deref(), Some("v"));

        storage.clear();
        assert!(alias.is_empty());
    }
}
