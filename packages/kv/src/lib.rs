//! Asynchronous key-value database emulation.
//!
//! An in-memory stand-in for the browser's indexed key-value database, with
//! the same shape: a [`KvFactory`] opens versioned [`Database`]s, a
//! [`Transaction`] scopes access to [`ObjectStore`]s, and every store
//! operation answers with a [`KvRequest`] that settles later, when the host
//! drains the shared [`hostshim_core::DeferredQueue`].
//!
//! There is no persistence, no indexing and no transactional isolation.
//! Operations settle strictly in the order they were issued.

mod database;
mod error;
mod factory;
mod key;
mod object_store;
mod request;

pub use database::{Database, Transaction, TransactionMode};
pub use error::KvError;
pub use factory::{KvFactory, OpenRequest, UpgradeEvent};
pub use key::{Key, KeyRange};
pub use object_store::ObjectStore;
pub use request::{KvRequest, ReadyState};
