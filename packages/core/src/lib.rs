//! Host API emulation primitives.
//!
//! This layer rebuilds, without any host-native support, the handful of
//! browser APIs a sandboxed storage client expects to find:
//! - `codec`: UTF-8 and base64 transcoding
//! - `container`: byte-bearing containers (`BinaryContainer`, `NamedBinaryContainer`)
//! - `event`: events, listener registries, abort signals
//! - `scheduler`: the deferred-unit queue and the immediate timer emulation
//! - `storage`: flat string-keyed storages
//! - `host`: the environment capability interface (fetch, clock, randomness)
//! - `address`: parsed web addresses and query strings
//!
//! # Example
//!
//! ```rust
//! use hostshim_core::{codec, BinaryContainer, Part};
//!
//! let container = BinaryContainer::new(vec![Part::from("ab"), Part::from(vec![1u8, 2, 3])]);
//! assert_eq!(container.size(), 5);
//!
//! let encoded = codec::base64_encode(b"hello");
//! assert_eq!(codec::base64_decode(&encoded).unwrap().as_ref(), b"hello");
//! ```

pub use bytes::Bytes;

pub mod address;
pub mod codec;
pub mod container;
mod error;
pub mod event;
pub mod fetch;
pub mod host;
pub mod scheduler;
pub mod storage;
mod value;

pub use address::{SearchParams, WebUrl};
pub use container::{BinaryContainer, NamedBinaryContainer, NamedOptions, Part};
pub use error::{ErrorKind, Result, ShimError};
pub use event::{
    listener, AbortController, AbortSignal, Event, EventTarget, Listener, ListenerError,
    ListenerRegistry,
};
pub use fetch::{FetchRequest, FetchResponse, Headers, Method};
pub use host::{FetchProxy, HostServices, SandboxHost, SubtleOperation, Unproxied};
pub use scheduler::{DeferredQueue, TimerId, Timers};
pub use storage::WebStorage;
pub use value::{from_value, to_value, Value};
