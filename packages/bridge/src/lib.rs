//! Storage façade for sandboxed hosts.
//!
//! The host owns a [`Session`] and calls the eight operations of [`Bridge`]
//! (directly, or through [`Bridge::call`] with JSON). Every operation
//! returns an [`Envelope`]; nothing fails across the boundary.
//!
//! - `capability`: the [`StorageClient`] and [`ClientFactory`] traits
//! - `session`: the installed client and the selected space
//! - `bridge`: the operations themselves
//! - `dispatch`: the JSON entry point
//! - `memory`: a client that keeps everything in the emulated host APIs

mod bridge;
mod capability;
mod config;
mod dispatch;
mod envelope;
mod memory;
pub mod payload;
mod session;

pub use bridge::Bridge;
pub use capability::{
    ClientFactory, ListOptions, SpaceInfo, StorageClient, UploadPage, UploadRecord,
};
pub use config::InitConfig;
pub use dispatch::BridgeCall;
pub use envelope::Envelope;
pub use hostshim_core::ErrorKind;
pub use memory::{MemoryClient, MemoryClientConfig, MemoryClientFactory};
pub use session::Session;
