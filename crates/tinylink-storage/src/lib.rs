//! Persistence adapters for the tinylink registry.

pub mod json;
pub mod memory;

pub use json::{JsonFileStore, StoreLock};
pub use memory::InMemoryStore;
pub use tinylink_core::{StorageError, Store};
