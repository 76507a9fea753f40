//! `KeyValueStore` backends.
//!
//! - `FileKeyValueStore` writes one JSON document per key under a data
//!   directory and survives restarts.
//! - `InMemoryKeyValueStore` keeps everything in a map and can be switched
//!   into an unavailable mode to exercise degraded reads in tests.

mod file_store;
mod in_memory_store;

pub use file_store::FileKeyValueStore;
pub use in_memory_store::InMemoryKeyValueStore;
