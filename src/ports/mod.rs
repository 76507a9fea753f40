//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `KeyValueStore` - Namespaced persistence for all mutable state
//! - `QuestionCatalog` - Read-only question content
//! - `RandomSource` - Injectable randomness

mod key_value_store;
mod question_catalog;
mod random_source;

pub use key_value_store::{EntityKind, KeyValueStore, StoreError, StoreKey};
pub use question_catalog::QuestionCatalog;
pub use random_source::RandomSource;
