//! Question content adapters.
//!
//! - **InMemoryQuestionCatalog** - Questions held in memory, optionally
//!   loaded from a YAML file at startup

mod in_memory_catalog;

pub use in_memory_catalog::InMemoryQuestionCatalog;
