//! Adapters - Implementations of port interfaces.
//!
//! - `storage` - Key-value stores (in-memory, JSON files)
//! - `content` - Question catalogs
//! - `random` - Random sources (thread, seeded, fixed)
//! - `http` - axum REST API over the application services

pub mod content;
pub mod http;
pub mod random;
pub mod storage;
