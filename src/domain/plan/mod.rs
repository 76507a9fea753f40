//! Plan domain module.
//!
//! - `tier` - Plan tier identifiers
//! - `catalog` - Entitlement limits per tier

mod catalog;
mod tier;

pub use catalog::{PlanCatalog, PlanTier, DEFAULT_FREE_QUESTION_LIMIT};
pub use tier::PlanTierId;
