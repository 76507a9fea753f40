//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machines)
//! - `plan` - Plan tiers and their limits
//! - `entitlement` - Per-user plan, concurso and package grants
//! - `quiz` - Questions, the answer state machine, progress and quota
//! - `coaching` - Error classification and study technique scoring
//! - `plan_request` - Paid plan purchase workflow and payment webhooks

pub mod coaching;
pub mod entitlement;
pub mod foundation;
pub mod plan;
pub mod plan_request;
pub mod quiz;
