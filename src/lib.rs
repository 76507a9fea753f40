//! Concurso Prep - exam-preparation core.
//!
//! Plan entitlements, question quotas, the answer flow, subject progress and
//! post-answer coaching for public-service exam ("concurso") candidates,
//! exposed over a JSON HTTP API.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
