//! HTTP adapter for the paid plan purchase workflow.
//!
//! - `POST /api/plan-requests` - Open a request
//! - `GET /api/plan-requests` - Caller's requests
//! - `GET /api/plan-requests/:id` - One of the caller's requests
//! - `POST /api/plan-requests/:id/cancel` - Cancel one of the caller's requests
//!
//! Admin (allow-listed callers only):
//! - `GET /api/admin/plan-requests?status=` - All requests
//! - `POST /api/admin/plan-requests/:id/status` - Move to another status
//! - `POST /api/admin/plan-requests/:id/progress` - Report creation progress
//! - `POST /api/admin/plan-requests/sweep` - Abandon stale unpaid requests
//!
//! Webhook (no identity, signature verified):
//! - `POST /api/webhooks/payment`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{plan_request_admin_routes, plan_request_routes, webhook_routes};
