//! Plan request domain module.
//!
//! - `status` - Workflow states and edges
//! - `aggregate` - The request record and its transitions
//! - `webhook` - Payment provider signature verification

mod aggregate;
mod status;
mod webhook;

pub use aggregate::{CreationProgress, NewPlanRequest, PlanRequest, RequestedPlan};
pub use status::PlanRequestStatus;
pub use webhook::{
    signature_header_for, PaymentEvent, PaymentWebhookVerifier, SignatureHeader, WebhookError,
};
