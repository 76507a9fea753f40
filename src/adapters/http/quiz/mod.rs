//! HTTP adapter for answering, progress and study guidance.
//!
//! - `POST /api/quiz/answers` - Select, confirm and reveal in one call
//! - `GET /api/quiz/answers/:question_id` - Answer state of a question
//! - `GET /api/progress/:package_id` - Subject progress of a package
//! - `POST /api/progress/:package_id/reset` - Clear a package's answers
//! - `GET /api/errors/summary` - Error counts by type and subject
//! - `GET /api/techniques` - Technique catalog
//! - `GET /api/techniques/recommendation` - Next technique to try
//! - `GET /api/techniques/favorites` - Caller's favorites
//! - `POST /api/techniques/:id/favorite` - Add or remove a favorite

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::quiz_routes;
