//! HTTP adapter for plans, access checks and quota.
//!
//! - `GET /api/access/plan` - Current plan, limits and grants
//! - `GET /api/access/concursos/:name` - May the caller study this concurso
//! - `GET /api/access/packages/:id` - May the caller open this package
//! - `GET /api/quota` - Question quota status
//!
//! Admin (allow-listed callers only):
//! - `GET /api/admin/users/:user/entitlement`
//! - `PUT /api/admin/users/:user/plan`
//! - `POST /api/admin/users/:user/concursos`, `DELETE .../concursos/:name`
//! - `POST /api/admin/users/:user/packages`, `DELETE .../packages/:id`
//! - `PUT /api/admin/users/:user/progress/:package_id/subjects/:subject`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{access_admin_routes, access_routes};
