//! Question content port.
//!
//! Content is owned by an external store; the core only reads it.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PackageId, QuestionId};
use crate::domain::quiz::Question;

#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Returns `None` if the question does not exist.
    async fn find(&self, id: &QuestionId) -> Result<Option<Question>, DomainError>;

    /// All questions of a package, in catalog order.
    async fn list_by_package(&self, package: &PackageId) -> Result<Vec<Question>, DomainError>;
}
