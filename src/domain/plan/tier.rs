//! Plan tier identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription level of a user.
///
/// Determines question quota, concurso scope and feature access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTierId {
    /// Time-boxed evaluation with full question access.
    Trial,
    /// Default for every user without a record. Quota-restricted only.
    Free,
    /// Paid plan scoped to the concursos granted to the user.
    Individual,
    /// Paid plan with everything unlocked.
    Plus,
}

impl PlanTierId {
    /// All tiers in catalog order.
    pub const ALL: [PlanTierId; 4] = [
        PlanTierId::Trial,
        PlanTierId::Free,
        PlanTierId::Individual,
        PlanTierId::Plus,
    ];

    /// Returns true if this tier is sold through a plan request.
    pub fn is_paid(&self) -> bool {
        matches!(self, PlanTierId::Individual | PlanTierId::Plus)
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanTierId::Trial => "Trial",
            PlanTierId::Free => "Gratuito",
            PlanTierId::Individual => "Individual",
            PlanTierId::Plus => "Plus",
        }
    }

    /// Numeric rank used to tell upgrades from downgrades.
    pub fn rank(&self) -> u8 {
        match self {
            PlanTierId::Free => 0,
            PlanTierId::Trial => 1,
            PlanTierId::Individual => 2,
            PlanTierId::Plus => 3,
        }
    }

    /// Returns true if moving from `self` to `target` is an upgrade.
    pub fn is_upgrade_to(&self, target: PlanTierId) -> bool {
        target.rank() > self.rank()
    }
}

impl std::fmt::Display for PlanTierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PlanTierId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trial" => Ok(PlanTierId::Trial),
            "free" => Ok(PlanTierId::Free),
            "individual" => Ok(PlanTierId::Individual),
            "plus" => Ok(PlanTierId::Plus),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}
