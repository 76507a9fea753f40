//! Plan catalog: immutable reference data describing each tier.
//!
//! The catalog is built once at startup and handed to the services that need
//! it, so tests can substitute their own fixtures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PlanTierId;
use crate::domain::foundation::ValidationError;

/// Question quota granted to free users over their lifetime.
pub const DEFAULT_FREE_QUESTION_LIMIT: u32 = 10;

/// Entitlement limits of one plan tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTier {
    pub id: PlanTierId,
    /// Questions a user may answer. `None` = unlimited.
    ///
    /// Capped plans count a lifetime total, not a daily allowance.
    pub question_limit: Option<u32>,
    /// Concursos a user may hold active grants for. `None` = unlimited.
    pub max_concursos: Option<u32>,
    pub has_comments: bool,
    pub has_advanced_stats: bool,
    pub has_ai: bool,
    pub ai_message_limit: u32,
    pub has_audio_comments: bool,
    pub has_notes: bool,
    pub price_cents: i64,
}

impl PlanTier {
    /// Check if the question limit has been reached.
    ///
    /// Returns false if unlimited or under limit.
    pub fn question_limit_reached(&self, answered: u32) -> bool {
        self.question_limit
            .map(|max| answered >= max)
            .unwrap_or(false)
    }

    /// Remaining questions, `None` when unlimited.
    pub fn remaining_questions(&self, answered: u32) -> Option<u32> {
        self.question_limit.map(|max| max.saturating_sub(answered))
    }

    /// Check if another concurso grant fits within the tier.
    pub fn concurso_limit_reached(&self, active: u32) -> bool {
        self.max_concursos
            .map(|max| active >= max)
            .unwrap_or(false)
    }
}

/// Lookup table of every plan tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    tiers: HashMap<PlanTierId, PlanTier>,
}

impl PlanCatalog {
    /// Builds a catalog from explicit tiers.
    ///
    /// # Errors
    ///
    /// Returns an error unless every [`PlanTierId`] is described exactly once.
    pub fn new(tiers: Vec<PlanTier>) -> Result<Self, ValidationError> {
        let mut map = HashMap::with_capacity(tiers.len());
        for tier in tiers {
            if map.insert(tier.id, tier.clone()).is_some() {
                return Err(ValidationError::invalid_format(
                    "plan_catalog",
                    format!("duplicate tier {:?}", tier.id),
                ));
            }
        }
        if let Some(missing) = PlanTierId::ALL.iter().find(|id| !map.contains_key(id)) {
            return Err(ValidationError::invalid_format(
                "plan_catalog",
                format!("missing tier {:?}", missing),
            ));
        }
        Ok(Self { tiers: map })
    }

    /// The production catalog.
    ///
    /// | Tier | Questions | Concursos | Comments | Stats | AI msgs | Audio | Notes | Price |
    /// |------|-----------|-----------|----------|-------|---------|-------|-------|-------|
    /// | Trial | Unlimited | Unlimited | Yes | Yes | 20 | No | Yes | 0 |
    /// | Free | `free_question_limit` | Unlimited | No | No | 0 | No | No | 0 |
    /// | Individual | Unlimited | 1 | Yes | Yes | 50 | No | Yes | R$ 29,90 |
    /// | Plus | Unlimited | Unlimited | Yes | Yes | 200 | Yes | Yes | R$ 49,90 |
    pub fn standard(free_question_limit: u32) -> Self {
        let tiers = vec![
            PlanTier {
                id: PlanTierId::Trial,
                question_limit: None,
                max_concursos: None,
                has_comments: true,
                has_advanced_stats: true,
                has_ai: true,
                ai_message_limit: 20,
                has_audio_comments: false,
                has_notes: true,
                price_cents: 0,
            },
            PlanTier {
                id: PlanTierId::Free,
                question_limit: Some(free_question_limit),
                max_concursos: None,
                has_comments: false,
                has_advanced_stats: false,
                has_ai: false,
                ai_message_limit: 0,
                has_audio_comments: false,
                has_notes: false,
                price_cents: 0,
            },
            PlanTier {
                id: PlanTierId::Individual,
                question_limit: None,
                max_concursos: Some(1),
                has_comments: true,
                has_advanced_stats: true,
                has_ai: true,
                ai_message_limit: 50,
                has_audio_comments: false,
                has_notes: true,
                price_cents: 2990,
            },
            PlanTier {
                id: PlanTierId::Plus,
                question_limit: None,
                max_concursos: None,
                has_comments: true,
                has_advanced_stats: true,
                has_ai: true,
                ai_message_limit: 200,
                has_audio_comments: true,
                has_notes: true,
                price_cents: 4990,
            },
        ];

        let tiers = tiers.into_iter().map(|t| (t.id, t)).collect();
        Self { tiers }
    }

    /// Returns the tier description. Every id is present by construction.
    pub fn tier(&self, id: PlanTierId) -> &PlanTier {
        &self.tiers[&id]
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard(DEFAULT_FREE_QUESTION_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_has_ten_questions() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.tier(PlanTierId::Free).question_limit, Some(10));
    }

    #[test]
    fn paid_tiers_are_unlimited() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.tier(PlanTierId::Individual).question_limit, None);
        assert_eq!(catalog.tier(PlanTierId::Plus).question_limit, None);
    }

    #[test]
    fn individual_tier_holds_one_concurso() {
        let catalog = PlanCatalog::default();
        let individual = catalog.tier(PlanTierId::Individual);
        assert!(!individual.concurso_limit_reached(0));
        assert!(individual.concurso_limit_reached(1));
    }

    #[test]
    fn remaining_questions_saturates_at_zero() {
        let catalog = PlanCatalog::default();
        let free = catalog.tier(PlanTierId::Free);
        assert_eq!(free.remaining_questions(3), Some(7));
        assert_eq!(free.remaining_questions(12), Some(0));
        assert!(free.question_limit_reached(10));
        assert!(!free.question_limit_reached(9));
    }

    #[test]
    fn unlimited_tier_never_reaches_limit() {
        let catalog = PlanCatalog::default();
        let plus = catalog.tier(PlanTierId::Plus);
        assert_eq!(plus.remaining_questions(10_000), None);
        assert!(!plus.question_limit_reached(10_000));
    }

    #[test]
    fn custom_free_limit_is_honoured() {
        let catalog = PlanCatalog::standard(3);
        assert_eq!(catalog.tier(PlanTierId::Free).question_limit, Some(3));
    }

    #[test]
    fn new_rejects_incomplete_catalog() {
        let only_free = PlanCatalog::default().tier(PlanTierId::Free).clone();
        assert!(PlanCatalog::new(vec![only_free]).is_err());
    }

    #[test]
    fn new_rejects_duplicates() {
        let standard = PlanCatalog::default();
        let mut tiers: Vec<PlanTier> = PlanTierId::ALL
            .iter()
            .map(|id| standard.tier(*id).clone())
            .collect();
        tiers.push(standard.tier(PlanTierId::Plus).clone());
        assert!(PlanCatalog::new(tiers).is_err());
    }

    #[test]
    fn new_accepts_full_fixture() {
        let standard = PlanCatalog::standard(5);
        let tiers = PlanTierId::ALL
            .iter()
            .map(|id| standard.tier(*id).clone())
            .collect();
        assert_eq!(PlanCatalog::new(tiers).unwrap(), standard);
    }
}
