//! Application layer - services orchestrating domain logic over ports.
//!
//! - `store` - Typed, degrading reads over the key-value store
//! - `entitlement` - Plan resolution, access checks, admin grants
//! - `quota` - Lifetime question quota
//! - `progress` - Answer sheets and subject progress
//! - `coaching` - Error classification and technique recommendation
//! - `quiz_session` - The answer flow tying the above together
//! - `plan_requests` - Paid plan purchase workflow

mod coaching;
mod entitlement;
mod plan_requests;
mod progress;
mod quiz_session;
mod quota;
mod store;

use std::sync::Arc;

pub use coaching::{
    ClassifiedError, ErrorClassifier, ErrorSummary, ErrorTypeCount, RecommendationRequest,
    SubjectErrors, TechniqueRecommender,
};
pub use entitlement::EntitlementResolver;
pub use plan_requests::{CreatePlanRequest, PlanRequestWorkflow};
pub use progress::{PackageProgress, ProgressAggregator};
pub use quiz_session::{QuizService, QuizSession, RevealOutcome};
pub use quota::{QuestionQuota, QuotaStatus, UPGRADE_PROMPT};
pub use store::TypedStore;

use crate::domain::coaching::{SubjectBuckets, TechniqueCatalog};
use crate::domain::foundation::UserId;
use crate::domain::plan::PlanCatalog;
use crate::ports::{KeyValueStore, QuestionCatalog, RandomSource};

/// Static data and policy injected at startup.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub plans: PlanCatalog,
    pub techniques: TechniqueCatalog,
    pub subject_buckets: SubjectBuckets,
    pub admins: Vec<UserId>,
    pub payment_link_base: Option<String>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            plans: PlanCatalog::default(),
            techniques: TechniqueCatalog::standard(),
            subject_buckets: SubjectBuckets::standard(),
            admins: Vec::new(),
            payment_link_base: None,
        }
    }
}

/// Every application service, wired over one store.
#[derive(Clone)]
pub struct CoreServices {
    pub entitlements: Arc<EntitlementResolver>,
    pub quota: Arc<QuestionQuota>,
    pub progress: Arc<ProgressAggregator>,
    pub classifier: Arc<ErrorClassifier>,
    pub recommender: Arc<TechniqueRecommender>,
    pub quiz: QuizService,
    pub plan_requests: Arc<PlanRequestWorkflow>,
}

impl CoreServices {
    pub fn build(
        store: Arc<dyn KeyValueStore>,
        questions: Arc<dyn QuestionCatalog>,
        random: Arc<dyn RandomSource>,
        settings: CoreSettings,
    ) -> Self {
        let store = TypedStore::new(store);
        let entitlements = Arc::new(EntitlementResolver::new(
            store.clone(),
            Arc::new(settings.plans),
            settings.admins,
        ));
        let quota = Arc::new(QuestionQuota::new(store.clone(), entitlements.clone()));
        let progress = Arc::new(ProgressAggregator::new(store.clone()));
        let classifier = Arc::new(ErrorClassifier::new(store.clone(), random.clone()));
        let recommender = Arc::new(TechniqueRecommender::new(
            store.clone(),
            Arc::new(settings.techniques),
            Arc::new(settings.subject_buckets),
            random,
        ));
        let quiz = QuizService::new(
            questions,
            entitlements.clone(),
            quota.clone(),
            progress.clone(),
            classifier.clone(),
            recommender.clone(),
        );
        let plan_requests = Arc::new(PlanRequestWorkflow::new(
            store,
            entitlements.clone(),
            quota.clone(),
            settings.payment_link_base,
        ));

        Self {
            entitlements,
            quota,
            progress,
            classifier,
            recommender,
            quiz,
            plan_requests,
        }
    }
}
