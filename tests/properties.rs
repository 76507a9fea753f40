//! Property tests for quota accounting and bounded histories.

use std::sync::Arc;

use proptest::prelude::*;

use concurso_prep::adapters::random::ThreadRandom;
use concurso_prep::adapters::content::InMemoryQuestionCatalog;
use concurso_prep::adapters::storage::InMemoryKeyValueStore;
use concurso_prep::application::{CoreServices, CoreSettings};
use concurso_prep::domain::coaching::{
    classify, ErrorHistory, ErrorRecord, ErrorType, WrongAnswer, ERROR_HISTORY_CAP,
};
use concurso_prep::domain::foundation::{QuestionId, Timestamp, UserId};
use concurso_prep::domain::plan::PlanCatalog;

fn services(limit: u32) -> CoreServices {
    CoreServices::build(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(InMemoryQuestionCatalog::new()),
        Arc::new(ThreadRandom),
        CoreSettings {
            plans: PlanCatalog::standard(limit),
            ..CoreSettings::default()
        },
    )
}

fn record(n: usize, subject: &str, error_type: ErrorType) -> ErrorRecord {
    ErrorRecord {
        question_id: QuestionId::new(format!("q{}", n)).unwrap(),
        user_id: UserId::new("ana@example.com").unwrap(),
        subject_name: subject.to_string(),
        error_type,
        timestamp: Timestamp::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// After n distinct questions a free user has max(0, limit - n) left.
    #[test]
    fn free_quota_counts_down_to_zero(limit in 1u32..20, answered in 0u32..40) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let services = services(limit);
            let ana = UserId::new("ana@example.com").unwrap();
            let mut previous = services.quota.remaining(&ana).await;
            for n in 0..answered {
                let q = QuestionId::new(format!("q{}", n)).unwrap();
                services.quota.record_question(&ana, &q).await.unwrap();
                let now = services.quota.remaining(&ana).await;
                prop_assert!(now <= previous);
                previous = now;
            }
            prop_assert_eq!(previous, Some(limit.saturating_sub(answered)));
            prop_assert_eq!(
                services.quota.has_reached_limit(&ana).await,
                answered >= limit
            );
            Ok(())
        })?;
    }

    /// Counting the same question again never consumes quota.
    #[test]
    fn repeated_questions_count_once(repeats in 1usize..10) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let services = services(10);
            let ana = UserId::new("ana@example.com").unwrap();
            let q = QuestionId::new("q1").unwrap();
            for _ in 0..repeats {
                services.quota.record_question(&ana, &q).await.unwrap();
            }
            prop_assert_eq!(services.quota.status(&ana).await.answered, 1);
            Ok(())
        })?;
    }

    /// The history keeps only the newest entries, in order.
    #[test]
    fn error_history_is_capped(pushes in 0usize..250) {
        let mut history = ErrorHistory::default();
        for n in 0..pushes {
            history.push(record(n, "Direito", ErrorType::Confusao));
        }
        prop_assert_eq!(history.len(), pushes.min(ERROR_HISTORY_CAP));
        if pushes > 0 {
            let newest = history.iter().last().unwrap();
            let expected = format!("q{}", pushes - 1);
            prop_assert_eq!(newest.question_id.as_str(), expected.as_str());
        }
    }

    /// Answers faster than a fifth of the limit are always distractions.
    #[test]
    fn hasty_answers_are_distractions(limit in 5u32..600, prior in 0usize..5) {
        let mut history = ErrorHistory::default();
        for n in 0..prior {
            history.push(record(n, "Matemática", ErrorType::Desconhecimento));
        }
        let spent = (limit - 1) / 5;
        let question = QuestionId::new("q0").unwrap();
        let answer = WrongAnswer {
            question_id: &question,
            subject_name: "Matemática",
            time_spent_seconds: spent,
            time_limit_seconds: limit,
        };
        prop_assert_eq!(classify(&history, &answer), ErrorType::Distracao);
    }
}
