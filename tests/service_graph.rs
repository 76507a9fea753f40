//! Integration tests driving the full service graph without HTTP.

use std::sync::Arc;

use concurso_prep::adapters::content::InMemoryQuestionCatalog;
use concurso_prep::adapters::random::{FixedRandom, SeededRandom};
use concurso_prep::adapters::storage::{FileKeyValueStore, InMemoryKeyValueStore};
use concurso_prep::application::{CoreServices, CoreSettings, CreatePlanRequest};
use concurso_prep::domain::coaching::ErrorType;
use concurso_prep::domain::foundation::{ErrorCode, PackageId, QuestionId, UserId};
use concurso_prep::domain::plan::PlanTierId;
use concurso_prep::domain::plan_request::{PlanRequestStatus, RequestedPlan};
use concurso_prep::domain::quiz::Question;
use concurso_prep::ports::KeyValueStore;

fn question(id: &str, subject: &str, concurso: &str) -> Question {
    Question {
        id: QuestionId::new(id).unwrap(),
        title: format!("Questão {}", id),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: 3,
        explanation: String::new(),
        subject_name: subject.into(),
        package_id: PackageId::new("P1").unwrap(),
        concurso_name: concurso.into(),
        time_limit_seconds: 120,
    }
}

async fn services_over(store: Arc<dyn KeyValueStore>) -> CoreServices {
    let catalog = InMemoryQuestionCatalog::with_questions(vec![
        question("q1", "Direito Constitucional", "TRF"),
        question("q2", "Direito Constitucional", "TRF"),
        question("q3", "Português", "TRF"),
        question("q4", "Português", "INSS"),
    ])
    .await
    .unwrap();
    CoreServices::build(
        store,
        Arc::new(catalog),
        Arc::new(SeededRandom::new(7)),
        CoreSettings::default(),
    )
}

fn user(email: &str) -> UserId {
    UserId::new(email).unwrap()
}

fn q(id: &str) -> QuestionId {
    QuestionId::new(id).unwrap()
}

#[tokio::test]
async fn answers_survive_a_restart_on_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let ana = user("ana@example.com");
    let p1 = PackageId::new("P1").unwrap();

    {
        let services = services_over(Arc::new(FileKeyValueStore::new(dir.path()))).await;
        let mut session = services.quiz.session(ana.clone());
        session.answer(&q("q1"), 3, 30).await.unwrap().unwrap();
        session.answer(&q("q2"), 0, 30).await.unwrap().unwrap();
    }

    let services = services_over(Arc::new(FileKeyValueStore::new(dir.path()))).await;
    assert_eq!(services.quota.status(&ana).await.answered, 2);
    let progress = services
        .progress
        .subject(&ana, &p1, "Direito Constitucional")
        .await;
    assert_eq!(progress.answered_count, 2);
    assert_eq!(progress.correct_count, 1);
    assert_eq!(services.classifier.history(&ana).await.len(), 1);

    let mut session = services.quiz.session(ana.clone());
    let state = session.navigate(&q("q1")).await.unwrap();
    assert_eq!(state.name(), "revealed");
}

#[tokio::test]
async fn repeated_subject_errors_escalate() {
    let services = services_over(Arc::new(InMemoryKeyValueStore::new())).await;
    let ana = user("ana@example.com");
    let mut session = services.quiz.session(ana.clone());

    let first = session.answer(&q("q1"), 0, 60).await.unwrap().unwrap();
    assert_eq!(first.error.unwrap().error_type, ErrorType::Desconhecimento);

    let second = session.answer(&q("q2"), 0, 60).await.unwrap().unwrap();
    assert_eq!(second.error.unwrap().error_type, ErrorType::Interpretacao);

    let hasty = session.answer(&q("q3"), 0, 3).await.unwrap().unwrap();
    assert_eq!(hasty.error.unwrap().error_type, ErrorType::Distracao);
}

#[tokio::test]
async fn individual_purchase_grants_the_desired_concurso() {
    let services = services_over(Arc::new(InMemoryKeyValueStore::new())).await;
    let bia = user("bia@example.com");

    let request = services
        .plan_requests
        .create(CreatePlanRequest {
            user_id: bia.clone(),
            user_email: Some("bia@example.com".into()),
            user_name: Some("Bia".into()),
            plan_type: RequestedPlan::Individual,
            concurso_desejado: Some("  TRF ".into()),
        })
        .await
        .unwrap();
    assert_eq!(request.concurso_desejado.as_deref(), Some("TRF"));

    let workflow = &services.plan_requests;
    workflow.confirm_payment(&request.id).await.unwrap();
    let err = workflow
        .update_status(&request.id, PlanRequestStatus::Concluido)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStateTransition);

    workflow
        .update_status(&request.id, PlanRequestStatus::EmCriacao)
        .await
        .unwrap();
    let done = workflow
        .update_status(&request.id, PlanRequestStatus::Concluido)
        .await
        .unwrap();
    assert!(done.completed_at.is_some());

    assert_eq!(services.entitlements.resolve_plan(&bia).await, PlanTierId::Individual);
    assert!(services.entitlements.can_access_concurso(&bia, "TRF").await);
    assert!(!services.entitlements.can_access_concurso(&bia, "INSS").await);

    let mut session = services.quiz.session(bia);
    assert!(session.answer(&q("q1"), 3, 30).await.unwrap().is_some());
    let err = session.navigate(&q("q4")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AccessDenied);
}

#[tokio::test]
async fn unavailable_store_fails_writes_but_not_reads() {
    let raw = InMemoryKeyValueStore::new();
    let services = services_over(Arc::new(raw.clone())).await;
    let ana = user("ana@example.com");

    raw.set_unavailable(true);
    assert_eq!(services.entitlements.resolve_plan(&ana).await, PlanTierId::Free);
    assert_eq!(services.quota.remaining(&ana).await, Some(10));

    let mut session = services.quiz.session(ana.clone());
    session.navigate(&q("q1")).await.unwrap();
    session.select(3).unwrap();
    let err = session.confirm(10).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageUnavailable);
    assert_eq!(session.state().unwrap().name(), "selected");

    raw.set_unavailable(false);
    assert!(session.confirm(10).await.unwrap().is_some());
}

#[tokio::test]
async fn favorites_steer_recommendations() {
    let raw = InMemoryKeyValueStore::new();
    let catalog = InMemoryQuestionCatalog::new();
    let services = CoreServices::build(
        Arc::new(raw),
        Arc::new(catalog),
        Arc::new(FixedRandom(0.0)),
        CoreSettings::default(),
    );
    let ana = user("ana@example.com");
    services
        .recommender
        .set_favorite(&ana, "simulados", true)
        .await
        .unwrap();

    let chosen = services
        .recommender
        .recommend(&ana, &Default::default())
        .await
        .unwrap();
    assert_eq!(chosen.id, "simulados");
}
