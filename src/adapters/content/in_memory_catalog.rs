use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PackageId, QuestionId};
use crate::domain::quiz::Question;
use crate::ports::QuestionCatalog;

/// Top-level layout of a question file.
#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<Question>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionCatalog {
    /// Insertion order is kept so package listings are stable.
    questions: Arc<RwLock<Vec<Question>>>,
    index: Arc<RwLock<HashMap<QuestionId, usize>>>,
}

impl InMemoryQuestionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from already-validated questions.
    pub async fn with_questions(questions: Vec<Question>) -> Result<Self, DomainError> {
        let catalog = Self::new();
        for q in questions {
            catalog.insert(q).await?;
        }
        Ok(catalog)
    }

    /// Parses a YAML document of the form `questions: [...]`.
    pub async fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        let file: QuestionFile = serde_yaml::from_str(yaml).map_err(|e| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Invalid question file: {}", e),
            )
        })?;
        Self::with_questions(file.questions).await
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::storage(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml).await
    }

    /// Adds or replaces a question.
    pub async fn insert(&self, question: Question) -> Result<(), DomainError> {
        question.validate()?;
        let mut questions = self.questions.write().await;
        let mut index = self.index.write().await;
        match index.get(&question.id) {
            Some(&pos) => questions[pos] = question,
            None => {
                index.insert(question.id.clone(), questions.len());
                questions.push(question);
            }
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.questions.read().await.len()
    }
}

#[async_trait]
impl QuestionCatalog for InMemoryQuestionCatalog {
    async fn find(&self, id: &QuestionId) -> Result<Option<Question>, DomainError> {
        let index = self.index.read().await;
        let questions = self.questions.read().await;
        Ok(index.get(id).map(|&pos| questions[pos].clone()))
    }

    async fn list_by_package(&self, package: &PackageId) -> Result<Vec<Question>, DomainError> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| &q.package_id == package)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quiz::question::fixtures::question;

    const YAML: &str = r#"
questions:
  - id: q1
    title: Qual é a capital do Brasil?
    options: ["Rio", "São Paulo", "Brasília", "Salvador"]
    correct_answer: 2
    explanation: Brasília é a capital desde 1960.
    subject_name: Atualidades
    package_id: P1
    concurso_name: INSS
  - id: q2
    title: 2 + 2?
    options: ["3", "4", "5", "6"]
    correct_answer: 1
    subject_name: Matemática
    package_id: P2
    concurso_name: Banco do Brasil
    time_limit_seconds: 60
"#;

    #[tokio::test]
    async fn loads_yaml_and_finds_by_id() {
        let catalog = InMemoryQuestionCatalog::from_yaml_str(YAML).await.unwrap();
        assert_eq!(catalog.len().await, 2);

        let q = catalog
            .find(&QuestionId::new("q2").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(q.time_limit_seconds, 60);
        assert!(catalog
            .find(&QuestionId::new("nope").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lists_by_package_in_order() {
        let catalog = InMemoryQuestionCatalog::with_questions(vec![
            question("a", "Direito", "P1", "INSS"),
            question("b", "Direito", "P2", "INSS"),
            question("c", "Direito", "P1", "INSS"),
        ])
        .await
        .unwrap();

        let ids: Vec<_> = catalog
            .list_by_package(&PackageId::new("P1").unwrap())
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn invalid_question_is_rejected() {
        let mut bad = question("a", "Direito", "P1", "INSS");
        bad.correct_answer = 9;
        assert!(InMemoryQuestionCatalog::with_questions(vec![bad]).await.is_err());
    }

    #[tokio::test]
    async fn malformed_yaml_is_a_validation_error() {
        let err = InMemoryQuestionCatalog::from_yaml_str("questions: 3")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
