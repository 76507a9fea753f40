//! Study technique catalog and the subject type table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Inferred type of the questions in a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Math and logic.
    Calculation,
    /// Text and interpretation.
    Interpretive,
    /// Law and other concept-heavy subjects.
    Conceptual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueCategory {
    ActiveRecall,
    Foundational,
    Practice,
    Memorization,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyTechnique {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Subject names (or fragments) the technique suits.
    pub subject_tags: Vec<String>,
    pub question_types: Vec<QuestionType>,
    pub categories: Vec<TechniqueCategory>,
}

impl StudyTechnique {
    /// Case-insensitive substring match in either direction.
    pub fn matches_subject(&self, subject: &str) -> bool {
        let subject = subject.trim().to_lowercase();
        if subject.is_empty() {
            return false;
        }
        self.subject_tags.iter().any(|tag| {
            let tag = tag.to_lowercase();
            subject.contains(&tag) || tag.contains(&subject)
        })
    }

    pub fn has_category(&self, category: TechniqueCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn suits(&self, question_type: QuestionType) -> bool {
        self.question_types.contains(&question_type)
    }
}

fn technique(
    id: &str,
    name: &str,
    description: &str,
    tags: &[&str],
    types: &[QuestionType],
    categories: &[TechniqueCategory],
) -> StudyTechnique {
    StudyTechnique {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        subject_tags: tags.iter().map(|t| t.to_string()).collect(),
        question_types: types.to_vec(),
        categories: categories.to_vec(),
    }
}

/// Immutable set of techniques the recommender chooses from.
#[derive(Debug, Clone)]
pub struct TechniqueCatalog {
    techniques: Vec<StudyTechnique>,
}

impl TechniqueCatalog {
    /// Builds a catalog, rejecting empty input and duplicate ids.
    pub fn new(techniques: Vec<StudyTechnique>) -> Result<Self, ValidationError> {
        if techniques.is_empty() {
            return Err(ValidationError::empty_field("techniques"));
        }
        let mut seen = HashSet::new();
        for t in &techniques {
            if !seen.insert(t.id.as_str()) {
                return Err(ValidationError::invalid_format(
                    "techniques",
                    format!("duplicate technique id '{}'", t.id),
                ));
            }
        }
        Ok(Self { techniques })
    }

    /// The twelve built-in techniques.
    pub fn standard() -> Self {
        use QuestionType::*;
        use TechniqueCategory::*;

        Self {
            techniques: vec![
                technique(
                    "recuperacao_ativa",
                    "Recuperação Ativa",
                    "Feche o material e tente lembrar o conteúdo antes de conferir.",
                    &["direito", "legislação", "biologia"],
                    &[Conceptual],
                    &[ActiveRecall],
                ),
                technique(
                    "repeticao_espacada",
                    "Repetição Espaçada",
                    "Revise o mesmo conteúdo em intervalos crescentes.",
                    &["legislação", "inglês", "história"],
                    &[Conceptual, Interpretive],
                    &[Memorization, ActiveRecall],
                ),
                technique(
                    "flashcards",
                    "Flashcards",
                    "Crie cartões de pergunta e resposta para os pontos-chave.",
                    &["direito constitucional", "direito administrativo", "inglês"],
                    &[Conceptual],
                    &[ActiveRecall, Memorization],
                ),
                technique(
                    "feynman",
                    "Técnica Feynman",
                    "Explique o tema com palavras simples, como para um leigo.",
                    &["física", "economia", "administração"],
                    &[Conceptual, Calculation],
                    &[Foundational],
                ),
                technique(
                    "mapas_mentais",
                    "Mapas Mentais",
                    "Organize o assunto em um diagrama a partir da ideia central.",
                    &["administração", "história", "geografia"],
                    &[Conceptual],
                    &[Organization, Foundational],
                ),
                technique(
                    "resolucao_exercicios",
                    "Resolução de Exercícios",
                    "Resolva muitas questões do mesmo tipo até automatizar.",
                    &["matemática", "raciocínio lógico", "contabilidade"],
                    &[Calculation],
                    &[Practice],
                ),
                technique(
                    "pratica_intercalada",
                    "Prática Intercalada",
                    "Alterne tipos de problema na mesma sessão de estudo.",
                    &["matemática", "estatística", "física"],
                    &[Calculation],
                    &[Practice],
                ),
                technique(
                    "leitura_ativa",
                    "Leitura Ativa",
                    "Leia com marcações e perguntas na margem do texto.",
                    &["português", "interpretação de texto", "redação"],
                    &[Interpretive],
                    &[Foundational],
                ),
                technique(
                    "resumos",
                    "Resumos",
                    "Condense cada tópico em poucas linhas com suas palavras.",
                    &["direito", "português", "atualidades"],
                    &[Conceptual, Interpretive],
                    &[Organization],
                ),
                technique(
                    "pomodoro",
                    "Pomodoro",
                    "Estude em blocos de 25 minutos com pausas curtas.",
                    &[],
                    &[Calculation, Interpretive, Conceptual],
                    &[Organization],
                ),
                technique(
                    "autoexplicacao",
                    "Autoexplicação",
                    "Justifique cada passo da resolução para si mesmo.",
                    &["raciocínio lógico", "matemática financeira"],
                    &[Calculation],
                    &[ActiveRecall, Foundational],
                ),
                technique(
                    "simulados",
                    "Simulados Cronometrados",
                    "Resolva provas completas respeitando o tempo real.",
                    &["informática", "conhecimentos gerais"],
                    &[Interpretive, Conceptual],
                    &[Practice, ActiveRecall],
                ),
            ],
        }
    }

    pub fn all(&self) -> &[StudyTechnique] {
        &self.techniques
    }

    pub fn get(&self, id: &str) -> Option<&StudyTechnique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }
}

impl Default for TechniqueCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Keyword table inferring a subject's question type.
#[derive(Debug, Clone)]
pub struct SubjectBuckets {
    entries: Vec<(String, QuestionType)>,
}

impl SubjectBuckets {
    pub fn new(entries: Vec<(String, QuestionType)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, t)| (k.to_lowercase(), t))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        use QuestionType::*;
        let table: &[(&str, QuestionType)] = &[
            ("matemática", Calculation),
            ("raciocínio lógico", Calculation),
            ("lógica", Calculation),
            ("estatística", Calculation),
            ("contabilidade", Calculation),
            ("física", Calculation),
            ("portugu", Interpretive),
            ("interpretação", Interpretive),
            ("redação", Interpretive),
            ("inglês", Interpretive),
            ("literatura", Interpretive),
            ("direito", Conceptual),
            ("legislação", Conceptual),
            ("administração", Conceptual),
            ("informática", Conceptual),
            ("ética", Conceptual),
            ("atualidades", Conceptual),
        ];
        Self::new(table.iter().map(|(k, t)| (k.to_string(), *t)).collect())
    }

    /// First keyword contained in the subject wins.
    pub fn bucket_for(&self, subject: &str) -> Option<QuestionType> {
        let subject = subject.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| subject.contains(keyword.as_str()))
            .map(|(_, t)| *t)
    }
}

impl Default for SubjectBuckets {
    fn default() -> Self {
        Self::standard()
    }
}
