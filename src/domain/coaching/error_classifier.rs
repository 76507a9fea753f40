//! Heuristic labelling of wrong answers.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{QuestionId, Timestamp, UserId};

/// Most recent error records kept per user.
pub const ERROR_HISTORY_CAP: usize = 100;

/// Category assigned to a wrong answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// Knowledge gap.
    Desconhecimento,
    /// Conceptual confusion.
    Confusao,
    /// Misreading the statement.
    Interpretacao,
    /// Carelessness; answered too fast.
    Distracao,
}

impl ErrorType {
    pub const ALL: [ErrorType; 4] = [
        ErrorType::Desconhecimento,
        ErrorType::Confusao,
        ErrorType::Interpretacao,
        ErrorType::Distracao,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Desconhecimento => "desconhecimento",
            ErrorType::Confusao => "confusao",
            ErrorType::Interpretacao => "interpretacao",
            ErrorType::Distracao => "distracao",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub subject_name: String,
    pub error_type: ErrorType,
    pub timestamp: Timestamp,
}

/// Bounded FIFO log of a user's wrong answers, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHistory {
    records: VecDeque<ErrorRecord>,
}

impl ErrorHistory {
    /// Appends `record`, evicting the oldest entries past the cap.
    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push_back(record);
        while self.records.len() > ERROR_HISTORY_CAP {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn has_error_on(&self, question: &QuestionId) -> bool {
        self.records.iter().any(|r| &r.question_id == question)
    }

    pub fn errors_in_subject(&self, subject: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.subject_name == subject)
            .count()
    }

    /// Count per error type, every type present.
    pub fn counts_by_type(&self) -> Vec<(ErrorType, u32)> {
        ErrorType::ALL
            .iter()
            .map(|t| {
                let n = self.records.iter().filter(|r| r.error_type == *t).count();
                (*t, n as u32)
            })
            .collect()
    }
}

/// Signals describing one wrong answer.
#[derive(Debug, Clone, Copy)]
pub struct WrongAnswer<'a> {
    pub question_id: &'a QuestionId,
    pub subject_name: &'a str,
    pub time_spent_seconds: u32,
    pub time_limit_seconds: u32,
}

/// Labels a wrong answer against the history *before* it is appended.
///
/// Rules are ordered; the first match wins.
pub fn classify(history: &ErrorHistory, answer: &WrongAnswer<'_>) -> ErrorType {
    // 5x spent < limit is the integer form of spent < 0.2 * limit.
    if u64::from(answer.time_spent_seconds) * 5 < u64::from(answer.time_limit_seconds) {
        return ErrorType::Distracao;
    }
    if history.has_error_on(answer.question_id) {
        return ErrorType::Confusao;
    }
    match history.errors_in_subject(answer.subject_name) {
        0 => ErrorType::Desconhecimento,
        1 | 2 => ErrorType::Interpretacao,
        _ => ErrorType::Confusao,
    }
}

/// Display text for a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorInsight {
    pub insight: &'static str,
    pub correction_tip: &'static str,
}

const DESCONHECIMENTO: &[ErrorInsight] = &[
    ErrorInsight {
        insight: "Este conteúdo parece novo para você.",
        correction_tip: "Revise a teoria do tópico antes de voltar às questões.",
    },
    ErrorInsight {
        insight: "Há uma lacuna de conhecimento neste assunto.",
        correction_tip: "Faça um resumo do tema com suas próprias palavras.",
    },
    ErrorInsight {
        insight: "Você ainda não domina a base deste tema.",
        correction_tip: "Comece por uma videoaula ou material introdutório.",
    },
];

const CONFUSAO: &[ErrorInsight] = &[
    ErrorInsight {
        insight: "Você está confundindo conceitos parecidos.",
        correction_tip: "Monte um quadro comparativo entre os conceitos.",
    },
    ErrorInsight {
        insight: "Este erro já se repetiu; o conceito ainda não está claro.",
        correction_tip: "Reescreva a explicação e refaça a questão amanhã.",
    },
    ErrorInsight {
        insight: "Os erros se acumulam nesta disciplina.",
        correction_tip: "Volte às definições e resolva questões comentadas.",
    },
];

const INTERPRETACAO: &[ErrorInsight] = &[
    ErrorInsight {
        insight: "O enunciado pode ter sido mal interpretado.",
        correction_tip: "Sublinhe palavras-chave como 'exceto' e 'incorreto'.",
    },
    ErrorInsight {
        insight: "A resposta esbarrou na leitura da questão.",
        correction_tip: "Leia o comando da questão antes das alternativas.",
    },
];

const DISTRACAO: &[ErrorInsight] = &[
    ErrorInsight {
        insight: "Você respondeu rápido demais.",
        correction_tip: "Releia todas as alternativas antes de confirmar.",
    },
    ErrorInsight {
        insight: "Foi provavelmente um erro de atenção.",
        correction_tip: "Respire e confira a alternativa marcada.",
    },
];

/// Phrases available for a category. Never empty.
pub fn phrase_bank(error_type: ErrorType) -> &'static [ErrorInsight] {
    match error_type {
        ErrorType::Desconhecimento => DESCONHECIMENTO,
        ErrorType::Confusao => CONFUSAO,
        ErrorType::Interpretacao => INTERPRETACAO,
        ErrorType::Distracao => DISTRACAO,
    }
}
