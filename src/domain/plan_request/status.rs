//! Plan request status state machine.
//!
//! ```text
//! aguardando_pagamento -> pagamento_confirmado -> [em_criacao] -> concluido
//!          |                        |                  |
//!          v                        +---> cancelado <--+
//!  pagamento_abandonado        (from any non-terminal state)
//! ```
//!
//! The edge set here is the union for both plan types. Plan-specific
//! restrictions live on the aggregate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRequestStatus {
    /// Created; waiting for the payment provider.
    AguardandoPagamento,
    PagamentoConfirmado,
    /// Individual plans only: the personalised plan is being built.
    EmCriacao,
    Concluido,
    PagamentoAbandonado,
    Cancelado,
}

impl PlanRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanRequestStatus::AguardandoPagamento => "aguardando_pagamento",
            PlanRequestStatus::PagamentoConfirmado => "pagamento_confirmado",
            PlanRequestStatus::EmCriacao => "em_criacao",
            PlanRequestStatus::Concluido => "concluido",
            PlanRequestStatus::PagamentoAbandonado => "pagamento_abandonado",
            PlanRequestStatus::Cancelado => "cancelado",
        }
    }
}

impl fmt::Display for PlanRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for PlanRequestStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use PlanRequestStatus::*;
        match self {
            AguardandoPagamento => &[PagamentoConfirmado, PagamentoAbandonado, Cancelado],
            PagamentoConfirmado => &[EmCriacao, Concluido, Cancelado],
            EmCriacao => &[Concluido, Cancelado],
            Concluido | PagamentoAbandonado | Cancelado => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlanRequestStatus::*;

    const ALL: [PlanRequestStatus; 6] = [
        AguardandoPagamento,
        PagamentoConfirmado,
        EmCriacao,
        Concluido,
        PagamentoAbandonado,
        Cancelado,
    ];

    #[test]
    fn terminal_states() {
        assert!(Concluido.is_terminal());
        assert!(Cancelado.is_terminal());
        assert!(PagamentoAbandonado.is_terminal());
        assert!(!EmCriacao.is_terminal());
    }

    #[test]
    fn no_status_loops_to_itself() {
        for status in ALL {
            assert!(!status.can_transition_to(&status), "{}", status);
        }
    }

    #[test]
    fn cancel_is_reachable_from_every_non_terminal_state() {
        for status in ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(&Cancelado), "{}", status);
        }
    }

    #[test]
    fn abandonment_only_while_awaiting_payment() {
        assert!(AguardandoPagamento.can_transition_to(&PagamentoAbandonado));
        assert!(!PagamentoConfirmado.can_transition_to(&PagamentoAbandonado));
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&AguardandoPagamento).unwrap();
        assert_eq!(json, "\"aguardando_pagamento\"");
        let parsed: PlanRequestStatus = serde_json::from_str("\"em_criacao\"").unwrap();
        assert_eq!(parsed, EmCriacao);
    }
}
