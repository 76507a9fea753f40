//! Edge-list state machines for status enums (plan requests, grants).

use std::fmt::Debug;

use super::ValidationError;

/// A status enum that declares its outgoing edges.
///
/// ```ignore
/// let next = PlanRequestStatus::AguardandoPagamento
///     .transition_to(PlanRequestStatus::PagamentoConfirmado)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + Debug + 'static {
    /// Every state reachable in one step from `self`.
    fn valid_transitions(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state_transition",
                format!("{:?} cannot move to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// No outgoing edges.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
