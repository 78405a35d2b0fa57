//! Transition table shared by order and subscription statuses.

use super::ValidationError;

/// A status enum with an explicit transition table.
///
/// Implementors list the legal edges; aggregates call [`transition_to`]
/// before mutating and surface the error as their own invalid-state error.
///
/// [`transition_to`]: StateMachine::transition_to
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every legal target from `self`. Empty for terminal states.
    fn valid_transitions(&self) -> Vec<Self>;

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            return Ok(target);
        }
        Err(ValidationError::invalid_format(
            "state_transition",
            format!("Cannot transition from {:?} to {:?}", self, target),
        ))
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
