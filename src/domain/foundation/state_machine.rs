//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle states (protocol sessions, for instance) one way to
//! declare their legal transitions and to move between them.

use super::ValidationError;

/// A lifecycle enum with a fixed transition table.
///
/// Implementors list the legal targets of each state in
/// [`valid_transitions`](StateMachine::valid_transitions); checked
/// transitions and terminal detection follow from that table.
///
/// # Example
///
/// ```
/// use ai_maps::domain::foundation::StateMachine;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Link { Down, Up, Closed }
///
/// impl StateMachine for Link {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Link::Down => vec![Link::Up, Link::Closed],
///             Link::Up => vec![Link::Closed],
///             Link::Closed => vec![],
///         }
///     }
/// }
///
/// assert_eq!(Link::Down.transition_to(Link::Up), Ok(Link::Up));
/// assert!(Link::Closed.transition_to(Link::Up).is_err());
/// assert!(Link::Closed.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns every state reachable in one step from this state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if moving from self to target is legal.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Moves to `target`, or fails if the table forbids it.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Returns true if no transition leaves this state.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
