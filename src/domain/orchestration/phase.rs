//! Phases of one orchestration session.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationPhase {
    Planning,
    Executing,
    Evaluating,
    Finishing,
    Done,
}

impl StateMachine for OrchestrationPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrchestrationPhase::*;
        match self {
            Planning => vec![Executing, Finishing],
            Executing => vec![Evaluating],
            Evaluating => vec![Planning, Finishing],
            Finishing => vec![Done],
            Done => vec![],
        }
    }
}

impl fmt::Display for OrchestrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planning => "PLANNING",
            Self::Executing => "EXECUTING",
            Self::Evaluating => "EVALUATING",
            Self::Finishing => "FINISHING",
            Self::Done => "DONE",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestrationPhase::*;

    #[test]
    fn loop_edges_are_allowed() {
        assert!(Planning.can_transition_to(&Executing));
        assert!(Executing.can_transition_to(&Evaluating));
        assert!(Evaluating.can_transition_to(&Planning));
        assert!(Evaluating.can_transition_to(&Finishing));
        assert!(Finishing.can_transition_to(&Done));
    }

    #[test]
    fn planner_stop_skips_straight_to_finishing() {
        assert_eq!(Planning.transition_to(Finishing), Ok(Finishing));
    }

    #[test]
    fn executing_cannot_skip_evaluation() {
        assert!(Executing.transition_to(Finishing).is_err());
        assert!(Executing.transition_to(Planning).is_err());
    }

    #[test]
    fn done_is_terminal() {
        assert!(Done.is_terminal());
        assert!(!Finishing.is_terminal());
    }
}
