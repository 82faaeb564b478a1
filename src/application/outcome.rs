use crate::domain::SolutionStatus;

use super::error::{PlanError, Result};

/// Result of one solve: data extracted from an optimal solution, or the
/// status the solver stopped with.
///
/// "No solution exists" and "the optimum ships nothing" are different
/// variants, never an empty container.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome<T> {
    Solved(T),
    Unsolved(SolutionStatus),
}

impl<T> SolveOutcome<T> {
    pub fn status(&self) -> SolutionStatus {
        match self {
            SolveOutcome::Solved(_) => SolutionStatus::Optimal,
            SolveOutcome::Unsolved(status) => *status,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }

    pub fn solved(&self) -> Option<&T> {
        match self {
            SolveOutcome::Solved(data) => Some(data),
            SolveOutcome::Unsolved(_) => None,
        }
    }

    /// The solved data, or [`PlanError::NoSolution`] carrying the solver status.
    pub fn data(&self) -> Result<&T> {
        match self {
            SolveOutcome::Solved(data) => Ok(data),
            SolveOutcome::Unsolved(status) => Err(PlanError::NoSolution(*status)),
        }
    }
}

/// Data behind the last solve, for report operations.
pub(crate) fn reportable<T>(last: Option<&SolveOutcome<T>>) -> Result<&T> {
    last.ok_or(PlanError::NotSolved)?.data()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_reports_optimal() {
        let outcome = SolveOutcome::Solved(7);
        assert_eq!(outcome.status(), SolutionStatus::Optimal);
        assert_eq!(outcome.solved(), Some(&7));
        assert_eq!(*outcome.data().unwrap(), 7);
    }

    #[test]
    fn unsolved_carries_status() {
        let outcome: SolveOutcome<u8> = SolveOutcome::Unsolved(SolutionStatus::Infeasible);
        assert!(!outcome.is_solved());
        assert!(matches!(
            outcome.data(),
            Err(PlanError::NoSolution(SolutionStatus::Infeasible))
        ));
    }

    #[test]
    fn reports_need_a_solve_first() {
        assert!(matches!(reportable::<u8>(None), Err(PlanError::NotSolved)));
        let outcome = SolveOutcome::Solved(1u8);
        assert_eq!(*reportable(Some(&outcome)).unwrap(), 1);
    }
}
