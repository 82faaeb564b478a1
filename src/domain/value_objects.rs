// Domain value objects shared by the formulators and the solver adapters

use std::fmt;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

impl ConstraintType {
    /// Amount by which `lhs` breaks the constraint against `bound` (0 when satisfied).
    pub fn violation(&self, lhs: f64, bound: f64) -> f64 {
        match self {
            ConstraintType::LessThanOrEqual => (lhs - bound).max(0.0),
            ConstraintType::Equal => (lhs - bound).abs(),
            ConstraintType::GreaterThanOrEqual => (bound - lhs).max(0.0),
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of the optimization solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached
    TimeLimit,
    /// Iteration limit reached
    IterationLimit,
    /// Solve interrupted by user
    Interrupted,
    /// Solver returned without a verdict
    NotSolved,
}

impl SolutionStatus {
    pub fn is_optimal(&self) -> bool {
        *self == SolutionStatus::Optimal
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
            SolutionStatus::IterationLimit => write!(f, "Iteration Limit Reached"),
            SolutionStatus::Interrupted => write!(f, "Interrupted"),
            SolutionStatus::NotSolved => write!(f, "Not Solved"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverBackend {
    /// Use the first backend compiled in (HiGHS, then CBC)
    #[default]
    Auto,
    /// COIN-OR CBC solver
    CoinCbc,
    /// HiGHS solver
    Highs,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_is_zero_when_satisfied() {
        assert_eq!(ConstraintType::LessThanOrEqual.violation(3.0, 5.0), 0.0);
        assert_eq!(ConstraintType::GreaterThanOrEqual.violation(7.0, 5.0), 0.0);
        assert_eq!(ConstraintType::Equal.violation(5.0, 5.0), 0.0);
    }

    #[test]
    fn violation_measures_excess() {
        assert_eq!(ConstraintType::LessThanOrEqual.violation(6.5, 5.0), 1.5);
        assert_eq!(ConstraintType::GreaterThanOrEqual.violation(4.0, 5.0), 1.0);
        assert_eq!(ConstraintType::Equal.violation(3.0, 5.0), 2.0);
    }

    #[test]
    fn only_optimal_counts_as_optimal() {
        assert!(SolutionStatus::Optimal.is_optimal());
        assert!(!SolutionStatus::Interrupted.is_optimal());
        assert!(!SolutionStatus::TimeLimit.is_optimal());
        assert_eq!(SolutionStatus::TimeLimit.to_string(), "Time Limit Reached");
    }
}
