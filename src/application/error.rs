use crate::domain::{SolutionStatus, SolverError};

/// Errors raised by the formulators and their reports
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Shape mismatch: {what} has length {found}, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No solution available (solver status: {0})")]
    NoSolution(SolutionStatus),

    #[error("Nothing to report: solve has not been called")]
    NotSolved,

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Chart rendering failed: {0}")]
    Chart(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PlanError>;

pub(crate) fn check_len(what: impl Into<String>, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(PlanError::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        })
    }
}

/// Every entry must be finite and non-negative.
pub(crate) fn check_non_negative(what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite() || *v < 0.0) {
        None => Ok(()),
        Some(i) => Err(PlanError::InvalidInput(format!(
            "{}[{}] = {} must be a finite non-negative number",
            what, i, values[i]
        ))),
    }
}

/// Both components of every point must be finite.
pub(crate) fn check_finite_points(what: &str, points: &[(f64, f64)]) -> Result<()> {
    match points
        .iter()
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        None => Ok(()),
        Some(i) => Err(PlanError::InvalidInput(format!(
            "{}[{}] = {:?} must be a finite coordinate pair",
            what, i, points[i]
        ))),
    }
}
