use crate::domain::{
    models::OptimizationProblem,
    solver_service::{Result, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver based on the problem configuration
    pub fn create_solver(problem: &OptimizationProblem) -> Result<Arc<dyn SolverService>> {
        Self::create_from_backend(problem.solver_config.backend)
    }

    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Self::default_solver(),
            SolverBackend::Highs => Self::highs(),
            SolverBackend::CoinCbc => Self::coin_cbc(),
        }
    }

    /// HiGHS when compiled in, CBC otherwise
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        Self::highs().or_else(|_| Self::coin_cbc())
    }

    #[cfg(feature = "highs")]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(HighsSolver::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Err(crate::domain::SolverError::SolverNotAvailable(
            "HiGHS (enable the `highs` feature)".to_string(),
        ))
    }

    #[cfg(feature = "cbc")]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(CoinCbcSolver::new()))
    }

    #[cfg(not(feature = "cbc"))]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Err(crate::domain::SolverError::SolverNotAvailable(
            "COIN-OR CBC (enable the `cbc` feature)".to_string(),
        ))
    }
}
