// Domain layer: the linear/mixed-integer model and the solver contract
pub mod domain;

// Application layer: plant location and aggregate planning formulators
pub mod application;

// Infrastructure layer: charts, configuration, logging
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, OptimizationType, Solution,
    SolutionStatus, SolverBackend, SolverConfig, SolverError, SolverService, Variable,
    VariableType,
};

pub use application::{
    AggregatePlanInput, AggregatePlanResult, AggregatePlanner, PlanError, PlanFeatures,
    PlantLocation, PlantLocationInput, PlantLocationResult, SolveOutcome,
};

pub use infrastructure::{ConfigError, RunConfig};

#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
pub use solver::SolverFactory;
