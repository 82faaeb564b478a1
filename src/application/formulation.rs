// Assembles dense OptimizationProblems from sparse per-row terms.
// Rows are only densified in `build`, once every column is known.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, Solution, SolverConfig,
    SolverError, SolverService, Variable,
};
use crate::solver::SolverFactory;

use super::error::Result;

/// Column index of a variable inside the problem being built
pub type VarId = usize;

struct Row {
    name: String,
    constraint_type: ConstraintType,
    terms: Vec<(VarId, f64)>,
    bound: f64,
}

#[derive(Default)]
pub struct ModelBuilder {
    variables: Vec<Variable>,
    costs: Vec<f64>,
    rows: Vec<Row>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column with objective coefficient `cost`
    pub fn add_variable(&mut self, variable: Variable, cost: f64) -> VarId {
        self.variables.push(variable);
        self.costs.push(cost);
        self.variables.len() - 1
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        constraint_type: ConstraintType,
        bound: f64,
    ) {
        self.rows.push(Row {
            name: name.into(),
            constraint_type,
            terms,
            bound,
        });
    }

    pub fn build(self, name: &str, config: SolverConfig) -> OptimizationProblem {
        let width = self.variables.len();
        let names = self.variables.iter().map(|v| v.name.clone()).collect();

        let constraints = self
            .rows
            .into_iter()
            .map(|row| {
                let mut coefficients = vec![0.0; width];
                // Repeated columns accumulate
                for (var, coeff) in row.terms {
                    coefficients[var] += coeff;
                }
                Constraint::new(row.constraint_type, coefficients, row.bound).with_name(row.name)
            })
            .collect();

        OptimizationProblem::new(ObjectiveFunction::minimize(self.costs).with_names(names))
            .with_name(name)
            .with_variables(self.variables)
            .with_constraints(constraints)
            .with_config(config)
    }
}

/// Hand `problem` to the injected solver, or to the one its config selects.
pub(crate) fn run_solver(
    injected: Option<&Arc<dyn SolverService>>,
    problem: &OptimizationProblem,
) -> Result<Solution> {
    let solver = match injected {
        Some(solver) => Arc::clone(solver),
        None => SolverFactory::create_solver(problem)?,
    };

    info!(
        problem = %problem.name,
        solver = solver.name(),
        variables = problem.num_variables(),
        constraints = problem.constraints.len(),
        "solving"
    );
    let solution = solver.solve(problem)?;
    info!(problem = %problem.name, status = %solution.status, "solver returned");

    if solution.is_optimal() && solution.variable_values.len() != problem.num_variables() {
        return Err(SolverError::ExecutionFailed(format!(
            "{} returned {} values for {} variables",
            solver.name(),
            solution.variable_values.len(),
            problem.num_variables()
        ))
        .into());
    }
    Ok(solution)
}
