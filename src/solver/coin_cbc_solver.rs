use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolutionQuality},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolutionStatus as GoodLpSolutionStatus, SolverModel,
    Variable as GoodLpVariable, WithMipGap, WithTimeLimit,
};
use std::time::Instant;
use tracing::debug;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A gap stop is the tolerance the caller asked for, so it counts as optimal.
/// An expired time limit never does.
fn domain_status(status: GoodLpSolutionStatus) -> DomainSolutionStatus {
    match status {
        GoodLpSolutionStatus::Optimal | GoodLpSolutionStatus::GapLimit => {
            DomainSolutionStatus::Optimal
        }
        GoodLpSolutionStatus::TimeLimit => DomainSolutionStatus::TimeLimit,
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();
        let num_vars = problem.num_variables();

        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(num_vars);

        for var_def in problem.variables.iter() {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let var = match var_def.variable_type {
                VariableType::Binary | VariableType::Integer => {
                    vars.add(variable().integer().min(lower).max(upper))
                }
                VariableType::Continuous => vars.add(variable().min(lower).max(upper)),
            };
            lp_variables.push(var);
        }

        if problem.variables.is_empty() {
            for _ in 0..num_vars {
                lp_variables.push(vars.add(variable().min(0.0)));
            }
        }

        // good_lp minimises, so negate for maximisation
        let is_maximize = problem.objective.optimization_type == OptimizationType::Maximize;
        let mut obj_expr: Expression = 0.into();
        for (i, &coeff) in problem.objective.coefficients.iter().enumerate() {
            if coeff != 0.0 {
                let c = if is_maximize { -coeff } else { coeff };
                obj_expr += c * lp_variables[i];
            }
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);

        let config = &problem.solver_config;
        lp_model.set_parameter("log", if config.verbose { "1" } else { "0" });
        if let Some(seconds) = config.time_limit {
            lp_model = lp_model.with_time_limit(seconds);
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model = lp_model
                .with_mip_gap(gap as f32)
                .map_err(|e| SolverError::InvalidProblem(format!("MIP gap {}: {}", gap, e)))?;
        }

        for constraint in &problem.constraints {
            let mut lhs: Expression = 0.into();
            for (i, &coeff) in constraint.coefficients.iter().enumerate() {
                if coeff != 0.0 {
                    lhs += coeff * lp_variables[i];
                }
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        let solution_result = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = problem.statistics(solve_time);

        match solution_result {
            Ok(sol) => {
                let status = domain_status(sol.status());
                if !status.is_optimal() {
                    // CBC hands back whatever incumbent it holds, possibly none at all
                    debug!(problem = %problem.name, %status, solve_time_ms = solve_time, "CBC stopped early");
                    return Ok(DomainSolution::new(status, "CBC stopped before optimality was proven")
                        .with_statistics(statistics));
                }

                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let actual_obj = problem.objective.evaluate(&variable_values);
                let quality = SolutionQuality::assess(problem, &variable_values);
                debug!(problem = %problem.name, objective = actual_obj, solve_time_ms = solve_time, "CBC finished");

                let mut solution = DomainSolution::optimal(actual_obj, variable_values)
                    .with_statistics(statistics)
                    .with_quality(quality);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            )
            .with_statistics(statistics)),
            // Stops other than the time limit (node or solution limits, signals)
            Err(ResolutionError::Other("Stopped")) | Err(ResolutionError::Other("UserEvent")) => {
                Ok(DomainSolution::new(
                    DomainSolutionStatus::Interrupted,
                    "CBC stopped before optimality was proven",
                )
                .with_statistics(statistics))
            }
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
