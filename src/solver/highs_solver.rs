// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// This is an adapter pattern - translates our domain models to HiGHS API

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolutionQuality},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::debug;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Verdict for every model status other than `Optimal`
fn unsolved_status(status: HighsModelStatus) -> Result<(DomainSolutionStatus, &'static str)> {
    let verdict = match status {
        HighsModelStatus::Infeasible => (
            DomainSolutionStatus::Infeasible,
            "Problem is infeasible: no solution satisfies all constraints",
        ),
        HighsModelStatus::Unbounded => (
            DomainSolutionStatus::Unbounded,
            "Problem is unbounded: objective can be improved infinitely",
        ),
        // Presolve may not tell the two apart; an unbounded objective is impossible
        // for the non-negative cost models built here, so infeasibility is what it means.
        HighsModelStatus::UnboundedOrInfeasible => (
            DomainSolutionStatus::Infeasible,
            "Problem is infeasible or unbounded",
        ),
        HighsModelStatus::ReachedTimeLimit => (
            DomainSolutionStatus::TimeLimit,
            "Time limit reached before optimality was proven",
        ),
        HighsModelStatus::ReachedIterationLimit => (
            DomainSolutionStatus::IterationLimit,
            "Iteration limit reached before optimality was proven",
        ),
        HighsModelStatus::ModelEmpty | HighsModelStatus::NotSet | HighsModelStatus::Unknown => {
            (DomainSolutionStatus::NotSolved, "HiGHS returned no verdict")
        }
        status => {
            return Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            )))
        }
    };
    Ok(verdict)
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();

        // Columns first, then rows
        let mut pb = RowProblem::default();
        let mut cols: Vec<Col> = Vec::with_capacity(problem.num_variables());

        for (i, var_def) in problem.variables.iter().enumerate() {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
            let obj_coeff = problem.objective.coefficients[i];

            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, lower..=upper)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, lower..=upper),
            };
            cols.push(col);
        }

        if problem.variables.is_empty() {
            for &coeff in problem.objective.coefficients.iter() {
                cols.push(pb.add_column(coeff, 0.0..));
            }
        }

        for constraint in &problem.constraints {
            let terms: Vec<(Col, f64)> = constraint
                .coefficients
                .iter()
                .enumerate()
                .filter(|(_, &coeff)| coeff != 0.0)
                .map(|(i, &coeff)| (cols[i], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if problem.objective.optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let mut model = pb.optimise(sense);
        let config = &problem.solver_config;
        model.set_option("output_flag", config.verbose);
        if let Some(seconds) = config.time_limit {
            model.set_option("time_limit", seconds);
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }

        let solved = model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = problem.statistics(solve_time);

        let status = solved.status();
        debug!(problem = %problem.name, ?status, solve_time_ms = solve_time, "HiGHS finished");

        if status == HighsModelStatus::Optimal {
            let variable_values = solved.get_solution().columns().to_vec();
            let actual_obj = problem.objective.evaluate(&variable_values);
            let quality = SolutionQuality::assess(problem, &variable_values);

            let mut solution = DomainSolution::optimal(actual_obj, variable_values)
                .with_statistics(statistics)
                .with_quality(quality);
            solution.message = format!("Optimal solution found for '{}'", problem.name);
            return Ok(solution);
        }

        let (domain_status, message) = unsolved_status(status)?;
        Ok(DomainSolution::new(domain_status, message).with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, ObjectiveFunction, SolverConfig, Variable};

    #[test]
    fn solves_small_mip() {
        // max 150a + 90b + 120c  s.t.  7a + 3b + 4c <= 10, binaries
        let problem = OptimizationProblem::new(ObjectiveFunction::new(
            OptimizationType::Maximize,
            vec![150.0, 90.0, 120.0],
        ))
        .with_name("knapsack")
        .with_variables(vec![
            Variable::binary("a"),
            Variable::binary("b"),
            Variable::binary("c"),
        ])
        .add_constraint(Constraint::new(
            ConstraintType::LessThanOrEqual,
            vec![7.0, 3.0, 4.0],
            10.0,
        ));

        let solution = HighsSolver::new().solve(&problem).unwrap();
        assert!(solution.is_optimal());
        assert!((solution.optimal_value.unwrap() - 240.0).abs() < 1e-6);
        assert_eq!(solution.statistics.num_binary_vars, 3);
        assert!(solution.quality.max_constraint_violation < 1e-6);
    }

    #[test]
    fn reports_infeasible_as_status() {
        // x <= 1 and x >= 2
        let problem = OptimizationProblem::new(ObjectiveFunction::minimize(vec![1.0]))
            .with_variables(vec![Variable::continuous("x")])
            .add_constraint(Constraint::new(ConstraintType::LessThanOrEqual, vec![1.0], 1.0))
            .add_constraint(Constraint::new(
                ConstraintType::GreaterThanOrEqual,
                vec![1.0],
                2.0,
            ))
            .with_config(SolverConfig::default());

        let solution = HighsSolver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, DomainSolutionStatus::Infeasible);
        assert!(solution.variable_values.is_empty());
    }

    #[test]
    fn limits_are_never_optimal() {
        let (status, _) = unsolved_status(HighsModelStatus::ReachedTimeLimit).unwrap();
        assert_eq!(status, DomainSolutionStatus::TimeLimit);
        let (status, _) = unsolved_status(HighsModelStatus::ReachedIterationLimit).unwrap();
        assert_eq!(status, DomainSolutionStatus::IterationLimit);
        let (status, _) = unsolved_status(HighsModelStatus::UnboundedOrInfeasible).unwrap();
        assert_eq!(status, DomainSolutionStatus::Infeasible);
    }

    #[test]
    fn solver_faults_are_errors() {
        let err = unsolved_status(HighsModelStatus::SolveError).unwrap_err();
        assert!(matches!(err, SolverError::ExecutionFailed(_)));
    }
}
