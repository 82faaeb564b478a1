//! Capacitated plant location.
//!
//! Decide which plants to open (binary `open[i]`) and how many units each
//! opened plant ships to each region (`ship[i][j] ≥ 0`) so that every region's
//! demand is met exactly, no plant exceeds its capacity, and fixed opening
//! cost plus transport cost is minimal.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info};

use crate::domain::{
    ConstraintType, OptimizationProblem, Solution, SolutionStatus, SolverConfig, SolverService,
    Variable,
};
use crate::infrastructure::chart::{self, NetworkChart};

use super::error::{check_finite_points, check_len, check_non_negative, PlanError, Result};
use super::formulation::{run_solver, ModelBuilder, VarId};
use super::outcome::{reportable, SolveOutcome};

/// Binary values above this count as "open"
pub const OPEN_THRESHOLD: f64 = 0.5;
/// Flows at or below this are solver noise around zero
pub const FLOW_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct PlantLocationInput {
    /// Opening cost per plant
    pub fixed_cost: Vec<f64>,
    /// Per-unit transport cost, `ship_cost[plant][region]`
    pub ship_cost: Vec<Vec<f64>>,
    /// Units required per region
    pub demand: Vec<f64>,
    /// Maximum throughput per plant
    pub capacity: Vec<f64>,
}

impl PlantLocationInput {
    pub fn new(
        fixed_cost: Vec<f64>,
        ship_cost: Vec<Vec<f64>>,
        demand: Vec<f64>,
        capacity: Vec<f64>,
    ) -> Self {
        Self {
            fixed_cost,
            ship_cost,
            demand,
            capacity,
        }
    }

    pub fn num_plants(&self) -> usize {
        self.fixed_cost.len()
    }

    pub fn num_regions(&self) -> usize {
        self.demand.len()
    }

    /// `ship_cost` must be plants × regions and every number finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let (m, n) = (self.num_plants(), self.num_regions());
        check_len("capacity", m, self.capacity.len())?;
        check_len("ship_cost rows", m, self.ship_cost.len())?;
        for (i, row) in self.ship_cost.iter().enumerate() {
            check_len(format!("ship_cost[{}]", i), n, row.len())?;
        }

        check_non_negative("fixed_cost", &self.fixed_cost)?;
        check_non_negative("demand", &self.demand)?;
        check_non_negative("capacity", &self.capacity)?;
        for (i, row) in self.ship_cost.iter().enumerate() {
            check_non_negative(&format!("ship_cost[{}]", i), row)?;
        }
        Ok(())
    }
}

/// Column ids of the decision variables
#[derive(Debug, Clone)]
pub struct PlantLocationVars {
    pub open: Vec<VarId>,
    pub ship: Vec<Vec<VarId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantLocationResult {
    /// Opened plants, ascending
    pub opened: Vec<usize>,
    /// Units shipped `(plant, region) → units`, strictly positive flows only
    pub shipments: BTreeMap<(usize, usize), f64>,
    /// Opening cost of the opened plants
    pub fixed_cost: f64,
    /// Transport cost of the retained shipments
    pub transport_cost: f64,
    /// Objective value reported by the solver
    pub total: f64,
    pub num_plants: usize,
    pub num_regions: usize,
}

impl PlantLocationResult {
    pub fn is_open(&self, plant: usize) -> bool {
        self.opened.binary_search(&plant).is_ok()
    }

    pub fn shipped_from(&self, plant: usize) -> f64 {
        self.shipments
            .range((plant, 0)..=(plant, usize::MAX))
            .map(|(_, units)| units)
            .sum()
    }

    pub fn shipped_to(&self, region: usize) -> f64 {
        self.shipments
            .iter()
            .filter(|((_, j), _)| *j == region)
            .map(|(_, units)| units)
            .sum()
    }

    pub fn total_shipped(&self) -> f64 {
        self.shipments.values().sum()
    }
}

/// Build the MILP for `input`. The input must already be validated.
pub fn formulate(
    input: &PlantLocationInput,
    config: SolverConfig,
) -> (OptimizationProblem, PlantLocationVars) {
    let (m, n) = (input.num_plants(), input.num_regions());
    let mut builder = ModelBuilder::new();

    let open: Vec<VarId> = (0..m)
        .map(|i| builder.add_variable(Variable::binary(format!("open_{}", i)), input.fixed_cost[i]))
        .collect();
    let ship: Vec<Vec<VarId>> = (0..m)
        .map(|i| {
            (0..n)
                .map(|j| {
                    builder.add_variable(
                        Variable::continuous(format!("ship_{}_{}", i, j)),
                        input.ship_cost[i][j],
                    )
                })
                .collect()
        })
        .collect();

    // Demand is met exactly: no shortage, no surplus
    for j in 0..n {
        let terms = (0..m).map(|i| (ship[i][j], 1.0)).collect();
        builder.add_constraint(
            format!("demand_{}", j),
            terms,
            ConstraintType::Equal,
            input.demand[j],
        );
    }

    // Σ_j ship[i][j] ≤ capacity[i]·open[i]: a closed plant ships nothing
    for i in 0..m {
        let mut terms: Vec<(VarId, f64)> = ship[i].iter().map(|&x| (x, 1.0)).collect();
        terms.push((open[i], -input.capacity[i]));
        builder.add_constraint(
            format!("capacity_{}", i),
            terms,
            ConstraintType::LessThanOrEqual,
            0.0,
        );
    }

    let problem = builder.build("CapacitatedPlantLocation", config);
    (problem, PlantLocationVars { open, ship })
}

/// Read the opened plants and positive flows out of an optimal solution and
/// recompute both cost components from them.
pub fn extract(
    input: &PlantLocationInput,
    vars: &PlantLocationVars,
    solution: &Solution,
) -> PlantLocationResult {
    let value = |var: VarId| solution.value(var).unwrap_or(0.0);

    let opened: Vec<usize> = vars
        .open
        .iter()
        .enumerate()
        .filter(|(_, &y)| value(y) > OPEN_THRESHOLD)
        .map(|(i, _)| i)
        .collect();

    let mut shipments = BTreeMap::new();
    for (i, row) in vars.ship.iter().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            let units = value(x);
            if units > FLOW_EPSILON {
                shipments.insert((i, j), units);
            }
        }
    }

    let fixed_cost = opened.iter().map(|&i| input.fixed_cost[i]).sum();
    let transport_cost = shipments
        .iter()
        .map(|(&(i, j), units)| input.ship_cost[i][j] * units)
        .sum();

    PlantLocationResult {
        opened,
        shipments,
        fixed_cost,
        transport_cost,
        total: solution.optimal_value.unwrap_or(0.0),
        num_plants: input.num_plants(),
        num_regions: input.num_regions(),
    }
}

/// Verdict for an instance with no plants, which leaves no columns to solve over:
/// empty when nothing is demanded, infeasible otherwise.
fn without_plants(input: &PlantLocationInput) -> Solution {
    if input.demand.iter().all(|&d| d == 0.0) {
        Solution::optimal(0.0, Vec::new())
    } else {
        Solution::new(
            SolutionStatus::Infeasible,
            "Positive demand cannot be met without any plant",
        )
    }
}

/// Plant location formulator. Holds the outcome of its most recent solve.
#[derive(Default)]
pub struct PlantLocation {
    solver: Option<Arc<dyn SolverService>>,
    config: SolverConfig,
    last: Option<SolveOutcome<PlantLocationResult>>,
}

impl PlantLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve with `solver` instead of the backend chosen by the config
    pub fn with_solver(mut self, solver: Arc<dyn SolverService>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Formulate, solve and extract. Replaces the outcome of any earlier solve.
    ///
    /// A non-optimal verdict is `Ok(SolveOutcome::Unsolved(status))`; `Err` means
    /// the input was malformed or the solver could not run.
    pub fn solve(&mut self, input: &PlantLocationInput) -> Result<&SolveOutcome<PlantLocationResult>> {
        self.last = None;
        input.validate()?;

        info!(
            plants = input.num_plants(),
            regions = input.num_regions(),
            "formulating plant location"
        );
        let (problem, vars) = formulate(input, self.config.clone());
        let solution = if problem.num_variables() == 0 {
            without_plants(input)
        } else {
            run_solver(self.solver.as_ref(), &problem)?
        };

        let outcome = if solution.is_optimal() {
            let result = extract(input, &vars, &solution);
            debug!(
                opened = ?result.opened,
                fixed = result.fixed_cost,
                transport = result.transport_cost,
                total = result.total,
                "plant location extracted"
            );
            SolveOutcome::Solved(result)
        } else {
            SolveOutcome::Unsolved(solution.status)
        };

        Ok(&*self.last.insert(outcome))
    }

    /// Outcome of the last solve, if any
    pub fn outcome(&self) -> Option<&SolveOutcome<PlantLocationResult>> {
        self.last.as_ref()
    }

    pub fn result(&self) -> Result<&PlantLocationResult> {
        reportable(self.last.as_ref())
    }

    pub fn summary(&self) -> Result<String> {
        let r = self.result()?;
        let mut out = format!(
            "Optimal Total={:.2}  Fixed={:.2}  Trans={:.2}\n",
            r.total, r.fixed_cost, r.transport_cost
        );
        for (&(i, j), units) in &r.shipments {
            out.push_str(&format!("  Plant {} → Region {}: {:.1}\n", i, j, units));
        }
        Ok(out)
    }

    pub fn summarize(&self) -> Result<()> {
        print!("{}", self.summary()?);
        Ok(())
    }

    /// Scatter chart of plants and regions, one point per coordinate pair
    pub fn chart(&self, plants: &[(f64, f64)], regions: &[(f64, f64)]) -> Result<RgbImage> {
        let r = self.result()?;
        check_len("plant coordinates", r.num_plants, plants.len())?;
        check_len("region coordinates", r.num_regions, regions.len())?;
        check_finite_points("plant coordinates", plants)?;
        check_finite_points("region coordinates", regions)?;

        Ok(chart::render_network(&NetworkChart {
            plants,
            regions,
            opened: &r.opened,
            links: r.shipments.keys().copied().collect(),
        }))
    }

    pub fn plot(
        &self,
        plants: &[(f64, f64)],
        regions: &[(f64, f64)],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let img = self.chart(plants, regions)?;
        chart::save(&img, path.as_ref()).map_err(PlanError::from)?;
        info!(path = %path.as_ref().display(), "plant location chart written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::ScriptedSolver;

    fn two_by_two() -> PlantLocationInput {
        PlantLocationInput::new(
            vec![100.0, 80.0],
            vec![vec![1.0, 2.0], vec![3.0, 1.0]],
            vec![10.0, 20.0],
            vec![25.0, 25.0],
        )
    }

    #[test]
    fn model_has_one_row_per_region_and_plant() {
        let input = two_by_two();
        let (problem, vars) = formulate(&input, SolverConfig::default());

        assert_eq!(problem.num_variables(), 2 + 4);
        assert_eq!(problem.num_binary_variables(), 2);
        assert_eq!(problem.constraints.len(), 2 + 2);

        // Objective: fixed cost on open, transport cost on ship
        assert_eq!(problem.objective.coefficients[vars.open[1]], 80.0);
        assert_eq!(problem.objective.coefficients[vars.ship[1][0]], 3.0);

        let demand_1 = &problem.constraints[1];
        assert_eq!(demand_1.constraint_type, ConstraintType::Equal);
        assert_eq!(demand_1.bound, 20.0);
        assert_eq!(demand_1.coefficients[vars.ship[0][1]], 1.0);
        assert_eq!(demand_1.coefficients[vars.ship[1][1]], 1.0);
        assert_eq!(demand_1.coefficients[vars.ship[0][0]], 0.0);

        let capacity_0 = &problem.constraints[2];
        assert_eq!(capacity_0.constraint_type, ConstraintType::LessThanOrEqual);
        assert_eq!(capacity_0.bound, 0.0);
        assert_eq!(capacity_0.coefficients[vars.open[0]], -25.0);
        assert_eq!(capacity_0.coefficients[vars.ship[0][1]], 1.0);
        assert_eq!(capacity_0.coefficients[vars.open[1]], 0.0);
    }

    #[test]
    fn extraction_thresholds_and_recomputes_costs() {
        let input = two_by_two();
        let (_, vars) = formulate(&input, SolverConfig::default());
        // open = [0.9999999, 1e-9], ship = [[10, 20], [1e-8, 0]]
        let values = vec![0.9999999, 1e-9, 10.0, 20.0, 1e-8, 0.0];
        let solution = Solution::optimal(150.0, values);

        let result = extract(&input, &vars, &solution);
        assert_eq!(result.opened, vec![0]);
        assert_eq!(result.shipments.len(), 2);
        assert_eq!(result.shipments[&(0, 1)], 20.0);
        assert_eq!(result.fixed_cost, 100.0);
        assert_eq!(result.transport_cost, 10.0 + 40.0);
        assert_eq!(result.total, 150.0);
        assert_eq!(result.shipped_from(0), 30.0);
        assert_eq!(result.shipped_from(1), 0.0);
        assert_eq!(result.shipped_to(1), 20.0);
        assert!(result.is_open(0) && !result.is_open(1));
    }

    #[test]
    fn shape_mismatch_fails_before_solving() {
        let solver = Arc::new(ScriptedSolver::new(SolutionStatus::Optimal));
        let mut pl = PlantLocation::new().with_solver(solver.clone());

        let mut input = two_by_two();
        input.ship_cost[1].pop();
        assert!(matches!(
            pl.solve(&input),
            Err(PlanError::ShapeMismatch { expected: 2, found: 1, .. })
        ));

        let mut input = two_by_two();
        input.capacity.push(5.0);
        assert!(matches!(pl.solve(&input), Err(PlanError::ShapeMismatch { .. })));

        let mut input = two_by_two();
        input.demand[0] = -1.0;
        assert!(matches!(pl.solve(&input), Err(PlanError::InvalidInput(_))));

        assert_eq!(solver.calls(), 0);
        assert!(pl.outcome().is_none());
    }

    #[test]
    fn non_optimal_status_is_an_outcome_not_an_error() {
        let solver = Arc::new(ScriptedSolver::new(SolutionStatus::Infeasible));
        let mut pl = PlantLocation::new().with_solver(solver);

        let outcome = pl.solve(&two_by_two()).unwrap();
        assert_eq!(outcome, &SolveOutcome::Unsolved(SolutionStatus::Infeasible));

        assert!(matches!(
            pl.summary(),
            Err(PlanError::NoSolution(SolutionStatus::Infeasible))
        ));
        assert!(matches!(
            pl.chart(&[(0.0, 0.0); 2], &[(1.0, 1.0); 2]),
            Err(PlanError::NoSolution(_))
        ));
    }

    #[test]
    fn reports_before_solve_fail() {
        let pl = PlantLocation::new();
        assert!(matches!(pl.summary(), Err(PlanError::NotSolved)));
        assert!(matches!(pl.summarize(), Err(PlanError::NotSolved)));
        assert!(matches!(pl.chart(&[], &[]), Err(PlanError::NotSolved)));
    }

    #[test]
    fn summary_lists_every_shipment() {
        let input = two_by_two();
        let values = vec![1.0, 1.0, 10.0, 0.0, 0.0, 20.0];
        let solver = Arc::new(ScriptedSolver::optimal(values));
        let mut pl = PlantLocation::new().with_solver(solver);
        pl.solve(&input).unwrap();

        let summary = pl.summary().unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Optimal Total=210.00  Fixed=180.00  Trans=30.00");
        assert_eq!(lines[1], "  Plant 0 → Region 0: 10.0");
        assert_eq!(lines[2], "  Plant 1 → Region 1: 20.0");
        assert_eq!(lines.len(), 3);

        // Reports are repeatable and the chart checks coordinate counts
        assert_eq!(pl.summary().unwrap(), summary);
        assert!(pl.chart(&[(0.0, 0.0), (5.0, 0.0)], &[(1.0, 2.0), (4.0, 2.0)]).is_ok());
        assert!(matches!(
            pl.chart(&[(0.0, 0.0)], &[(1.0, 2.0), (4.0, 2.0)]),
            Err(PlanError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn resolve_replaces_previous_outcome() {
        let solver = Arc::new(ScriptedSolver::optimal(vec![1.0, 0.0, 10.0, 20.0, 0.0, 0.0]));
        let mut pl = PlantLocation::new().with_solver(solver);
        pl.solve(&two_by_two()).unwrap();
        assert!(pl.result().is_ok());

        let mut bad = two_by_two();
        bad.fixed_cost.pop();
        assert!(pl.solve(&bad).is_err());
        assert!(matches!(pl.result(), Err(PlanError::NotSolved)));
    }

    #[test]
    fn no_plants_with_demand_is_infeasible() {
        let solver = Arc::new(ScriptedSolver::new(SolutionStatus::Optimal));
        let mut pl = PlantLocation::new().with_solver(solver.clone());

        let input = PlantLocationInput::new(vec![], vec![], vec![5.0], vec![]);
        let outcome = pl.solve(&input).unwrap();
        assert_eq!(outcome, &SolveOutcome::Unsolved(SolutionStatus::Infeasible));
        assert_eq!(solver.calls(), 0);
    }

    #[test]
    fn empty_instance_ships_nothing() {
        let solver = Arc::new(ScriptedSolver::new(SolutionStatus::Optimal));
        let mut pl = PlantLocation::new().with_solver(solver.clone());

        let input = PlantLocationInput::new(vec![], vec![], vec![0.0, 0.0], vec![]);
        let result = pl.solve(&input).unwrap().data().unwrap();
        assert!(result.opened.is_empty());
        assert!(result.shipments.is_empty());
        assert_eq!(result.total, 0.0);
        assert_eq!(result.num_regions, 2);

        let empty = PlantLocationInput::new(vec![], vec![], vec![], vec![]);
        assert!(pl.solve(&empty).unwrap().is_solved());
        assert_eq!(pl.summary().unwrap(), "Optimal Total=0.00  Fixed=0.00  Trans=0.00\n");
        assert_eq!(solver.calls(), 0);
    }

    #[test]
    fn chart_rejects_non_finite_coordinates() {
        let solver = Arc::new(ScriptedSolver::optimal(vec![1.0, 0.0, 10.0, 20.0, 0.0, 0.0]));
        let mut pl = PlantLocation::new().with_solver(solver);
        pl.solve(&two_by_two()).unwrap();

        let regions = [(1.0, 2.0), (4.0, 2.0)];
        assert!(matches!(
            pl.chart(&[(f64::INFINITY, 0.0), (5.0, 0.0)], &regions),
            Err(PlanError::InvalidInput(_))
        ));
        assert!(matches!(
            pl.chart(&[(0.0, 0.0), (5.0, 0.0)], &[(1.0, f64::NAN), (4.0, 2.0)]),
            Err(PlanError::InvalidInput(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        assert!(pl.plot(&[(f64::NEG_INFINITY, 0.0), (5.0, 0.0)], &regions, &path).is_err());
        assert!(!path.exists());
    }
}
