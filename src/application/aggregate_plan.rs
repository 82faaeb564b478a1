//! Multi-period aggregate production, inventory and workforce planning.
//!
//! Per period the plan chooses workforce level, hires, fires, production and
//! end-of-period inventory. Backlog and overtime are optional: they are only
//! part of the model when their cost / ceiling series is supplied.

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info};

use crate::domain::{
    ConstraintType, OptimizationProblem, Solution, SolverConfig, SolverService, Variable,
};
use crate::infrastructure::chart::{self, TimeSeriesChart};

use super::error::{check_len, check_non_negative, PlanError, Result};
use super::formulation::{run_solver, ModelBuilder, VarId};
use super::outcome::{reportable, SolveOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlanInput {
    /// Number of periods T
    pub horizon: usize,
    pub demand: Vec<f64>,
    /// Regular labour cost per worker and period
    pub reg_cost: Vec<f64>,
    pub hire_cost: Vec<f64>,
    pub fire_cost: Vec<f64>,
    /// Holding cost per unit of end-of-period inventory
    pub hold_cost: Vec<f64>,
    /// Penalty per backlogged unit; `Some` turns backlog on
    pub back_cost: Option<Vec<f64>>,
    /// Overtime ceiling per period; `Some` turns overtime on
    pub ot_cap: Option<Vec<f64>>,
    /// Units one worker produces per period
    pub prod_rate: f64,
    /// Overtime unit price as a multiple of the period's regular cost
    pub ot_rate: f64,
    pub initial_workforce: f64,
    pub initial_inventory: f64,
}

impl AggregatePlanInput {
    pub fn new(
        horizon: usize,
        demand: Vec<f64>,
        reg_cost: Vec<f64>,
        hire_cost: Vec<f64>,
        fire_cost: Vec<f64>,
        hold_cost: Vec<f64>,
    ) -> Self {
        Self {
            horizon,
            demand,
            reg_cost,
            hire_cost,
            fire_cost,
            hold_cost,
            back_cost: None,
            ot_cap: None,
            prod_rate: 1.0,
            ot_rate: 0.5,
            initial_workforce: 0.0,
            initial_inventory: 0.0,
        }
    }

    pub fn with_backlog(mut self, back_cost: Vec<f64>) -> Self {
        self.back_cost = Some(back_cost);
        self
    }

    pub fn with_overtime(mut self, ot_cap: Vec<f64>) -> Self {
        self.ot_cap = Some(ot_cap);
        self
    }

    pub fn with_prod_rate(mut self, prod_rate: f64) -> Self {
        self.prod_rate = prod_rate;
        self
    }

    pub fn with_ot_rate(mut self, ot_rate: f64) -> Self {
        self.ot_rate = ot_rate;
        self
    }

    pub fn with_initial_workforce(mut self, workforce: f64) -> Self {
        self.initial_workforce = workforce;
        self
    }

    pub fn with_initial_inventory(mut self, inventory: f64) -> Self {
        self.initial_inventory = inventory;
        self
    }

    pub fn features(&self) -> PlanFeatures {
        PlanFeatures {
            backlog: self.back_cost.is_some(),
            overtime: self.ot_cap.is_some(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.horizon;
        if t == 0 {
            return Err(PlanError::InvalidInput(
                "horizon must cover at least one period".to_string(),
            ));
        }

        let mut series = vec![
            ("demand", &self.demand),
            ("reg_cost", &self.reg_cost),
            ("hire_cost", &self.hire_cost),
            ("fire_cost", &self.fire_cost),
            ("hold_cost", &self.hold_cost),
        ];
        if let Some(back_cost) = &self.back_cost {
            series.push(("back_cost", back_cost));
        }
        if let Some(ot_cap) = &self.ot_cap {
            series.push(("ot_cap", ot_cap));
        }

        for (name, values) in &series {
            check_len(*name, t, values.len())?;
        }
        for (name, values) in &series {
            check_non_negative(name, values)?;
        }
        check_non_negative(
            "rates and initial levels",
            &[
                self.prod_rate,
                self.ot_rate,
                self.initial_workforce,
                self.initial_inventory,
            ],
        )
    }
}

/// Which optional variable families the model carries. Decided once per solve
/// from the input and consulted wherever columns, costs or rows are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanFeatures {
    pub backlog: bool,
    pub overtime: bool,
}

/// Column ids per period
#[derive(Debug, Clone)]
pub struct AggregatePlanVars {
    pub work: Vec<VarId>,
    pub hire: Vec<VarId>,
    pub fire: Vec<VarId>,
    pub prod: Vec<VarId>,
    pub inv: Vec<VarId>,
    pub back: Option<Vec<VarId>>,
    pub ot: Option<Vec<VarId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlanResult {
    pub work: Vec<f64>,
    pub hire: Vec<f64>,
    pub fire: Vec<f64>,
    pub prod: Vec<f64>,
    pub inv: Vec<f64>,
    /// Present only when backlog was modeled
    pub back: Option<Vec<f64>>,
    /// Present only when overtime was modeled
    pub ot: Option<Vec<f64>>,
    /// Objective value reported by the solver
    pub cost: f64,
}

impl AggregatePlanResult {
    pub fn horizon(&self) -> usize {
        self.prod.len()
    }

    /// Named series in report order; absent features are skipped
    pub fn series(&self) -> Vec<(&'static str, &[f64])> {
        let mut out: Vec<(&'static str, &[f64])> = vec![
            ("work", self.work.as_slice()),
            ("hire", self.hire.as_slice()),
            ("fire", self.fire.as_slice()),
            ("prod", self.prod.as_slice()),
            ("inv", self.inv.as_slice()),
        ];
        if let Some(back) = &self.back {
            out.push(("back", back.as_slice()));
        }
        if let Some(ot) = &self.ot {
            out.push(("ot", ot.as_slice()));
        }
        out
    }
}

fn continuous_series(builder: &mut ModelBuilder, prefix: &str, costs: &[f64]) -> Vec<VarId> {
    costs
        .iter()
        .enumerate()
        .map(|(t, &cost)| builder.add_variable(Variable::continuous(format!("{}_{}", prefix, t)), cost))
        .collect()
}

/// Build the MILP for `input`. The input must already be validated.
pub fn formulate(
    input: &AggregatePlanInput,
    config: SolverConfig,
) -> (OptimizationProblem, AggregatePlanVars) {
    let horizon = input.horizon;
    let features = input.features();
    let mut builder = ModelBuilder::new();

    let work = continuous_series(&mut builder, "work", &input.reg_cost);
    let hire = continuous_series(&mut builder, "hire", &input.hire_cost);
    let fire = continuous_series(&mut builder, "fire", &input.fire_cost);
    let prod = continuous_series(&mut builder, "prod", &[0.0].repeat(horizon));
    let inv = continuous_series(&mut builder, "inv", &input.hold_cost);

    // Validation ties each flag to its series, so an absent series is never read
    let back_cost = input.back_cost.as_deref().unwrap_or_default();
    let ot_cap = input.ot_cap.as_deref().unwrap_or_default();

    let back = features
        .backlog
        .then(|| continuous_series(&mut builder, "back", back_cost));
    // Overtime is priced off the regular labour cost of the same period
    let ot = features.overtime.then(|| {
        let ot_cost: Vec<f64> = input.reg_cost.iter().map(|rc| rc * input.ot_rate).collect();
        continuous_series(&mut builder, "ot", &ot_cost)
    });

    for t in 0..horizon {
        // work[t] - work[t-1] - hire[t] + fire[t] = 0, with work[-1] = initial workforce
        let mut terms = vec![(work[t], 1.0), (hire[t], -1.0), (fire[t], 1.0)];
        let workforce_rhs = if t == 0 {
            input.initial_workforce
        } else {
            terms.push((work[t - 1], -1.0));
            0.0
        };
        builder.add_constraint(
            format!("workforce_{}", t),
            terms,
            ConstraintType::Equal,
            workforce_rhs,
        );

        // prod[t] ≤ prod_rate·work[t] + ot[t]
        let mut terms = vec![(prod[t], 1.0), (work[t], -input.prod_rate)];
        if let Some(ot) = &ot {
            terms.push((ot[t], -1.0));
        }
        builder.add_constraint(
            format!("capacity_{}", t),
            terms,
            ConstraintType::LessThanOrEqual,
            0.0,
        );

        if let Some(ot) = &ot {
            builder.add_constraint(
                format!("overtime_{}", t),
                vec![(ot[t], 1.0)],
                ConstraintType::LessThanOrEqual,
                ot_cap[t],
            );
        }

        // inv[t] - back[t] - inv[t-1] + back[t-1] - prod[t] = -demand[t],
        // with inv[-1] = initial inventory and back[-1] = 0
        let mut terms = vec![(inv[t], 1.0), (prod[t], -1.0)];
        if let Some(back) = &back {
            terms.push((back[t], -1.0));
            if t > 0 {
                terms.push((back[t - 1], 1.0));
            }
        }
        let balance_rhs = if t == 0 {
            input.initial_inventory - input.demand[t]
        } else {
            terms.push((inv[t - 1], -1.0));
            -input.demand[t]
        };
        builder.add_constraint(
            format!("inventory_{}", t),
            terms,
            ConstraintType::Equal,
            balance_rhs,
        );
    }

    // No unmet demand may remain at the end of the horizon
    if let Some(back) = &back {
        builder.add_constraint(
            "terminal_backlog",
            vec![(back[horizon - 1], 1.0)],
            ConstraintType::Equal,
            0.0,
        );
    }

    let problem = builder.build("AggregatePlan", config);
    let vars = AggregatePlanVars {
        work,
        hire,
        fire,
        prod,
        inv,
        back,
        ot,
    };
    (problem, vars)
}

pub fn extract(vars: &AggregatePlanVars, solution: &Solution) -> AggregatePlanResult {
    let values = |ids: &[VarId]| -> Vec<f64> {
        ids.iter()
            .map(|&id| solution.value(id).unwrap_or(0.0))
            .collect()
    };

    AggregatePlanResult {
        work: values(&vars.work),
        hire: values(&vars.hire),
        fire: values(&vars.fire),
        prod: values(&vars.prod),
        inv: values(&vars.inv),
        back: vars.back.as_deref().map(values),
        ot: vars.ot.as_deref().map(values),
        cost: solution.optimal_value.unwrap_or(0.0),
    }
}

/// Aggregate planning formulator. Holds the outcome of its most recent solve.
#[derive(Default)]
pub struct AggregatePlanner {
    solver: Option<Arc<dyn SolverService>>,
    config: SolverConfig,
    last: Option<SolveOutcome<AggregatePlanResult>>,
}

impl AggregatePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: Arc<dyn SolverService>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Formulate, solve and extract. Replaces the outcome of any earlier solve.
    pub fn solve(&mut self, input: &AggregatePlanInput) -> Result<&SolveOutcome<AggregatePlanResult>> {
        self.last = None;
        input.validate()?;

        let features = input.features();
        info!(
            periods = input.horizon,
            backlog = features.backlog,
            overtime = features.overtime,
            "formulating aggregate plan"
        );
        let (problem, vars) = formulate(input, self.config.clone());
        let solution = run_solver(self.solver.as_ref(), &problem)?;

        let outcome = if solution.is_optimal() {
            let result = extract(&vars, &solution);
            debug!(cost = result.cost, "aggregate plan extracted");
            SolveOutcome::Solved(result)
        } else {
            SolveOutcome::Unsolved(solution.status)
        };

        Ok(&*self.last.insert(outcome))
    }

    pub fn outcome(&self) -> Option<&SolveOutcome<AggregatePlanResult>> {
        self.last.as_ref()
    }

    pub fn result(&self) -> Result<&AggregatePlanResult> {
        reportable(self.last.as_ref())
    }

    pub fn summary(&self) -> Result<String> {
        let r = self.result()?;
        let mut out = format!("Optimal Cost={:.2}\n", r.cost);
        for (name, values) in r.series() {
            for (t, v) in values.iter().enumerate() {
                out.push_str(&format!("  {}{}={:.1}\n", name, t, v));
            }
        }
        Ok(out)
    }

    pub fn summarize(&self) -> Result<()> {
        print!("{}", self.summary()?);
        Ok(())
    }

    pub fn chart(&self) -> Result<RgbImage> {
        let r = self.result()?;
        Ok(chart::render_time_series(&TimeSeriesChart {
            production: &r.prod,
            workforce: &r.work,
            inventory: &r.inv,
            backlog: r.back.as_deref(),
        }))
    }

    pub fn plot(&self, path: impl AsRef<Path>) -> Result<()> {
        let img = self.chart()?;
        chart::save(&img, path.as_ref())?;
        info!(path = %path.as_ref().display(), "aggregate plan chart written");
        Ok(())
    }
}
