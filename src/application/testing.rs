// Stand-in solver for unit tests that do not need a native backend

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{
    OptimizationProblem, Result, Solution, SolutionQuality, SolutionStatus, SolverService,
};

/// Answers every solve with the same status (and, when optimal, the same values)
pub struct ScriptedSolver {
    status: SolutionStatus,
    values: Vec<f64>,
    calls: AtomicUsize,
}

impl ScriptedSolver {
    pub fn new(status: SolutionStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn optimal(values: Vec<f64>) -> Self {
        Self {
            values,
            ..Self::new(SolutionStatus::Optimal)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SolverService for ScriptedSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution> {
        self.validate(problem)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.status != SolutionStatus::Optimal {
            return Ok(Solution::new(self.status, "scripted"));
        }
        let objective = problem.objective.evaluate(&self.values);
        let quality = SolutionQuality::assess(problem, &self.values);
        Ok(Solution::optimal(objective, self.values.clone()).with_quality(quality))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
