use letsplan::infrastructure::logging;
use letsplan::{
    AggregatePlanInput, AggregatePlanner, PlanError, PlantLocation, PlantLocationInput, RunConfig,
    SolveOutcome,
};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = RunConfig::from_env()?;
    info!(backend = %config.solver.backend, output = %config.output_dir.display(), "letsplan demo");
    std::fs::create_dir_all(&config.output_dir)?;

    demo_plant(&config)?;
    demo_aggregate(&config)?;

    Ok(())
}

fn demo_plant(config: &RunConfig) -> Result<(), PlanError> {
    println!("--- Plant Location ---");
    let input = PlantLocationInput::new(
        vec![4000.0, 5500.0, 4800.0],
        vec![
            vec![3.0, 5.0, 6.0, 4.0],
            vec![4.0, 2.0, 5.0, 3.0],
            vec![6.0, 4.0, 3.0, 5.0],
        ],
        vec![40.0, 60.0, 70.0, 45.0],
        vec![120.0, 130.0, 100.0],
    );
    let plants = [(0.0, 0.0), (10.0, 0.0), (5.0, 7.0)];
    let regions = [(2.0, 2.0), (8.0, 1.0), (6.0, 5.0), (3.0, 6.0)];

    let mut model = PlantLocation::new().with_config(config.solver.clone());
    if let SolveOutcome::Unsolved(status) = model.solve(&input)? {
        warn!(%status, "plant location has no solution");
        return Ok(());
    }
    model.summarize()?;
    model.plot(&plants, &regions, config.output_dir.join("plant_location.png"))
}

fn demo_aggregate(config: &RunConfig) -> Result<(), PlanError> {
    println!("\n--- Aggregate Planner ---");
    let periods = 6;
    let input = AggregatePlanInput::new(
        periods,
        vec![100.0, 120.0, 90.0, 110.0, 130.0, 80.0],
        vec![50.0; periods],
        vec![200.0; periods],
        vec![150.0; periods],
        vec![2.0; periods],
    )
    .with_backlog(vec![10.0; periods])
    .with_prod_rate(10.0)
    .with_ot_rate(0.5)
    .with_overtime(vec![20.0; periods])
    .with_initial_workforce(12.0)
    .with_initial_inventory(15.0);

    let mut planner = AggregatePlanner::new().with_config(config.solver.clone());
    if let SolveOutcome::Unsolved(status) = planner.solve(&input)? {
        warn!(%status, "aggregate plan has no solution");
        return Ok(());
    }
    planner.summarize()?;
    planner.plot(config.output_dir.join("aggregate_plan.png"))
}
