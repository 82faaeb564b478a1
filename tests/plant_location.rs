#![cfg(feature = "highs")]

use std::sync::Arc;

use letsplan::infrastructure::logging;
use letsplan::{
    HighsSolver, PlanError, PlantLocation, PlantLocationInput, SolutionStatus, SolveOutcome,
    SolverConfig,
};

const TOL: f64 = 1e-6;

fn scenario_a() -> PlantLocationInput {
    PlantLocationInput::new(
        vec![4000.0, 5500.0, 4800.0],
        vec![
            vec![3.0, 5.0, 6.0, 4.0],
            vec![4.0, 2.0, 5.0, 3.0],
            vec![6.0, 4.0, 3.0, 5.0],
        ],
        vec![40.0, 60.0, 70.0, 45.0],
        vec![120.0, 130.0, 100.0],
    )
}

fn highs() -> PlantLocation {
    logging::init_test();
    PlantLocation::new().with_solver(Arc::new(HighsSolver::new()))
}

#[test]
fn scenario_a_opens_the_cheapest_feasible_pair() {
    let input = scenario_a();
    let mut model = highs();
    let result = model.solve(&input).unwrap().data().unwrap().clone();

    assert!((result.total_shipped() - 215.0).abs() < TOL);
    assert!(!result.opened.is_empty());
    assert_eq!(result.opened, vec![0, 2]);
    assert!((result.fixed_cost - 8800.0).abs() < TOL);
    assert!((result.transport_cost - 780.0).abs() < TOL);
    assert!((result.total - 9580.0).abs() < TOL);
    assert!(result.total >= result.fixed_cost);
    // Subtotals recomputed from the extracted plan agree with the solver objective
    assert!((result.fixed_cost + result.transport_cost - result.total).abs() < TOL);
}

#[test]
fn every_region_receives_exactly_its_demand() {
    let input = scenario_a();
    let mut model = highs();
    let result = model.solve(&input).unwrap().data().unwrap().clone();

    for (j, &demand) in input.demand.iter().enumerate() {
        assert!((result.shipped_to(j) - demand).abs() < TOL, "region {}", j);
    }
    for i in 0..input.num_plants() {
        let out = result.shipped_from(i);
        if result.is_open(i) {
            assert!(out <= input.capacity[i] + TOL, "plant {} over capacity", i);
        } else {
            assert_eq!(out, 0.0, "closed plant {} ships", i);
        }
    }
    assert!(result.shipments.values().all(|&units| units > 1e-6));
}

#[test]
fn demand_above_total_capacity_is_unsolved() {
    let mut input = scenario_a();
    input.demand = vec![100.0, 100.0, 100.0, 100.0];

    let mut model = highs();
    let outcome = model.solve(&input).unwrap();
    assert!(!outcome.is_solved());
    assert_ne!(outcome.status(), SolutionStatus::Optimal);
    assert!(outcome.solved().is_none());
    assert!(matches!(model.summary(), Err(PlanError::NoSolution(_))));
}

#[test]
fn repeated_solves_agree() {
    let input = scenario_a();
    let mut model = highs();
    let first = model.solve(&input).unwrap().data().unwrap().total;
    let second = model.solve(&input).unwrap().data().unwrap().total;
    let fresh = highs().solve(&input).unwrap().data().unwrap().total;

    assert!((first - second).abs() < TOL);
    assert!((first - fresh).abs() < TOL);
}

#[test]
fn zero_demand_is_solved_with_nothing_shipped() {
    let mut input = scenario_a();
    input.demand = vec![0.0; 4];

    let mut model = PlantLocation::new().with_config(SolverConfig::default());
    match model.solve(&input).unwrap() {
        SolveOutcome::Solved(result) => {
            assert!(result.opened.is_empty());
            assert!(result.shipments.is_empty());
            assert!(result.total.abs() < TOL);
        }
        SolveOutcome::Unsolved(status) => panic!("unexpected status {}", status),
    }
}

#[test]
fn plot_writes_a_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plants.png");

    let mut model = highs();
    model.solve(&scenario_a()).unwrap();
    model
        .plot(
            &[(0.0, 0.0), (10.0, 0.0), (5.0, 7.0)],
            &[(2.0, 2.0), (8.0, 1.0), (6.0, 5.0), (3.0, 6.0)],
            &path,
        )
        .unwrap();

    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (600, 600));
}
