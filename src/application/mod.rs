// Application layer: the two planning models and their reports

pub mod aggregate_plan;
pub mod error;
pub mod formulation;
pub mod outcome;
pub mod plant_location;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate_plan::{AggregatePlanInput, AggregatePlanResult, AggregatePlanner, PlanFeatures};
pub use error::PlanError;
pub use outcome::SolveOutcome;
pub use plant_location::{PlantLocation, PlantLocationInput, PlantLocationResult};
