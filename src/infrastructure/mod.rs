// Infrastructure: chart rendering, configuration and logging

pub mod chart;
pub mod config;
pub mod logging;

pub use config::{ConfigError, RunConfig};
