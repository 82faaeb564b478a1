// Run configuration for the demo binary, read from LETSPLAN_* environment variables

use std::path::PathBuf;

use crate::domain::{SolverBackend, SolverConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: unknown solver '{value}' (expected auto, highs or cbc)")]
    UnknownSolver { var: &'static str, value: String },

    #[error("{var}: '{value}' is not a positive number")]
    NotPositive { var: &'static str, value: String },
}

pub const SOLVER_VAR: &str = "LETSPLAN_SOLVER";
pub const TIME_LIMIT_VAR: &str = "LETSPLAN_TIME_LIMIT";
pub const MIP_GAP_VAR: &str = "LETSPLAN_MIP_GAP";
pub const VERBOSE_VAR: &str = "LETSPLAN_VERBOSE";
pub const OUTPUT_DIR_VAR: &str = "LETSPLAN_OUTPUT_DIR";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub solver: SolverConfig,
    /// Directory receiving the chart images
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(SOLVER_VAR) {
            config.solver.backend = parse_backend(&value)?;
        }
        if let Some(value) = lookup(TIME_LIMIT_VAR) {
            config.solver.time_limit = Some(parse_positive(TIME_LIMIT_VAR, &value)?);
        }
        if let Some(value) = lookup(MIP_GAP_VAR) {
            config.solver.gap_tolerance = Some(parse_positive(MIP_GAP_VAR, &value)?);
        }
        if let Some(value) = lookup(VERBOSE_VAR) {
            config.solver.verbose = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(value) = lookup(OUTPUT_DIR_VAR) {
            config.output_dir = PathBuf::from(value);
        }

        Ok(config)
    }
}

fn parse_backend(value: &str) -> Result<SolverBackend, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => Ok(SolverBackend::Auto),
        "highs" => Ok(SolverBackend::Highs),
        "cbc" | "coin_cbc" | "coin-cbc" => Ok(SolverBackend::CoinCbc),
        _ => Err(ConfigError::UnknownSolver {
            var: SOLVER_VAR,
            value: value.to_string(),
        }),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::NotPositive {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = RunConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.solver.backend, SolverBackend::Auto);
        assert_eq!(config.solver.time_limit, None);
        assert!(!config.solver.verbose);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn reads_every_variable() {
        let config = RunConfig::from_lookup(lookup(&[
            (SOLVER_VAR, "CBC"),
            (TIME_LIMIT_VAR, "30"),
            (MIP_GAP_VAR, "0.01"),
            (VERBOSE_VAR, "true"),
            (OUTPUT_DIR_VAR, "/tmp/charts"),
        ]))
        .unwrap();
        assert_eq!(config.solver.backend, SolverBackend::CoinCbc);
        assert_eq!(config.solver.time_limit, Some(30.0));
        assert_eq!(config.solver.gap_tolerance, Some(0.01));
        assert!(config.solver.verbose);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/charts"));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            RunConfig::from_lookup(lookup(&[(SOLVER_VAR, "gurobi")])),
            Err(ConfigError::UnknownSolver { .. })
        ));
        assert!(matches!(
            RunConfig::from_lookup(lookup(&[(TIME_LIMIT_VAR, "-5")])),
            Err(ConfigError::NotPositive { var: TIME_LIMIT_VAR, .. })
        ));
        assert!(RunConfig::from_lookup(lookup(&[(MIP_GAP_VAR, "abc")])).is_err());
    }
}
