// smoothflow_sim/src/lib.rs

//! Scenario runner around `smoothflow_core`: loads scenario files, synthesizes
//! measurements, runs the estimator and reports its error.

pub mod cli;
pub mod config;
pub mod error;
pub mod prng;
pub mod report;
pub mod scenario;

use crate::cli::Cli;
use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::report::Report;
use crate::scenario::{FilterMode, Scenario};
use std::path::Path;

/// Loads a scenario and applies the command-line overrides.
pub fn load_with_overrides(path: &Path, cli: &Cli) -> Result<ScenarioConfig> {
    let mut config = config::load_scenario(path)?;
    if let Some(cutoff) = cli.cutoff {
        config.filter.cutoff = cutoff;
        config.filter.validate()?;
    }
    if cli.exact {
        config.output.fast = false;
    }
    Ok(config)
}

/// Prepares and runs one scenario.
pub fn run_scenario(config: ScenarioConfig) -> Result<Report> {
    let mode = if config.output.fast {
        FilterMode::Fast
    } else {
        FilterMode::Exact
    };
    Scenario::prepare(config)?.run(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use smoothflow_core::prelude::QuantityId;
    use std::path::PathBuf;

    fn bundled(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets/scenarios")
            .join(name)
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let cli = Cli::parse_from(["smoothflow", "--exact", "--cutoff", "1e-5"]);
        let config = load_with_overrides(&bundled("jam_wave.toml"), &cli).unwrap();
        assert!(!config.output.fast);
        assert_eq!(config.filter.cutoff, 1e-5);
    }

    #[test]
    fn invalid_cutoff_override_is_rejected() {
        let cli = Cli::parse_from(["smoothflow", "--cutoff", "0"]);
        assert!(load_with_overrides(&bundled("jam_wave.toml"), &cli).is_err());
    }

    #[test]
    fn bundled_free_flow_scenario_is_reproduced() {
        let cli = Cli::parse_from(["smoothflow"]);
        let config = load_with_overrides(&bundled("free_flow.toml"), &cli).unwrap();
        let report = run_scenario(config).unwrap();
        let speed = report.get(&QuantityId::speed()).unwrap();
        assert_eq!(speed.missing, 0);
        assert!(speed.rmse < 1.0, "speed rmse {}", speed.rmse);
    }
}
