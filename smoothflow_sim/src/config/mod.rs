// smoothflow_sim/src/config/mod.rs

//! Loading and validating scenario files, and discovering them on disk.

mod catalog;
pub mod structs;

use crate::error::{Result, ScenarioError};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

pub use catalog::ScenarioCatalog;
pub use structs::*;

/// Prefix of environment variables overriding scenario values, e.g.
/// `SMOOTHFLOW_FILTER__CUTOFF=1e-6` or `SMOOTHFLOW_OUTPUT__FAST=false`.
pub const ENV_PREFIX: &str = "SMOOTHFLOW_";

/// Loads a scenario file, applies environment overrides and validates it.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    info!("Loading scenario from: {:?}", path);
    let figment = Figment::new().merge(Toml::file(path));
    extract(figment)
}

/// Parses a scenario from TOML text, with the same overrides as [`load_scenario`].
pub fn parse_scenario(toml: &str) -> Result<ScenarioConfig> {
    extract(Figment::new().merge(Toml::string(toml)))
}

fn extract(figment: Figment) -> Result<ScenarioConfig> {
    let config: ScenarioConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ScenarioError::Invalid {
            field,
            reason: "must be positive and finite",
        })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ScenarioError::Invalid {
            field,
            reason: "must be non-negative and finite",
        })
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("road.length_m", self.road.length_m)?;
        require_positive("road.duration_s", self.road.duration_s)?;
        require_positive("output.dx", self.output.dx)?;
        require_positive("output.dt", self.output.dt)?;

        let truth = &self.ground_truth;
        require_positive("ground_truth.free_speed", truth.free_speed)?;
        require_positive("ground_truth.jam_speed", truth.jam_speed)?;
        require_non_negative("ground_truth.free_flow", truth.free_flow)?;
        require_non_negative("ground_truth.jam_flow", truth.jam_flow)?;
        if let Some(jam) = &truth.jam {
            require_positive("ground_truth.jam.length_m", jam.length_m)?;
            require_positive("ground_truth.jam.edge_width_m", jam.edge_width_m)?;
            if !jam.front_m.is_finite() || !jam.wave_speed.is_finite() {
                return Err(ScenarioError::Invalid {
                    field: "ground_truth.jam",
                    reason: "front and wave speed must be finite",
                });
            }
        }

        if self.sources.is_empty() {
            return Err(ScenarioError::Invalid {
                field: "sources",
                reason: "at least one source is required",
            });
        }
        for source in &self.sources {
            match source {
                SourceConfig::Detector(d) => {
                    require_positive("detector.spacing_m", d.spacing_m)?;
                    require_positive("detector.interval_s", d.interval_s)?;
                    require_non_negative("detector.speed_noise_stddev", d.speed_noise_stddev)?;
                    require_non_negative("detector.flow_noise_stddev", d.flow_noise_stddev)?;
                    if !(0.0..1.0).contains(&d.dropout) {
                        return Err(ScenarioError::Invalid {
                            field: "detector.dropout",
                            reason: "must lie in [0, 1)",
                        });
                    }
                }
                SourceConfig::FloatingCar(f) => {
                    require_positive("floating_car.headway_s", f.headway_s)?;
                    require_positive("floating_car.sample_interval_s", f.sample_interval_s)?;
                    require_non_negative("floating_car.speed_noise_stddev", f.speed_noise_stddev)?;
                }
            }
        }
        self.filter.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smoothflow_core::prelude::KernelKind;

    const SCENARIO: &str = r#"
        [simulation]
        name = "test"
        seed = 7

        [road]
        length_m = 3000.0
        duration_s = 600.0

        [ground_truth.jam]
        front_m = 2500.0
        length_m = 800.0
        wave_speed = -5.0

        [[sources]]
        kind = "detector"
        name = "loops"
        spacing_m = 500.0
        interval_s = 60.0
        speed_noise_stddev = 1.0
        kernel = { sigma = 300.0, tau = 30.0 }

        [[sources]]
        kind = "floating_car"
        name = "probes"
        headway_s = 60.0
        sample_interval_s = 5.0
        kernel = { sigma = 50.0, tau = 10.0 }

        [filter]
        kernel = "exponential"
        cutoff = 1e-6
    "#;

    #[test]
    fn parses_full_scenario() {
        let config = parse_scenario(SCENARIO).unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].name(), "probes");
        assert!(matches!(config.sources[0], SourceConfig::Detector(_)));
        assert_eq!(config.filter.kernel, KernelKind::Exponential);
        assert_eq!(config.filter.cutoff, 1e-6);
        // Defaults fill the rest.
        assert_eq!(config.ground_truth.free_speed, 30.0);
        assert_eq!(config.ground_truth.jam.unwrap().edge_width_m, 100.0);
        assert!(config.output.fast);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = SCENARIO.replace("spacing_m = 500.0", "spacing_m = 500.0\nspacing = 1.0");
        assert!(matches!(parse_scenario(&text), Err(ScenarioError::Config(_))));
        let text = SCENARIO.replace("cutoff = 1e-6", "cutoff = 1e-6\nbandwidth = 3.0");
        assert!(matches!(parse_scenario(&text), Err(ScenarioError::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let text = SCENARIO.replace("headway_s = 60.0", "headway_s = 0.0");
        assert!(matches!(
            parse_scenario(&text),
            Err(ScenarioError::Invalid {
                field: "floating_car.headway_s",
                ..
            })
        ));
        let text = SCENARIO.replace("cutoff = 1e-6", "cutoff = 2.0");
        assert!(matches!(parse_scenario(&text), Err(ScenarioError::Estimation(_))));
    }

    #[test]
    fn sources_are_required() {
        let text = "[simulation]\nname = \"empty\"\n";
        assert!(matches!(
            parse_scenario(text),
            Err(ScenarioError::Invalid { field: "sources", .. })
        ));
    }
}
