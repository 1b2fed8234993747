// smoothflow_sim/src/config/structs.rs

use serde::{Deserialize, Serialize};
use smoothflow_core::prelude::{FilterParams, QuantityId};

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a scenario `.toml` file. All values SI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,

    #[serde(default)]
    pub road: Road,

    #[serde(default)]
    pub ground_truth: GroundTruthConfig,

    // The TOML has `[[sources]]`, which becomes a Vec of SourceConfig.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub filter: FilterParams,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {
    pub name: String,
    /// Optional seed for the measurement noise. Unseeded runs differ every time.
    pub seed: Option<u64>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            seed: None,
        }
    }
}

/// The observed stretch of road and period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Road {
    pub length_m: f64,
    pub duration_s: f64,
}

impl Default for Road {
    fn default() -> Self {
        Self {
            length_m: 6000.0,
            duration_s: 1800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GroundTruthConfig {
    pub free_speed: f64,
    pub free_flow: f64,
    pub jam_speed: f64,
    pub jam_flow: f64,
    /// Optional congestion wave travelling upstream.
    pub jam: Option<JamConfig>,
}

impl Default for GroundTruthConfig {
    fn default() -> Self {
        Self {
            free_speed: 30.0,
            free_flow: 0.55,
            jam_speed: 4.0,
            jam_flow: 0.3,
            jam: None,
        }
    }
}

/// A congested band `[front - length, front)` whose front moves at `wave_speed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JamConfig {
    /// Location of the downstream front at t = 0 [m].
    pub front_m: f64,
    pub length_m: f64,
    /// Signed front speed [m/s], negative for upstream travel.
    pub wave_speed: f64,
    /// Width of the speed transition at both edges [m].
    #[serde(default = "default_edge_width")]
    pub edge_width_m: f64,
}

fn default_edge_width() -> f64 {
    100.0
}

// =========================================================================
// == Measurement Sources ==
// =========================================================================

/// The `kind` field decides which variant is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    Detector(DetectorConfig),
    FloatingCar(FloatingCarConfig),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Detector(d) => &d.name,
            SourceConfig::FloatingCar(f) => &f.name,
        }
    }

    /// Quantities this source measures.
    pub fn quantities(&self) -> Vec<QuantityId> {
        match self {
            SourceConfig::Detector(_) => vec![QuantityId::speed(), QuantityId::flow()],
            SourceConfig::FloatingCar(_) => vec![QuantityId::speed()],
        }
    }
}

/// Stationary detectors, aggregating speed and flow over fixed intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    pub name: String,
    pub spacing_m: f64,
    pub interval_s: f64,
    #[serde(default)]
    pub speed_noise_stddev: f64,
    #[serde(default)]
    pub flow_noise_stddev: f64,
    /// Fraction of intervals lost to outages, reported as missing values.
    #[serde(default)]
    pub dropout: f64,
    pub kernel: Footprint,
}

/// Probe vehicles entering at the upstream end, reporting their speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloatingCarConfig {
    pub name: String,
    /// Time between two probe vehicles entering the road [s].
    pub headway_s: f64,
    pub sample_interval_s: f64,
    #[serde(default)]
    pub speed_noise_stddev: f64,
    pub kernel: Footprint,
}

/// Kernel widths of a source's streams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Footprint {
    pub sigma: f64,
    pub tau: f64,
}

// =========================================================================
// == Output ==
// =========================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub dx: f64,
    pub dt: f64,
    /// Use the raster-bucketed filter instead of the exact one.
    pub fast: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dx: 100.0,
            dt: 30.0,
            fast: true,
        }
    }
}
