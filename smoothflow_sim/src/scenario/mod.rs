// smoothflow_sim/src/scenario/mod.rs

//! Turns a scenario into measurements, feeds them to an estimator and scores
//! the filtered fields against the ground truth.

pub mod ground_truth;
pub mod sensors;

use crate::config::{ScenarioConfig, SourceConfig};
use crate::error::Result;
use crate::prng::SimulationRng;
use crate::report::{QuantityReport, Report};
use ground_truth::GroundTruth;
use sensors::Measurements;
use smoothflow_core::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// How the output grid is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Exact,
    Fast,
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Exact => f.write_str("exact"),
            FilterMode::Fast => f.write_str("fast"),
        }
    }
}

/// One prepared run: the configuration, its ground truth and an estimator
/// holding every synthetic measurement.
pub struct Scenario {
    pub config: ScenarioConfig,
    pub truth: GroundTruth,
    pub estimator: Estimator,
    /// Quantities with at least one stream.
    pub quantities: Vec<QuantityId>,
}

impl Scenario {
    /// Generates all measurements and ingests them.
    pub fn prepare(config: ScenarioConfig) -> Result<Self> {
        let truth = GroundTruth::new(config.ground_truth);
        let mut rng = SimulationRng::new(config.simulation.seed);
        let mut estimator = Estimator::new(config.filter)?;
        let mut quantities: Vec<QuantityId> = Vec::new();

        for source in &config.sources {
            let (data, footprint) = match source {
                SourceConfig::Detector(d) => (
                    sensors::detector_measurements(d, &config.road, &truth, &mut rng)?,
                    d.kernel,
                ),
                SourceConfig::FloatingCar(f) => (
                    sensors::floating_car_measurements(f, &config.road, &truth, &mut rng)?,
                    f.kernel,
                ),
            };
            let handle = estimator.create_source(source.name())?;
            for (quantity, measurements) in data {
                let stream =
                    estimator.add_stream(handle, &quantity, footprint.sigma, footprint.tau)?;
                let stored = match &measurements {
                    Measurements::Grid { xs, ts, values } => {
                        estimator.add_grid_si(stream, xs, ts, values)?
                    }
                    Measurements::Points { xs, ts, vs } => {
                        estimator.add_vector_si(stream, xs, ts, vs)?
                    }
                };
                info!(
                    "  -> Source '{}' {}: {} of {} samples stored",
                    source.name(),
                    quantity,
                    stored,
                    measurements.len()
                );
                if !quantities.contains(&quantity) {
                    quantities.push(quantity);
                }
            }
        }

        Ok(Self {
            config,
            truth,
            estimator,
            quantities,
        })
    }

    pub fn raster(&self) -> Result<Raster> {
        let road = &self.config.road;
        let out = &self.config.output;
        Ok(Raster::new(0.0, out.dx, road.length_m, 0.0, out.dt, road.duration_s)?)
    }

    /// Filters every measured quantity on the output raster and scores it.
    pub fn run(&self, mode: FilterMode) -> Result<Report> {
        let raster = self.raster()?;
        let started = Instant::now();
        let progress = |fraction: f64| debug!("Filter progress: {:.0}%", fraction * 100.0);
        let options = FilterOptions::default().with_observer(&progress);
        let result = match mode {
            FilterMode::Fast => self
                .estimator
                .filter_raster(&raster, &self.quantities, &options)?,
            FilterMode::Exact => self.estimator.filter_si_with(
                &raster.locations(),
                &raster.times(),
                &self.quantities,
                &options,
            )?,
        };
        let elapsed = started.elapsed();
        info!(
            "Filtered {} x {} cells ({} mode) in {:.2?}",
            raster.nx(),
            raster.nt(),
            mode,
            elapsed
        );

        let quantities = self
            .quantities
            .iter()
            .filter_map(|q| self.score(&result, q))
            .collect();
        Ok(Report {
            scenario: self.config.simulation.name.clone(),
            mode,
            cells: raster.nx() * raster.nt(),
            elapsed,
            quantities,
        })
    }

    fn score(&self, result: &FilterResult, quantity: &QuantityId) -> Option<QuantityReport> {
        let estimate = result.get_si(quantity)?;
        let truth = self
            .truth
            .grid(quantity, result.locations(), result.times())?;
        Some(QuantityReport::compare(quantity.clone(), estimate, &truth))
    }
}
