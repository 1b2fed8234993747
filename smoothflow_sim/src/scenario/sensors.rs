// smoothflow_sim/src/scenario/sensors.rs

//! Synthetic measurements of the ground truth, with Gaussian noise.

use super::ground_truth::GroundTruth;
use crate::config::{DetectorConfig, FloatingCarConfig, Road};
use crate::error::Result;
use crate::prng::SimulationRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use smoothflow_core::prelude::{Grid, QuantityId};

/// Integration step of probe trajectories [s].
const TRAJECTORY_STEP: f64 = 1.0;

/// Measurements of one quantity, shaped the way they are ingested.
#[derive(Debug, Clone)]
pub enum Measurements {
    /// `values[(i, j)]` at `(xs[i], ts[j])`.
    Grid { xs: Vec<f64>, ts: Vec<f64>, values: Grid },
    Points { xs: Vec<f64>, ts: Vec<f64>, vs: Vec<f64> },
}

impl Measurements {
    pub fn len(&self) -> usize {
        match self {
            Measurements::Grid { values, .. } => values.len(),
            Measurements::Points { vs, .. } => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loop detectors every `spacing_m`, reporting interval means at the
/// interval midpoints. Dropped intervals are reported as `NaN`.
pub fn detector_measurements(
    config: &DetectorConfig,
    road: &Road,
    truth: &GroundTruth,
    rng: &mut SimulationRng,
) -> Result<Vec<(QuantityId, Measurements)>> {
    let xs = midpoints(config.spacing_m, road.length_m);
    let ts = midpoints(config.interval_s, road.duration_s);
    let speed_noise = Normal::new(0.0, config.speed_noise_stddev)?;
    let flow_noise = Normal::new(0.0, config.flow_noise_stddev)?;

    let mut speed = Grid::zeros(xs.len(), ts.len());
    let mut flow = Grid::zeros(xs.len(), ts.len());
    for (i, &x) in xs.iter().enumerate() {
        for (j, &t) in ts.iter().enumerate() {
            if config.dropout > 0.0 && rng.0.gen_bool(config.dropout) {
                speed[(i, j)] = f64::NAN;
                flow[(i, j)] = f64::NAN;
                continue;
            }
            speed[(i, j)] = (truth.speed(x, t) + speed_noise.sample(&mut rng.0)).max(0.0);
            flow[(i, j)] = (truth.flow(x, t) + flow_noise.sample(&mut rng.0)).max(0.0);
        }
    }

    Ok(vec![
        (
            QuantityId::speed(),
            Measurements::Grid {
                xs: xs.clone(),
                ts: ts.clone(),
                values: speed,
            },
        ),
        (
            QuantityId::flow(),
            Measurements::Grid {
                xs,
                ts,
                values: flow,
            },
        ),
    ])
}

/// Probe vehicles entering at `x = 0` every `headway_s`, driving at the
/// ground-truth speed and reporting it every `sample_interval_s`.
pub fn floating_car_measurements(
    config: &FloatingCarConfig,
    road: &Road,
    truth: &GroundTruth,
    rng: &mut SimulationRng,
) -> Result<Vec<(QuantityId, Measurements)>> {
    let noise = Normal::new(0.0, config.speed_noise_stddev)?;
    let (mut xs, mut ts, mut vs) = (Vec::new(), Vec::new(), Vec::new());

    let mut entry = 0.0;
    while entry < road.duration_s {
        let (mut x, mut t) = (0.0, entry);
        let mut next_report = entry;
        while x <= road.length_m && t <= road.duration_s {
            let v = truth.speed(x, t);
            if t >= next_report {
                xs.push(x);
                ts.push(t);
                vs.push((v + noise.sample(&mut rng.0)).max(0.0));
                next_report += config.sample_interval_s;
            }
            x += v * TRAJECTORY_STEP;
            t += TRAJECTORY_STEP;
        }
        entry += config.headway_s;
    }

    Ok(vec![(QuantityId::speed(), Measurements::Points { xs, ts, vs })])
}

/// Centres of the `step`-wide intervals covering `[0, end]`.
fn midpoints(step: f64, end: f64) -> Vec<f64> {
    let n = (end / step).floor() as usize;
    (0..n).map(|k| (k as f64 + 0.5) * step).collect()
}
