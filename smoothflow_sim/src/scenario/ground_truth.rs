// smoothflow_sim/src/scenario/ground_truth.rs

use crate::config::{GroundTruthConfig, JamConfig};
use smoothflow_core::prelude::{Grid, QuantityId};

/// Analytic traffic state: free flow everywhere except inside an optional
/// congested band that travels at constant speed.
#[derive(Debug, Clone, Copy)]
pub struct GroundTruth {
    config: GroundTruthConfig,
}

impl GroundTruth {
    pub fn new(config: GroundTruthConfig) -> Self {
        Self { config }
    }

    /// Degree of congestion in `[0, 1]` at `(x, t)`.
    pub fn congestion(&self, x: f64, t: f64) -> f64 {
        match &self.config.jam {
            Some(jam) => band(jam, x, t),
            None => 0.0,
        }
    }

    pub fn speed(&self, x: f64, t: f64) -> f64 {
        let c = self.config;
        lerp(c.free_speed, c.jam_speed, self.congestion(x, t))
    }

    pub fn flow(&self, x: f64, t: f64) -> f64 {
        let c = self.config;
        lerp(c.free_flow, c.jam_flow, self.congestion(x, t))
    }

    /// Fundamental relation `q = k·v`.
    pub fn density(&self, x: f64, t: f64) -> f64 {
        self.flow(x, t) / self.speed(x, t)
    }

    /// Value of `quantity`; `None` for quantities the model does not know.
    pub fn value(&self, quantity: &QuantityId, x: f64, t: f64) -> Option<f64> {
        match quantity.as_str() {
            "speed" => Some(self.speed(x, t)),
            "flow" => Some(self.flow(x, t)),
            "density" => Some(self.density(x, t)),
            _ => None,
        }
    }

    /// Samples `quantity` on the cross product of `xs` and `ts`.
    pub fn grid(&self, quantity: &QuantityId, xs: &[f64], ts: &[f64]) -> Option<Grid> {
        self.value(quantity, 0.0, 0.0)?;
        Some(Grid::from_fn(xs.len(), ts.len(), |i, j| {
            self.value(quantity, xs[i], ts[j]).unwrap_or(f64::NAN)
        }))
    }
}

fn band(jam: &JamConfig, x: f64, t: f64) -> f64 {
    let front = jam.front_m + jam.wave_speed * t;
    let tail = front - jam.length_m;
    logistic((front - x) / jam.edge_width_m) * logistic((x - tail) / jam.edge_width_m)
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn lerp(a: f64, b: f64, s: f64) -> f64 {
    a + (b - a) * s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn truth() -> GroundTruth {
        GroundTruth::new(GroundTruthConfig {
            jam: Some(JamConfig {
                front_m: 4000.0,
                length_m: 1500.0,
                wave_speed: -5.0,
                edge_width_m: 50.0,
            }),
            ..GroundTruthConfig::default()
        })
    }

    #[test]
    fn jam_travels_upstream() {
        let truth = truth();
        // Centre of the band at t = 0 and t = 200.
        assert_abs_diff_eq!(truth.speed(3250.0, 0.0), 4.0, epsilon = 1e-3);
        assert_abs_diff_eq!(truth.speed(2250.0, 200.0), 4.0, epsilon = 1e-3);
        // Downstream of the front and upstream of the tail.
        assert_abs_diff_eq!(truth.speed(5000.0, 0.0), 30.0, epsilon = 1e-2);
        assert_abs_diff_eq!(truth.speed(1000.0, 200.0), 30.0, epsilon = 1e-2);
    }

    #[test]
    fn density_follows_fundamental_relation() {
        let truth = truth();
        let (x, t) = (3000.0, 100.0);
        assert_abs_diff_eq!(
            truth.density(x, t) * truth.speed(x, t),
            truth.flow(x, t),
            epsilon = 1e-12
        );
        assert!(truth.value(&QuantityId::new("delay"), x, t).is_none());
    }

    #[test]
    fn without_jam_everything_is_free() {
        let truth = GroundTruth::new(GroundTruthConfig::default());
        let grid = truth
            .grid(&QuantityId::flow(), &[0.0, 500.0], &[0.0, 60.0, 120.0])
            .unwrap();
        assert!(grid.iter().all(|&q| q == 0.55));
    }
}
