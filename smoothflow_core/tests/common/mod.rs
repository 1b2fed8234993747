// smoothflow_core/tests/common/mod.rs

#![allow(dead_code)]

use smoothflow_core::prelude::*;

pub const DETECTOR_SPEED: f64 = 33.0;
pub const PROBE_SPEED: f64 = 10.0;
pub const FLOW: f64 = 0.5;

/// Evenly spaced values from `start` to `end` inclusive.
pub fn axis(start: f64, step: f64, end: f64) -> Vec<f64> {
    let n = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Estimator with a dense detector source measuring uniform speed and flow
/// over `[0, length] × [0, duration]`, every 100 m and 10 s.
pub fn detector_estimator(length: f64, duration: f64) -> Estimator {
    let mut est = Estimator::new(FilterParams::default()).unwrap();
    let det = est.create_source("detectors").unwrap();
    let speed = est.add_stream(det, &QuantityId::speed(), 300.0, 30.0).unwrap();
    let flow = est.add_stream(det, &QuantityId::flow(), 300.0, 30.0).unwrap();
    let xs = axis(0.0, 100.0, length);
    let ts = axis(0.0, 10.0, duration);
    est.add_grid_si(speed, &xs, &ts, &Grid::from_element(xs.len(), ts.len(), DETECTOR_SPEED))
        .unwrap();
    est.add_grid_si(flow, &xs, &ts, &Grid::from_element(xs.len(), ts.len(), FLOW))
        .unwrap();
    est
}

/// A probe vehicle driving at `PROBE_SPEED` through `(x0, t0)`, reporting at
/// the given times.
pub fn probe_trace(x0: f64, t0: f64, times: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let xs = times.iter().map(|t| x0 + PROBE_SPEED * (t - t0)).collect();
    (xs, times.to_vec())
}

/// Adds a floating-car speed stream with the given footprint and trace.
pub fn add_probes(est: &mut Estimator, sigma: f64, tau: f64, xs: &[f64], ts: &[f64]) {
    let fcd = est.create_source("floating_cars").unwrap();
    let speed = est.add_stream(fcd, &QuantityId::speed(), sigma, tau).unwrap();
    let vs = vec![PROBE_SPEED; xs.len()];
    est.add_vector_si(speed, xs, ts, &vs).unwrap();
}

/// Speed of the exact filter at each `(xs[k], ts[k])`.
pub fn speed_at(est: &Estimator, xs: &[f64], ts: &[f64]) -> Vec<f64> {
    xs.iter()
        .zip(ts)
        .map(|(&x, &t)| {
            est.filter_si(&[x], &[t], &[QuantityId::speed()])
                .unwrap()
                .value_si(&QuantityId::speed(), 0, 0)
                .unwrap()
        })
        .collect()
}

/// Asserts that every cell of the filtered flow equals the uniform input flow.
pub fn assert_flow_conserved(est: &Estimator, xs: &[f64], ts: &[f64]) {
    let result = est.filter_si(xs, ts, &[QuantityId::flow()]).unwrap();
    let flow = result.get_si(&QuantityId::flow()).unwrap();
    for v in flow.iter() {
        assert!((v - FLOW).abs() < 1e-6, "flow {v} deviates from {FLOW}");
    }
}
