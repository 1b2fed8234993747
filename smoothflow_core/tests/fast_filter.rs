// smoothflow_core/tests/fast_filter.rs

mod common;

use common::*;
use smoothflow_core::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Detectors over a jam that moves upstream at 5 m/s, plus a probe trace.
fn jam_estimator(params: FilterParams) -> Estimator {
    let mut est = Estimator::new(params).unwrap();
    let det = est.create_source("detectors").unwrap();
    let speed = est.add_stream(det, &QuantityId::speed(), 300.0, 30.0).unwrap();
    let flow = est.add_stream(det, &QuantityId::flow(), 300.0, 30.0).unwrap();
    let xs = axis(0.0, 500.0, 6000.0);
    let ts = axis(0.0, 30.0, 1800.0);
    let jammed = |x: f64, t: f64| {
        let front = 4000.0 - 5.0 * t;
        (front - 1500.0..front).contains(&x)
    };
    let speed_grid = Grid::from_fn(xs.len(), ts.len(), |i, j| {
        if jammed(xs[i], ts[j]) {
            4.0
        } else {
            30.0
        }
    });
    let flow_grid = Grid::from_fn(xs.len(), ts.len(), |i, j| {
        if jammed(xs[i], ts[j]) {
            0.3
        } else {
            0.55
        }
    });
    est.add_grid_si(speed, &xs, &ts, &speed_grid).unwrap();
    est.add_grid_si(flow, &xs, &ts, &flow_grid).unwrap();

    let (px, pt) = probe_trace(200.0, 100.0, &axis(100.0, 5.0, 700.0));
    add_probes(&mut est, 50.0, 10.0, &px, &pt);
    est
}

fn assert_close(exact: &Grid, fast: &Grid, tolerance: f64) {
    assert_eq!(exact.shape(), fast.shape());
    for (e, f) in exact.iter().zip(fast.iter()) {
        if e.is_nan() || f.is_nan() {
            assert!(e.is_nan() && f.is_nan(), "exact {e} vs fast {f}");
        } else {
            assert!((e - f).abs() <= tolerance, "exact {e} vs fast {f}");
        }
    }
}

#[test]
fn fast_filter_matches_exact_filter() {
    let est = jam_estimator(FilterParams::default());
    let quantities = [QuantityId::speed(), QuantityId::flow()];
    let raster = Raster::new(0.0, 200.0, 6000.0, 0.0, 20.0, 1800.0).unwrap();

    let fast = est
        .filter_raster(&raster, &quantities, &FilterOptions::default())
        .unwrap();
    let exact = est
        .filter_si(&raster.locations(), &raster.times(), &quantities)
        .unwrap();
    assert_eq!(fast.locations(), exact.locations());
    assert_eq!(fast.times(), exact.times());
    for q in &quantities {
        assert_close(exact.get_si(q).unwrap(), fast.get_si(q).unwrap(), 1e-9);
    }
}

#[test]
fn fast_filter_respects_kernel_range() {
    let params = FilterParams::default().with_range(1000.0, 120.0);
    let est = jam_estimator(params);
    let quantities = [QuantityId::speed(), QuantityId::flow()];
    // Extends past the data so that some cells have no support at all.
    let raster = Raster::new(-3000.0, 250.0, 9000.0, -600.0, 60.0, 2400.0).unwrap();

    let fast = est
        .filter_raster(&raster, &quantities, &FilterOptions::default())
        .unwrap();
    let exact = est
        .filter_si(&raster.locations(), &raster.times(), &quantities)
        .unwrap();
    for q in &quantities {
        assert_close(exact.get_si(q).unwrap(), fast.get_si(q).unwrap(), 1e-9);
    }
    let speed = fast.get_si(&QuantityId::speed()).unwrap();
    assert!(speed[(0, 0)].is_nan());
}

#[test]
fn fast_and_exact_agree_on_support_without_range() {
    // Unbounded range: support ends where the kernel drops below the cutoff.
    let mut est = Estimator::new(FilterParams::default()).unwrap();
    let src = est.create_source("floating_cars").unwrap();
    let speed = est.add_stream(src, &QuantityId::speed(), 10.0, 5.0).unwrap();
    est.add_point_si(speed, 0.0, 0.0, 30.0).unwrap();
    // Many samples that are each negligible at x <= 50 m.
    let far = vec![140.0; 1000];
    let at = vec![0.0; far.len()];
    est.add_vector_si(speed, &far, &at, &vec![10.0; far.len()])
        .unwrap();

    let raster = Raster::new(-100.0, 10.0, 300.0, 0.0, 5.0, 20.0).unwrap();
    let quantities = [QuantityId::speed()];
    let fast = est
        .filter_raster(&raster, &quantities, &FilterOptions::default())
        .unwrap();
    let exact = est
        .filter_si(&raster.locations(), &raster.times(), &quantities)
        .unwrap();
    let fast = fast.get_si(&QuantityId::speed()).unwrap();
    let exact = exact.get_si(&QuantityId::speed()).unwrap();
    assert_close(exact, fast, 1e-9);

    // x = 50 m sees only the single sample; x = 70 m is beyond the cutoff of
    // both, 70 m from each.
    assert!((exact[(15, 0)] - 30.0).abs() < 1e-9, "exact {}", exact[(15, 0)]);
    assert!(exact[(17, 0)].is_nan() && fast[(17, 0)].is_nan());
    // x = 140 m lies on the far samples.
    assert!((fast[(24, 0)] - 10.0).abs() < 1e-9);
    // x = -100 m at t = 20 s has no support from either.
    assert!(exact[(0, 4)].is_nan());
}

#[test]
fn fast_filter_with_exponential_kernels() {
    let params = FilterParams {
        kernel: KernelKind::Exponential,
        ..FilterParams::default()
    };
    let est = jam_estimator(params);
    let quantities = [QuantityId::speed()];
    let raster = Raster::new(0.0, 300.0, 6000.0, 0.0, 60.0, 1800.0).unwrap();
    let fast = est
        .filter_raster(&raster, &quantities, &FilterOptions::default())
        .unwrap();
    let exact = est
        .filter_si(&raster.locations(), &raster.times(), &quantities)
        .unwrap();
    assert_close(
        exact.get_si(&QuantityId::speed()).unwrap(),
        fast.get_si(&QuantityId::speed()).unwrap(),
        1e-9,
    );
}

#[test]
fn jam_and_free_flow_are_separated() {
    let est = jam_estimator(FilterParams::default());
    let result = est
        .filter_fast_si(0.0, 500.0, 6000.0, 0.0, 60.0, 1800.0, &[QuantityId::speed()])
        .unwrap();
    let speed = result.get_si(&QuantityId::speed()).unwrap();
    // At t = 300 s the jam covers [1000, 2500) m; 5500 m is free downstream.
    let t = 5;
    assert!(speed[(3, t)] < 6.0, "jam speed {}", speed[(3, t)]);
    assert!(speed[(11, t)] > 25.0, "free speed {}", speed[(11, t)]);
}

#[test]
fn progress_reaches_completion() {
    let est = jam_estimator(FilterParams::default());
    let raster = Raster::new(0.0, 1000.0, 6000.0, 0.0, 300.0, 1800.0).unwrap();
    let calls = AtomicUsize::new(0);
    let latest = Mutex::new(0.0_f64);
    let observer = |fraction: f64| {
        calls.fetch_add(1, Ordering::Relaxed);
        let mut guard = latest.lock().unwrap();
        *guard = guard.max(fraction);
    };
    let options = FilterOptions::default().with_observer(&observer);
    est.filter_raster(&raster, &[QuantityId::speed()], &options)
        .unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), raster.nx());
    assert_eq!(*latest.lock().unwrap(), 1.0);
}

#[test]
fn cancellation_stops_fast_filter() {
    let est = jam_estimator(FilterParams::default());
    let token = CancellationToken::new();
    let remote = token.clone();
    remote.cancel();
    let raster = Raster::new(0.0, 100.0, 6000.0, 0.0, 10.0, 1800.0).unwrap();
    let options = FilterOptions::default().with_cancel(&token);
    assert_eq!(
        est.filter_raster(&raster, &[QuantityId::speed()], &options)
            .unwrap_err(),
        EstimationError::Cancelled
    );
}
