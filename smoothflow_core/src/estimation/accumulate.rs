// smoothflow_core/src/estimation/accumulate.rs

//! The accumulation core shared by the exact and the fast filter. Both differ
//! only in how candidate samples for a cell are looked up; a sample supports a
//! cell when its kernel weight reaches `FilterParams::cutoff`, whichever lookup
//! found it.

use super::blend::{Regime, RegimeBlend};
use super::control::FilterOptions;
use crate::config::FilterParams;
use crate::error::{EstimationError, Result};
use crate::quantity::Converter;
use crate::source::DataStream;
use crate::types::{Grid, QuantityId, Sample};
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An output cell: its raster indices and its coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub i: usize,
    pub j: usize,
    pub x: f64,
    pub t: f64,
}

/// Finds the samples of one stream that may contribute to a cell.
pub(crate) trait SampleLookup: Sync {
    fn for_each_candidate<F: FnMut(&Sample)>(&self, stream: usize, cell: Cell, visit: F);
}

/// Visits every sample. Places no constraint on output coordinates.
pub(crate) struct ExactLookup<'a> {
    pub streams: &'a [DataStream],
}

impl SampleLookup for ExactLookup<'_> {
    fn for_each_candidate<F: FnMut(&Sample)>(&self, stream: usize, _cell: Cell, visit: F) {
        self.streams[stream].samples().iter().for_each(visit);
    }
}

// --- Weighted means under both regimes ---

/// Numerators and denominators of the free-flow and congestion weighted means.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RegimeSums {
    num_free: f64,
    den_free: f64,
    num_cong: f64,
    den_cong: f64,
}

impl RegimeSums {
    #[inline]
    fn add(&mut self, v: f64, w_free: f64, w_cong: f64) {
        self.num_free += w_free * v;
        self.den_free += w_free;
        self.num_cong += w_cong * v;
        self.den_cong += w_cong;
    }

    /// Weighted mean of the regime, `NaN` without any weight.
    pub(crate) fn estimate(&self, regime: Regime) -> f64 {
        let (num, den) = match regime {
            Regime::FreeFlow => (self.num_free, self.den_free),
            Regime::Congestion => (self.num_cong, self.den_cong),
        };
        if den > 0.0 {
            num / den
        } else {
            f64::NAN
        }
    }
}

/// A requested quantity resolved to the streams that carry it.
#[derive(Debug, Clone)]
pub(crate) struct Requested {
    pub id: QuantityId,
    pub streams: Vec<usize>,
    pub is_reference: bool,
    pub converter: Box<dyn Converter>,
}

/// Everything needed to evaluate cells, resolved once per filter call.
pub(crate) struct CellEvaluator<'a> {
    pub streams: &'a [DataStream],
    pub params: FilterParams,
    pub blend: RegimeBlend,
    /// Streams of the reference quantity; `None` if there are none.
    pub reference: Option<Vec<usize>>,
    pub requested: Vec<Requested>,
}

impl CellEvaluator<'_> {
    /// Sums kernel-weighted values of `streams` around the cell under both regimes.
    /// Weights below the cutoff count as zero in their regime.
    pub(crate) fn accumulate<L: SampleLookup>(
        &self,
        lookup: &L,
        streams: &[usize],
        cell: Cell,
    ) -> RegimeSums {
        let c_free = Regime::FreeFlow.characteristic_speed(&self.params);
        let c_cong = Regime::Congestion.characteristic_speed(&self.params);
        let (x_max, t_max, cutoff) = (self.params.x_max, self.params.t_max, self.params.cutoff);
        let mut sums = RegimeSums::default();
        for &s in streams {
            let shape = self.streams[s].shape();
            let reliability = shape.reliability();
            let weight = |c: f64, dx: f64, dt: f64| -> f64 {
                let w = shape.weight(c, dx, dt);
                if w < cutoff {
                    0.0
                } else {
                    reliability * w
                }
            };
            lookup.for_each_candidate(s, cell, |sample| {
                let dx = cell.x - sample.x;
                let dt = cell.t - sample.t;
                if dx.abs() > x_max || dt.abs() > t_max {
                    return;
                }
                sums.add(sample.v, weight(c_free, dx, dt), weight(c_cong, dx, dt));
            });
        }
        sums
    }

    /// Writes the blended value of every requested quantity at `cell` into `out`.
    pub(crate) fn evaluate<L: SampleLookup>(&self, lookup: &L, cell: Cell, out: &mut [f64]) {
        let speed = self
            .reference
            .as_ref()
            .map(|streams| self.accumulate(lookup, streams, cell));
        let beta = match &speed {
            Some(s) => self
                .blend
                .free_weight(s.estimate(Regime::FreeFlow), s.estimate(Regime::Congestion)),
            None => 1.0,
        };

        for (value, requested) in out.iter_mut().zip(&self.requested) {
            let sums = match (&speed, requested.is_reference) {
                (Some(s), true) => *s,
                _ => self.accumulate(lookup, &requested.streams, cell),
            };
            *value = RegimeBlend::combine(
                beta,
                sums.estimate(Regime::FreeFlow),
                sums.estimate(Regime::Congestion),
            );
        }
    }

    /// Evaluates the full `locations × times` grid, one output row per task.
    /// Returns one grid per requested quantity, in request order.
    pub(crate) fn run<L: SampleLookup>(
        &self,
        lookup: &L,
        locations: &[f64],
        times: &[f64],
        options: &FilterOptions<'_>,
    ) -> Result<Vec<Grid>> {
        let nq = self.requested.len();
        let (nx, nt) = (locations.len(), times.len());
        let rows_done = AtomicUsize::new(0);

        let row = |i: usize| -> Result<Vec<f64>> {
            let mut values = vec![0.0; nt * nq];
            for (j, (&t, out)) in times.iter().zip(values.chunks_mut(nq.max(1))).enumerate() {
                if options.is_cancelled() {
                    return Err(EstimationError::Cancelled);
                }
                let cell = Cell {
                    i,
                    j,
                    x: locations[i],
                    t,
                };
                self.evaluate(lookup, cell, out);
            }
            let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
            options.report(done as f64 / nx as f64);
            Ok(values)
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = (0..nx).into_par_iter().map(row).collect::<Result<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..nx).map(row).collect::<Result<_>>()?;

        Ok((0..nq)
            .map(|k| Grid::from_fn(nx, nt, |i, j| rows[i][j * nq + k]))
            .collect())
    }
}
