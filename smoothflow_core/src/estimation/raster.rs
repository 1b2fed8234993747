// smoothflow_core/src/estimation/raster.rs

//! Regular output rasters and the bucket index the fast filter uses to skip
//! samples outside a cell's kernel footprint.

use super::accumulate::{Cell, SampleLookup};
use crate::config::FilterParams;
use crate::error::{EstimationError, Result};
use crate::source::DataStream;
use crate::types::Sample;
use serde::{Deserialize, Serialize};

/// An equidistant output grid, `x = x_start + i·dx` up to `x_end` and
/// `t = t_start + j·dt` up to `t_end` (both ends inclusive when they fall on
/// the step).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Raster {
    pub x_start: f64,
    pub dx: f64,
    pub x_end: f64,
    pub t_start: f64,
    pub dt: f64,
    pub t_end: f64,
}

impl Raster {
    pub fn new(x_start: f64, dx: f64, x_end: f64, t_start: f64, dt: f64, t_end: f64) -> Result<Self> {
        let raster = Self {
            x_start,
            dx,
            x_end,
            t_start,
            dt,
            t_end,
        };
        raster.validate()?;
        Ok(raster)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.x_start, self.dx, self.x_end, self.t_start, self.dt, self.t_end];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::InvalidGrid("raster bounds must be finite"));
        }
        if self.dx <= 0.0 || self.dt <= 0.0 {
            return Err(EstimationError::InvalidGrid("raster steps must be positive"));
        }
        if self.x_end < self.x_start || self.t_end < self.t_start {
            return Err(EstimationError::InvalidGrid("raster ends must not precede starts"));
        }
        Ok(())
    }

    pub fn nx(&self) -> usize {
        steps(self.x_start, self.dx, self.x_end)
    }

    pub fn nt(&self) -> usize {
        steps(self.t_start, self.dt, self.t_end)
    }

    pub fn locations(&self) -> Vec<f64> {
        (0..self.nx()).map(|i| self.x_start + i as f64 * self.dx).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        (0..self.nt()).map(|j| self.t_start + j as f64 * self.dt).collect()
    }
}

fn steps(start: f64, step: f64, end: f64) -> usize {
    // Tolerate rounding so that e.g. 0..=2000 by 500 yields 5 values.
    1 + ((end - start) / step + 1e-9).floor() as usize
}

// --- Bucket index ---

/// Samples of one stream sorted into raster-sized buckets, rows of `nj`
/// buckets stored contiguously.
#[derive(Debug)]
struct StreamBuckets {
    i0: i64,
    j0: i64,
    ni: i64,
    nj: i64,
    /// Bucket reach around a cell beyond which every weight is below the cutoff.
    reach_i: i64,
    reach_j: i64,
    /// `offsets[b]..offsets[b + 1]` are the samples of bucket `b`.
    offsets: Vec<usize>,
    samples: Vec<Sample>,
}

/// Candidate lookup for the fast filter. Only buckets within the kernel
/// cutoff of a cell are visited; every skipped sample weighs less than
/// `FilterParams::cutoff` in both regimes and so adds nothing to the cell.
#[derive(Debug)]
pub(crate) struct RasterIndex {
    streams: Vec<Option<StreamBuckets>>,
}

impl RasterIndex {
    /// Indexes the streams listed in `used`; others stay empty.
    pub(crate) fn build(
        raster: &Raster,
        params: &FilterParams,
        streams: &[DataStream],
        used: &[usize],
    ) -> Self {
        let mut index = Self {
            streams: (0..streams.len()).map(|_| None).collect(),
        };
        for &s in used {
            if index.streams[s].is_none() {
                index.streams[s] = Some(StreamBuckets::build(raster, params, &streams[s]));
            }
        }
        index
    }
}

impl StreamBuckets {
    fn build(raster: &Raster, params: &FilterParams, stream: &DataStream) -> Self {
        let (cut_x, cut_s) = stream.shape().cutoff(params.cutoff);
        let reach_x = cut_x.min(params.x_max);
        let c_min = params.c_free.min(-params.c_cong);
        let reach_t = (cut_s + reach_x / c_min).min(params.t_max);
        // A sample within `reach` of a cell lies at most `ceil(reach / step)`
        // buckets away. The casts saturate for unbounded reaches.
        let reach_i = (reach_x / raster.dx).ceil() as i64;
        let reach_j = (reach_t / raster.dt).ceil() as i64;

        let bucket = |s: &Sample| -> (i64, i64) {
            (
                ((s.x - raster.x_start) / raster.dx).floor() as i64,
                ((s.t - raster.t_start) / raster.dt).floor() as i64,
            )
        };

        // Buckets that can reach any raster cell, clipped to where samples are.
        let (nx, nt) = (raster.nx() as i64, raster.nt() as i64);
        let mut lo = (reach_i.saturating_neg(), reach_j.saturating_neg());
        let mut hi = (
            (nx - 1).saturating_add(reach_i),
            (nt - 1).saturating_add(reach_j),
        );
        let (mut min_b, mut max_b) = ((i64::MAX, i64::MAX), (i64::MIN, i64::MIN));
        for s in stream.samples() {
            let (bi, bj) = bucket(s);
            min_b = (min_b.0.min(bi), min_b.1.min(bj));
            max_b = (max_b.0.max(bi), max_b.1.max(bj));
        }
        lo = (lo.0.max(min_b.0), lo.1.max(min_b.1));
        hi = (hi.0.min(max_b.0), hi.1.min(max_b.1));

        let (ni, nj) = if hi.0 < lo.0 || hi.1 < lo.1 {
            (0, 0)
        } else {
            (hi.0 - lo.0 + 1, hi.1 - lo.1 + 1)
        };
        let slot = |(bi, bj): (i64, i64)| -> Option<usize> {
            let inside = bi >= lo.0 && bi <= hi.0 && bj >= lo.1 && bj <= hi.1;
            inside.then(|| ((bi - lo.0) * nj + (bj - lo.1)) as usize)
        };

        // Counting sort into row-major buckets.
        let n_buckets = (ni * nj) as usize;
        let mut offsets = vec![0usize; n_buckets + 1];
        for s in stream.samples() {
            if let Some(b) = slot(bucket(s)) {
                offsets[b + 1] += 1;
            }
        }
        for b in 0..n_buckets {
            offsets[b + 1] += offsets[b];
        }
        let mut cursor = offsets.clone();
        let mut samples = vec![Sample::new(0.0, 0.0, 0.0); offsets[n_buckets]];
        for s in stream.samples() {
            if let Some(b) = slot(bucket(s)) {
                samples[cursor[b]] = *s;
                cursor[b] += 1;
            }
        }

        Self {
            i0: lo.0,
            j0: lo.1,
            ni,
            nj,
            reach_i,
            reach_j,
            offsets,
            samples,
        }
    }

    fn visit<F: FnMut(&Sample)>(&self, cell: Cell, mut visit: F) {
        if self.ni == 0 || self.nj == 0 {
            return;
        }
        let (ci, cj) = (cell.i as i64, cell.j as i64);
        let i_lo = ci.saturating_sub(self.reach_i).max(self.i0);
        let i_hi = ci.saturating_add(self.reach_i).min(self.i0 + self.ni - 1);
        let j_lo = cj.saturating_sub(self.reach_j).max(self.j0);
        let j_hi = cj.saturating_add(self.reach_j).min(self.j0 + self.nj - 1);
        if i_lo > i_hi || j_lo > j_hi {
            return;
        }
        for bi in i_lo..=i_hi {
            let row = (bi - self.i0) * self.nj;
            let first = (row + j_lo - self.j0) as usize;
            let last = (row + j_hi - self.j0) as usize;
            self.samples[self.offsets[first]..self.offsets[last + 1]]
                .iter()
                .for_each(&mut visit);
        }
    }
}

impl SampleLookup for RasterIndex {
    fn for_each_candidate<F: FnMut(&Sample)>(&self, stream: usize, cell: Cell, visit: F) {
        if let Some(buckets) = &self.streams[stream] {
            buckets.visit(cell, visit);
        }
    }
}
