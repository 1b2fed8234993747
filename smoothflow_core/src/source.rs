// smoothflow_core/src/source.rs

//! Data sources, their per-quantity streams, and the append-only sample store
//! behind each stream.

use crate::error::{require_finite, require_same_len, EstimationError, Result};
use crate::kernel::KernelShape;
use crate::types::{Grid, QuantityId, Sample, SourceHandle, StreamHandle};
use std::collections::BTreeMap;

/// A named origin of measurements, such as "loop detectors" or "floating cars".
/// It supplies at most one stream per quantity.
#[derive(Debug, Clone)]
pub struct DataSource {
    name: String,
    streams: BTreeMap<QuantityId, StreamHandle>,
}

impl DataSource {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            streams: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream(&self, quantity: &QuantityId) -> Option<StreamHandle> {
        self.streams.get(quantity).copied()
    }

    pub fn streams(&self) -> impl Iterator<Item = (&QuantityId, StreamHandle)> {
        self.streams.iter().map(|(q, h)| (q, *h))
    }

    /// Claims `quantity` for `handle`; a quantity can be claimed once.
    pub(crate) fn claim(&mut self, quantity: &QuantityId, handle: StreamHandle) -> Result<()> {
        if self.streams.contains_key(quantity) {
            return Err(EstimationError::DuplicateQuantity {
                source_name: self.name.clone(),
                quantity: quantity.clone(),
            });
        }
        self.streams.insert(quantity.clone(), handle);
        Ok(())
    }
}

/// One source supplying one quantity, with the kernel footprint that encodes
/// how far its measurements are trusted.
#[derive(Debug, Clone)]
pub struct DataStream {
    source: SourceHandle,
    quantity: QuantityId,
    shape: Box<dyn KernelShape>,
    samples: Vec<Sample>,
}

impl DataStream {
    pub(crate) fn new(source: SourceHandle, quantity: QuantityId, shape: Box<dyn KernelShape>) -> Self {
        Self {
            source,
            quantity,
            shape,
            samples: Vec::new(),
        }
    }

    pub fn source(&self) -> SourceHandle {
        self.source
    }

    pub fn quantity(&self) -> &QuantityId {
        &self.quantity
    }

    pub fn shape(&self) -> &dyn KernelShape {
        self.shape.as_ref()
    }

    pub fn sigma(&self) -> f64 {
        self.shape.sigma()
    }

    pub fn tau(&self) -> f64 {
        self.shape.tau()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    // --- Ingestion ---
    // Every call validates its whole input before appending anything. NaN
    // values mark missing measurements and are not stored; infinite values
    // are rejected.

    pub(crate) fn push_point(&mut self, x: f64, t: f64, v: f64) -> Result<usize> {
        require_finite("location", x)?;
        require_finite("time", t)?;
        if v.is_nan() {
            return Ok(0);
        }
        require_finite("value", v)?;
        self.samples.push(Sample::new(x, t, v));
        Ok(1)
    }

    pub(crate) fn extend_vector(&mut self, xs: &[f64], ts: &[f64], vs: &[f64]) -> Result<usize> {
        require_same_len("locations", xs.len(), "times", ts.len())?;
        require_same_len("times", ts.len(), "values", vs.len())?;
        check_axis("location", xs)?;
        check_axis("time", ts)?;
        check_values(vs)?;

        let before = self.samples.len();
        self.samples.extend(
            xs.iter()
                .zip(ts)
                .zip(vs)
                .filter(|(_, v)| !v.is_nan())
                .map(|((&x, &t), &v)| Sample::new(x, t, v)),
        );
        Ok(self.samples.len() - before)
    }

    /// Appends one sample per raster cell; `grid[(i, j)]` is measured at
    /// `(xs[i], ts[j])`.
    pub(crate) fn extend_grid(&mut self, xs: &[f64], ts: &[f64], grid: &Grid) -> Result<usize> {
        require_same_len("grid rows", grid.nrows(), "locations", xs.len())?;
        require_same_len("grid columns", grid.ncols(), "times", ts.len())?;
        check_axis("location", xs)?;
        check_axis("time", ts)?;
        check_values(grid.as_slice())?;

        let before = self.samples.len();
        self.samples.reserve(xs.len() * ts.len());
        for (i, &x) in xs.iter().enumerate() {
            for (j, &t) in ts.iter().enumerate() {
                let v = grid[(i, j)];
                if !v.is_nan() {
                    self.samples.push(Sample::new(x, t, v));
                }
            }
        }
        Ok(self.samples.len() - before)
    }

    /// Drops every sample measured before `time`; returns how many were dropped.
    pub(crate) fn clear_before(&mut self, time: f64) -> usize {
        let before = self.samples.len();
        self.samples.retain(|s| s.t >= time);
        before - self.samples.len()
    }
}

fn check_axis(name: &'static str, values: &[f64]) -> Result<()> {
    values.iter().try_for_each(|&v| require_finite(name, v))
}

/// Values may be NaN (missing) but never infinite.
fn check_values(values: &[f64]) -> Result<()> {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .try_for_each(|&v| require_finite("value", v))
}
