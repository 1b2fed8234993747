// smoothflow_core/src/estimation/mod.rs

//! The estimator: source and stream registry, ingestion, and both filters.

mod accumulate;
mod blend;
mod control;
mod raster;

pub use blend::Regime;
pub use control::{CancellationToken, FilterObserver, FilterOptions};
pub use raster::Raster;

use self::accumulate::{CellEvaluator, ExactLookup, Requested};
use self::blend::RegimeBlend;
use self::raster::RasterIndex;
use crate::config::FilterParams;
use crate::error::{require_finite, EstimationError, Result};
use crate::kernel::KernelShape;
use crate::quantity::{Converter, QuantityRegistry};
use crate::result::FilterResult;
use crate::source::{DataSource, DataStream};
use crate::types::{Grid, QuantityId, SourceHandle, StreamHandle};
use tracing::{debug, warn};

/// Name of the source fed by quantity-based ingestion.
pub const DEFAULT_SOURCE: &str = "default";

/// # Estimator
/// Owns every source, stream and sample of one estimation task.
///
/// Ingestion needs `&mut self` and filtering `&self`, so a filter never sees
/// a stream change under it. Share an estimator across threads behind a
/// `RwLock`.
#[derive(Debug, Clone)]
pub struct Estimator {
    params: FilterParams,
    quantities: QuantityRegistry,
    sources: Vec<DataSource>,
    streams: Vec<DataStream>,
    /// Set once quantity-based ingestion created the default source.
    implicit: Option<SourceHandle>,
}

impl Estimator {
    /// Estimator with the built-in quantities: speed (reference), flow and density.
    pub fn new(params: FilterParams) -> Result<Self> {
        Self::with_registry(params, QuantityRegistry::with_defaults())
    }

    pub fn with_registry(params: FilterParams, quantities: QuantityRegistry) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            quantities,
            sources: Vec::new(),
            streams: Vec::new(),
            implicit: None,
        })
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn quantities(&self) -> &QuantityRegistry {
        &self.quantities
    }

    pub fn register_quantity(
        &mut self,
        id: QuantityId,
        converter: Box<dyn Converter>,
        is_reference: bool,
    ) -> Result<()> {
        self.quantities.register(id, converter, is_reference)
    }

    pub fn set_converter(&mut self, id: &QuantityId, converter: Box<dyn Converter>) -> Result<()> {
        self.quantities.set_converter(id, converter)
    }

    // --- Sources and streams ---

    pub fn create_source(&mut self, name: &str) -> Result<SourceHandle> {
        if self.implicit.is_some() {
            return Err(EstimationError::MixedIngestion(
                "cannot create sources after quantity-based ingestion",
            ));
        }
        self.insert_source(name)
    }

    fn insert_source(&mut self, name: &str) -> Result<SourceHandle> {
        if self.source_by_name(name).is_some() {
            return Err(EstimationError::DuplicateSource(name.to_owned()));
        }
        self.sources.push(DataSource::new(name));
        Ok(SourceHandle(self.sources.len() - 1))
    }

    pub fn source(&self, handle: SourceHandle) -> Result<&DataSource> {
        self.sources
            .get(handle.0)
            .ok_or(EstimationError::UnknownSource(handle.0))
    }

    pub fn source_by_name(&self, name: &str) -> Option<SourceHandle> {
        self.sources
            .iter()
            .position(|s| s.name() == name)
            .map(SourceHandle)
    }

    /// Adds a stream of `quantity` to `source`, with the configured kernel kind.
    pub fn add_stream(
        &mut self,
        source: SourceHandle,
        quantity: &QuantityId,
        sigma: f64,
        tau: f64,
    ) -> Result<StreamHandle> {
        let shape = self.params.kernel.build(sigma, tau)?;
        self.add_stream_with_shape(source, quantity, shape)
    }

    pub fn add_stream_with_shape(
        &mut self,
        source: SourceHandle,
        quantity: &QuantityId,
        shape: Box<dyn KernelShape>,
    ) -> Result<StreamHandle> {
        if source.0 >= self.sources.len() {
            return Err(EstimationError::UnknownSource(source.0));
        }
        if self.quantities.get(quantity).is_none() {
            return Err(EstimationError::UnknownQuantity(quantity.clone()));
        }
        let handle = StreamHandle(self.streams.len());
        self.sources[source.0].claim(quantity, handle)?;
        debug!(
            source = self.sources[source.0].name(),
            %quantity,
            sigma = shape.sigma(),
            tau = shape.tau(),
            "Added stream"
        );
        self.streams
            .push(DataStream::new(source, quantity.clone(), shape));
        Ok(handle)
    }

    pub fn stream(&self, handle: StreamHandle) -> Result<&DataStream> {
        self.streams
            .get(handle.0)
            .ok_or(EstimationError::UnknownStream(handle.0))
    }

    fn stream_mut(&mut self, handle: StreamHandle) -> Result<&mut DataStream> {
        self.streams
            .get_mut(handle.0)
            .ok_or(EstimationError::UnknownStream(handle.0))
    }

    // --- Ingestion (SI) ---
    // Each call returns the number of stored samples; NaN values are skipped.

    pub fn add_point_si(&mut self, stream: StreamHandle, x: f64, t: f64, v: f64) -> Result<usize> {
        self.stream_mut(stream)?.push_point(x, t, v)
    }

    pub fn add_vector_si(
        &mut self,
        stream: StreamHandle,
        xs: &[f64],
        ts: &[f64],
        vs: &[f64],
    ) -> Result<usize> {
        self.stream_mut(stream)?.extend_vector(xs, ts, vs)
    }

    /// `grid[(i, j)]` is the value at `(xs[i], ts[j])`.
    pub fn add_grid_si(
        &mut self,
        stream: StreamHandle,
        xs: &[f64],
        ts: &[f64],
        grid: &Grid,
    ) -> Result<usize> {
        self.stream_mut(stream)?.extend_grid(xs, ts, grid)
    }

    // --- Ingestion by quantity ---
    // Feeds one implicit source, one stream per quantity, with the default
    // footprint. Cannot be mixed with explicitly created sources.

    pub fn add_point_by_quantity(&mut self, quantity: &QuantityId, x: f64, t: f64, v: f64) -> Result<usize> {
        let stream = self.implicit_stream(quantity)?;
        self.add_point_si(stream, x, t, v)
    }

    pub fn add_vector_by_quantity(
        &mut self,
        quantity: &QuantityId,
        xs: &[f64],
        ts: &[f64],
        vs: &[f64],
    ) -> Result<usize> {
        let stream = self.implicit_stream(quantity)?;
        self.add_vector_si(stream, xs, ts, vs)
    }

    pub fn add_grid_by_quantity(
        &mut self,
        quantity: &QuantityId,
        xs: &[f64],
        ts: &[f64],
        grid: &Grid,
    ) -> Result<usize> {
        let stream = self.implicit_stream(quantity)?;
        self.add_grid_si(stream, xs, ts, grid)
    }

    fn implicit_stream(&mut self, quantity: &QuantityId) -> Result<StreamHandle> {
        let source = match self.implicit {
            Some(source) => source,
            None if self.sources.is_empty() => {
                let source = self.insert_source(DEFAULT_SOURCE)?;
                self.implicit = Some(source);
                source
            }
            None => {
                return Err(EstimationError::MixedIngestion(
                    "quantity-based ingestion after sources were created",
                ))
            }
        };
        match self.sources[source.0].stream(quantity) {
            Some(stream) => Ok(stream),
            None => {
                let (sigma, tau) = (self.params.default_sigma, self.params.default_tau);
                self.add_stream(source, quantity, sigma, tau)
            }
        }
    }

    /// Drops every sample measured before `time` from all streams. Returns the
    /// number of dropped samples.
    pub fn clear_data_before(&mut self, time: f64) -> usize {
        let dropped: usize = self.streams.iter_mut().map(|s| s.clear_before(time)).sum();
        debug!(time, dropped, "Cleared old samples");
        dropped
    }

    // --- Filtering ---

    /// Exact filter at every `(xs[i], ts[j])`.
    pub fn filter_si(&self, xs: &[f64], ts: &[f64], quantities: &[QuantityId]) -> Result<FilterResult> {
        self.filter_si_with(xs, ts, quantities, &FilterOptions::default())
    }

    pub fn filter_si_with(
        &self,
        xs: &[f64],
        ts: &[f64],
        quantities: &[QuantityId],
        options: &FilterOptions<'_>,
    ) -> Result<FilterResult> {
        xs.iter().try_for_each(|&x| require_finite("location", x))?;
        ts.iter().try_for_each(|&t| require_finite("time", t))?;
        let evaluator = self.plan(quantities)?;
        debug!(
            locations = xs.len(),
            times = ts.len(),
            quantities = evaluator.requested.len(),
            "Running exact filter"
        );
        let lookup = ExactLookup {
            streams: &self.streams,
        };
        let grids = evaluator.run(&lookup, xs, ts, options)?;
        Ok(Self::collect(xs.to_vec(), ts.to_vec(), evaluator, grids))
    }

    /// Fast filter over a regular raster. Only samples within the kernel cutoff
    /// of a cell are looked at. Both filters ignore weights below
    /// `FilterParams::cutoff`, so the values agree with [`Self::filter_si`] up
    /// to rounding.
    #[allow(clippy::too_many_arguments)]
    pub fn filter_fast_si(
        &self,
        x_start: f64,
        dx: f64,
        x_end: f64,
        t_start: f64,
        dt: f64,
        t_end: f64,
        quantities: &[QuantityId],
    ) -> Result<FilterResult> {
        let raster = Raster::new(x_start, dx, x_end, t_start, dt, t_end)?;
        self.filter_raster(&raster, quantities, &FilterOptions::default())
    }

    pub fn filter_raster(
        &self,
        raster: &Raster,
        quantities: &[QuantityId],
        options: &FilterOptions<'_>,
    ) -> Result<FilterResult> {
        raster.validate()?;
        let evaluator = self.plan(quantities)?;
        let (xs, ts) = (raster.locations(), raster.times());
        debug!(
            locations = xs.len(),
            times = ts.len(),
            quantities = evaluator.requested.len(),
            cutoff = self.params.cutoff,
            "Running fast filter"
        );

        let mut used: Vec<usize> = evaluator.reference.clone().unwrap_or_default();
        for requested in &evaluator.requested {
            used.extend_from_slice(&requested.streams);
        }
        let index = RasterIndex::build(raster, &self.params, &self.streams, &used);

        let grids = evaluator.run(&index, &xs, &ts, options)?;
        Ok(Self::collect(xs, ts, evaluator, grids))
    }

    /// Resolves the requested quantities to their streams.
    fn plan(&self, quantities: &[QuantityId]) -> Result<CellEvaluator<'_>> {
        let mut requested: Vec<Requested> = Vec::with_capacity(quantities.len());
        for id in quantities {
            if requested.iter().any(|r| &r.id == id) {
                continue;
            }
            let quantity = self
                .quantities
                .get(id)
                .ok_or_else(|| EstimationError::UnknownQuantity(id.clone()))?;
            let streams = self.streams_of(id);
            if streams.is_empty() {
                return Err(EstimationError::UnknownQuantity(id.clone()));
            }
            requested.push(Requested {
                id: id.clone(),
                streams,
                is_reference: quantity.is_reference,
                converter: quantity.converter.clone(),
            });
        }

        let reference = match self.quantities.reference() {
            Some(q) => Some(self.streams_of(&q.id)).filter(|s| !s.is_empty()),
            None => None,
        };
        if reference.is_none() {
            warn!("No reference quantity stream; treating all cells as free flow");
        }

        Ok(CellEvaluator {
            streams: &self.streams,
            params: self.params,
            blend: RegimeBlend::new(&self.params),
            reference,
            requested,
        })
    }

    fn streams_of(&self, quantity: &QuantityId) -> Vec<usize> {
        self.streams
            .iter()
            .enumerate()
            .filter(|(_, s)| s.quantity() == quantity)
            .map(|(i, _)| i)
            .collect()
    }

    fn collect(
        xs: Vec<f64>,
        ts: Vec<f64>,
        evaluator: CellEvaluator<'_>,
        grids: Vec<Grid>,
    ) -> FilterResult {
        let mut result = FilterResult::new(xs, ts);
        for (requested, grid) in evaluator.requested.into_iter().zip(grids) {
            result.insert(requested.id, grid, requested.converter);
        }
        result
    }
}
