// smoothflow_core/src/result.rs

use crate::error::{EstimationError, Result};
use crate::quantity::Converter;
use crate::types::{Grid, QuantityId};
use std::collections::BTreeMap;

/// Filtered fields of one filter call.
///
/// Owns its data outright, so it stays valid after further ingestion or after
/// the estimator is dropped. Each grid is indexed `[(location, time)]` in the
/// order of the requested output coordinates.
#[derive(Debug, Clone)]
pub struct FilterResult {
    locations: Vec<f64>,
    times: Vec<f64>,
    fields: BTreeMap<QuantityId, Field>,
}

#[derive(Debug, Clone)]
struct Field {
    si: Grid,
    converter: Box<dyn Converter>,
}

impl FilterResult {
    pub(crate) fn new(locations: Vec<f64>, times: Vec<f64>) -> Self {
        Self {
            locations,
            times,
            fields: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, quantity: QuantityId, si: Grid, converter: Box<dyn Converter>) {
        self.fields.insert(quantity, Field { si, converter });
    }

    /// Output locations [m], one per grid row.
    pub fn locations(&self) -> &[f64] {
        &self.locations
    }

    /// Output times [s], one per grid column.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn quantities(&self) -> impl Iterator<Item = &QuantityId> {
        self.fields.keys()
    }

    /// The field in the representation of the quantity's converter.
    pub fn get(&self, quantity: &QuantityId) -> Result<Grid> {
        self.fields
            .get(quantity)
            .map(|f| f.converter.convert(&f.si))
            .ok_or_else(|| EstimationError::UnknownQuantity(quantity.clone()))
    }

    /// The raw SI field.
    pub fn get_si(&self, quantity: &QuantityId) -> Option<&Grid> {
        self.fields.get(quantity).map(|f| &f.si)
    }

    /// Single SI value; `NaN` marks a cell without data support.
    pub fn value_si(&self, quantity: &QuantityId, location: usize, time: usize) -> Option<f64> {
        self.get_si(quantity)
            .and_then(|g| g.get((location, time)).copied())
    }
}
