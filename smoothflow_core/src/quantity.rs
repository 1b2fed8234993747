// smoothflow_core/src/quantity.rs

//! Quantities the estimator can produce and how their SI grids are presented.

use crate::error::{EstimationError, Result};
use crate::types::{Grid, QuantityId};
use dyn_clone::DynClone;
use std::fmt::{self, Debug};
use std::sync::Arc;

// --- CONVERTER TRAIT ---
/// Turns a filtered SI grid into the representation a consumer wants.
pub trait Converter: DynClone + Debug + Send + Sync {
    fn convert(&self, si: &Grid) -> Grid;
}

dyn_clone::clone_trait_object!(Converter);

/// Returns SI values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Converter for Identity {
    fn convert(&self, si: &Grid) -> Grid {
        si.clone()
    }
}

/// Multiplies every cell by a constant, e.g. `3.6` for m/s → km/h.
#[derive(Debug, Clone, Copy)]
pub struct Scale(pub f64);

impl Scale {
    pub const MPS_TO_KMH: Scale = Scale(3.6);
    pub const PER_SECOND_TO_PER_HOUR: Scale = Scale(3600.0);
    pub const PER_METER_TO_PER_KM: Scale = Scale(1000.0);
}

impl Converter for Scale {
    fn convert(&self, si: &Grid) -> Grid {
        si * self.0
    }
}

/// Wraps an arbitrary conversion function.
#[derive(Clone)]
pub struct FnConverter(Arc<dyn Fn(&Grid) -> Grid + Send + Sync>);

impl FnConverter {
    pub fn new(f: impl Fn(&Grid) -> Grid + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnConverter(..)")
    }
}

impl Converter for FnConverter {
    fn convert(&self, si: &Grid) -> Grid {
        (self.0)(si)
    }
}

/// A registered quantity: an id plus its output conversion.
#[derive(Debug, Clone)]
pub struct Quantity {
    pub id: QuantityId,
    pub is_reference: bool,
    pub converter: Box<dyn Converter>,
}

/// All quantities known to one estimator. At most one is the reference
/// quantity whose regime estimates decide the blend at each cell.
#[derive(Debug, Clone, Default)]
pub struct QuantityRegistry {
    quantities: Vec<Quantity>,
    reference: Option<usize>,
}

impl QuantityRegistry {
    /// Registry holding speed (reference), flow and density with identity converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        // Fresh registry: none of these can collide.
        let defaults = [
            (QuantityId::speed(), true),
            (QuantityId::flow(), false),
            (QuantityId::density(), false),
        ];
        for (id, is_reference) in defaults {
            registry.quantities.push(Quantity {
                id,
                is_reference,
                converter: Box::new(Identity),
            });
        }
        registry.reference = Some(0);
        registry
    }

    pub fn register(
        &mut self,
        id: QuantityId,
        converter: Box<dyn Converter>,
        is_reference: bool,
    ) -> Result<()> {
        if self.get(&id).is_some() {
            return Err(EstimationError::DuplicateQuantityId(id));
        }
        if is_reference {
            if let Some(existing) = self.reference() {
                return Err(EstimationError::DuplicateReference {
                    existing: existing.id.clone(),
                    requested: id,
                });
            }
            self.reference = Some(self.quantities.len());
        }
        self.quantities.push(Quantity {
            id,
            is_reference,
            converter,
        });
        Ok(())
    }

    /// Replaces the output conversion of an already registered quantity.
    pub fn set_converter(&mut self, id: &QuantityId, converter: Box<dyn Converter>) -> Result<()> {
        let quantity = self
            .quantities
            .iter_mut()
            .find(|q| &q.id == id)
            .ok_or_else(|| EstimationError::UnknownQuantity(id.clone()))?;
        quantity.converter = converter;
        Ok(())
    }

    pub fn get(&self, id: &QuantityId) -> Option<&Quantity> {
        self.quantities.iter().find(|q| &q.id == id)
    }

    pub fn reference(&self) -> Option<&Quantity> {
        self.reference.map(|i| &self.quantities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quantity> {
        self.quantities.iter()
    }
}
