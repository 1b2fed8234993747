// smoothflow_core/src/types.rs

use nalgebra::DMatrix;
use std::fmt;
use std::sync::Arc;

// --- Core Type Aliases ---
/// A space-time field indexed `[(location index, time index)]`, SI units.
pub type Grid = DMatrix<f64>;

// --- Core Identifiers ---

/// Name of a physical quantity, e.g. `"speed"` or `"flow"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantityId(Arc<str>);

impl QuantityId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Speed in m/s. Registered as the reference quantity by [`crate::estimation::Estimator::new`].
    pub fn speed() -> Self {
        Self::new("speed")
    }

    /// Flow in veh/s.
    pub fn flow() -> Self {
        Self::new("flow")
    }

    /// Density in veh/m.
    pub fn density() -> Self {
        Self::new("density")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuantityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuantityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Handle of a data source owned by an [`crate::estimation::Estimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHandle(pub(crate) usize);

/// Handle of a data stream owned by an [`crate::estimation::Estimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(pub(crate) usize);

/// One measurement in SI units: location [m], time [s], value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub t: f64,
    pub v: f64,
}

impl Sample {
    pub fn new(x: f64, t: f64, v: f64) -> Self {
        Self { x, t, v }
    }
}
