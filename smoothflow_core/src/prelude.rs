// smoothflow_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::{CancellationToken, FilterObserver, FilterOptions, Regime};
pub use crate::kernel::KernelShape;
pub use crate::quantity::Converter;

// --- Core Data Structures ---
pub use crate::config::{FilterParams, KernelKind};
pub use crate::error::{EstimationError, Result};
pub use crate::estimation::{Estimator, Raster};
pub use crate::result::FilterResult;
pub use crate::types::{Grid, QuantityId, Sample, SourceHandle, StreamHandle};

// --- Concrete Implementations (Export common ones for convenience) ---
pub use crate::kernel::{ExpKernelShape, GaussKernelShape};
pub use crate::quantity::{FnConverter, Identity, Scale};
