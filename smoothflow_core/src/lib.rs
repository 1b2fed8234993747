// smoothflow_core/src/lib.rs

//! Space-time traffic state estimation from sparse, heterogeneous measurements.
//!
//! Measurements from any number of sources (loop detectors, floating cars,
//! cameras) are smoothed with a kernel that follows the characteristic
//! propagation speed of traffic, once under a free-flow hypothesis and once
//! under a congestion hypothesis. The two estimates are blended per output cell
//! by a regime weight derived from the estimated speed.
//!
//! The typical lifecycle is construct → ingest → filter → discard:
//!
//! ```
//! use smoothflow_core::prelude::*;
//!
//! let mut estimator = Estimator::new(FilterParams::default()).unwrap();
//! let detectors = estimator.create_source("detectors").unwrap();
//! let speed = estimator
//!     .add_stream(detectors, &QuantityId::speed(), 200.0, 30.0)
//!     .unwrap();
//! estimator.add_point_si(speed, 500.0, 60.0, 25.0).unwrap();
//!
//! let result = estimator
//!     .filter_si(&[500.0], &[60.0], &[QuantityId::speed()])
//!     .unwrap();
//! let grid = result.get_si(&QuantityId::speed()).unwrap();
//! assert!((grid[(0, 0)] - 25.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod error;
pub mod estimation;
pub mod kernel;
pub mod prelude;
pub mod quantity;
pub mod result;
pub mod source;
pub mod types;
