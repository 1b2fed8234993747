// smoothflow_core/src/config.rs

use crate::error::{require_positive, EstimationError, Result};
use crate::kernel::{ExpKernelShape, GaussKernelShape, KernelShape};
use serde::{Deserialize, Serialize};

const KMH: f64 = 1.0 / 3.6;

/// Which kernel shape new streams get when only σ and τ are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    #[default]
    Gaussian,
    Exponential,
}

impl KernelKind {
    pub fn build(self, sigma: f64, tau: f64) -> Result<Box<dyn KernelShape>> {
        let shape: Box<dyn KernelShape> = match self {
            KernelKind::Gaussian => Box::new(GaussKernelShape::new(sigma, tau)?),
            KernelKind::Exponential => Box::new(ExpKernelShape::new(sigma, tau)?),
        };
        Ok(shape)
    }
}

/// # FilterParams
/// Global traffic-flow properties of one estimator. All values are SI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilterParams {
    /// Characteristic speed in free flow [m/s], positive.
    pub c_free: f64,
    /// Characteristic (shock wave) speed in congestion [m/s], negative.
    pub c_cong: f64,
    /// Flip-over speed below which traffic counts as congested [m/s].
    pub v_crit: f64,
    /// Width of the transition between both regimes [m/s].
    pub delta_v: f64,
    /// Samples further than this from a cell in space are ignored [m].
    pub x_max: f64,
    /// Samples further than this from a cell in time are ignored [s].
    pub t_max: f64,
    /// Kernel weight below which a sample does not support a cell. Also bounds
    /// the buckets the fast filter visits.
    pub cutoff: f64,
    /// Shape used by [`crate::estimation::Estimator::add_stream`].
    pub kernel: KernelKind,
    /// Footprint of streams created implicitly by quantity-based ingestion.
    pub default_sigma: f64,
    pub default_tau: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            c_free: 80.0 * KMH,
            c_cong: -18.0 * KMH,
            v_crit: 80.0 * KMH,
            delta_v: 10.0 * KMH,
            x_max: f64::INFINITY,
            t_max: f64::INFINITY,
            cutoff: 1e-9,
            kernel: KernelKind::Gaussian,
            default_sigma: 300.0,
            default_tau: 30.0,
        }
    }
}

impl FilterParams {
    /// Builds parameters from the customary km/h values.
    pub fn from_kmh(c_cong: f64, c_free: f64, delta_v: f64, v_crit: f64) -> Self {
        Self {
            c_free: c_free * KMH,
            c_cong: c_cong * KMH,
            v_crit: v_crit * KMH,
            delta_v: delta_v * KMH,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, x_max: f64, t_max: f64) -> Self {
        self.x_max = x_max;
        self.t_max = t_max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("c_free", self.c_free)?;
        if self.c_cong.is_nan() || self.c_cong >= 0.0 {
            return Err(EstimationError::InvalidParameter {
                name: "c_cong",
                value: self.c_cong,
                reason: "must be negative",
            });
        }
        if !self.v_crit.is_finite() || self.v_crit < 0.0 {
            return Err(EstimationError::InvalidParameter {
                name: "v_crit",
                value: self.v_crit,
                reason: "must be finite and non-negative",
            });
        }
        require_positive("delta_v", self.delta_v)?;
        require_positive("x_max", self.x_max)?;
        require_positive("t_max", self.t_max)?;
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(EstimationError::InvalidParameter {
                name: "cutoff",
                value: self.cutoff,
                reason: "must lie in (0, 1)",
            });
        }
        require_positive("default_sigma", self.default_sigma)?;
        require_positive("default_tau", self.default_tau)?;
        Ok(())
    }
}
