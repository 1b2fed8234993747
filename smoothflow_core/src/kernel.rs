// smoothflow_core/src/kernel.rs

use crate::error::{require_positive, Result};
use dyn_clone::DynClone;
use std::fmt::Debug;

// --- KERNEL SHAPE TRAIT ---
// Weight of a measurement at offset (dx, dt) from an output cell, when traffic
// patterns are assumed to travel at characteristic speed `c`.
/// The spatiotemporal weighting function of one data stream.
///
/// `weight` is evaluated for every (cell, sample, regime) triple, so
/// implementations must be pure and allocation-free.
pub trait KernelShape: DynClone + Debug + Send + Sync {
    /// Weight in `[0, 1]` of a sample at spatial offset `dx` [m] and temporal
    /// offset `dt` [s], given the signed propagation speed `c` [m/s].
    fn weight(&self, c: f64, dx: f64, dt: f64) -> f64;

    /// Spatial kernel width σ [m].
    fn sigma(&self) -> f64;

    /// Temporal kernel width τ [s].
    fn tau(&self) -> f64;

    /// Half-widths `(x, s)` such that any offset with `|dx| > x` or
    /// `|dt - dx/c| > s` has a weight below `eps`, for every `c`.
    fn cutoff(&self, eps: f64) -> (f64, f64);

    /// Factor applied to every weight of the stream. Narrow kernels are
    /// trusted more near their own samples.
    fn reliability(&self) -> f64 {
        1.0 / (self.sigma() * self.tau())
    }
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn KernelShape>`.
dyn_clone::clone_trait_object!(KernelShape);

/// Time offset measured along the characteristic line through the cell.
#[inline(always)]
fn sheared(c: f64, dx: f64, dt: f64) -> f64 {
    dt - dx / c
}

/// Anisotropic Gaussian: `exp(-dx²/(2σ²) - (dt - dx/c)²/(2τ²))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussKernelShape {
    sigma: f64,
    tau: f64,
    // Precomputed 1/(2σ²) and 1/(2τ²).
    half_inv_sigma_sq: f64,
    half_inv_tau_sq: f64,
}

impl GaussKernelShape {
    pub fn new(sigma: f64, tau: f64) -> Result<Self> {
        require_positive("sigma", sigma)?;
        require_positive("tau", tau)?;
        Ok(Self {
            sigma,
            tau,
            half_inv_sigma_sq: 0.5 / (sigma * sigma),
            half_inv_tau_sq: 0.5 / (tau * tau),
        })
    }
}

impl KernelShape for GaussKernelShape {
    #[inline]
    fn weight(&self, c: f64, dx: f64, dt: f64) -> f64 {
        let s = sheared(c, dx, dt);
        (-dx * dx * self.half_inv_sigma_sq - s * s * self.half_inv_tau_sq).exp()
    }

    fn sigma(&self) -> f64 {
        self.sigma
    }

    fn tau(&self) -> f64 {
        self.tau
    }

    fn cutoff(&self, eps: f64) -> (f64, f64) {
        // Either exponent term alone exceeding -ln(eps) pushes the weight below eps.
        let r = (-2.0 * eps.ln()).sqrt();
        (self.sigma * r, self.tau * r)
    }
}

/// Exponential: `exp(-|dx|/σ - |dt - dx/c|/τ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpKernelShape {
    sigma: f64,
    tau: f64,
}

impl ExpKernelShape {
    pub fn new(sigma: f64, tau: f64) -> Result<Self> {
        require_positive("sigma", sigma)?;
        require_positive("tau", tau)?;
        Ok(Self { sigma, tau })
    }
}

impl KernelShape for ExpKernelShape {
    #[inline]
    fn weight(&self, c: f64, dx: f64, dt: f64) -> f64 {
        let s = sheared(c, dx, dt);
        (-dx.abs() / self.sigma - s.abs() / self.tau).exp()
    }

    fn sigma(&self) -> f64 {
        self.sigma
    }

    fn tau(&self) -> f64 {
        self.tau
    }

    fn cutoff(&self, eps: f64) -> (f64, f64) {
        let r = -eps.ln();
        (self.sigma * r, self.tau * r)
    }
}
