// smoothflow_core/src/estimation/blend.rs

use crate::config::FilterParams;

/// The two smoothing hypotheses evaluated at every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    FreeFlow,
    Congestion,
}

impl Regime {
    /// Signed characteristic speed [m/s] the kernel is sheared along.
    pub fn characteristic_speed(self, params: &FilterParams) -> f64 {
        match self {
            Regime::FreeFlow => params.c_free,
            Regime::Congestion => params.c_cong,
        }
    }
}

/// Per-cell regime decision.
///
/// `β = ½(1 - tanh((v_crit - u) / Δv))` with `u` the lower of the two speed
/// estimates. β → 1 well above `v_crit` (free flow) and → 0 well below it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegimeBlend {
    v_crit: f64,
    delta_v: f64,
}

impl RegimeBlend {
    pub(crate) fn new(params: &FilterParams) -> Self {
        Self {
            v_crit: params.v_crit,
            delta_v: params.delta_v,
        }
    }

    /// Weight β of the free-flow estimate. `NaN` when neither speed regime has
    /// support at the cell.
    pub(crate) fn free_weight(&self, v_free: f64, v_cong: f64) -> f64 {
        // f64::min returns the other operand when one is NaN.
        let u = v_free.min(v_cong);
        0.5 * (1.0 - ((self.v_crit - u) / self.delta_v).tanh())
    }

    /// `β·free + (1-β)·cong`. A regime without support yields to the other
    /// one; an undefined β or two unsupported regimes give `NaN`.
    pub(crate) fn combine(beta: f64, free: f64, cong: f64) -> f64 {
        if beta.is_nan() {
            return f64::NAN;
        }
        match (free.is_nan(), cong.is_nan()) {
            (false, false) => beta * free + (1.0 - beta) * cong,
            (false, true) => free,
            (true, false) => cong,
            (true, true) => f64::NAN,
        }
    }
}
