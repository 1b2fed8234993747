// smoothflow_sim/src/report.rs

use crate::scenario::FilterMode;
use smoothflow_core::prelude::{Grid, QuantityId};
use std::fmt;
use std::time::Duration;

/// Error of one filtered quantity against the ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityReport {
    pub quantity: QuantityId,
    /// Root mean square error over the cells with an estimate.
    pub rmse: f64,
    pub max_abs_error: f64,
    /// Cells left without data support (`NaN`).
    pub missing: usize,
}

impl QuantityReport {
    pub fn compare(quantity: QuantityId, estimate: &Grid, truth: &Grid) -> Self {
        let mut sum_sq = 0.0;
        let mut max_abs_error: f64 = 0.0;
        let mut count = 0usize;
        let mut missing = 0usize;
        for (e, t) in estimate.iter().zip(truth.iter()) {
            if e.is_nan() {
                missing += 1;
                continue;
            }
            let err = e - t;
            sum_sq += err * err;
            max_abs_error = max_abs_error.max(err.abs());
            count += 1;
        }
        let rmse = if count > 0 {
            (sum_sq / count as f64).sqrt()
        } else {
            f64::NAN
        };
        Self {
            quantity,
            rmse,
            max_abs_error,
            missing,
        }
    }
}

/// Outcome of one scenario run.
#[derive(Debug, Clone)]
pub struct Report {
    pub scenario: String,
    pub mode: FilterMode,
    pub cells: usize,
    pub elapsed: Duration,
    pub quantities: Vec<QuantityReport>,
}

impl Report {
    pub fn get(&self, quantity: &QuantityId) -> Option<&QuantityReport> {
        self.quantities.iter().find(|q| &q.quantity == quantity)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scenario '{}' ({} filter, {} cells, {:.2?})",
            self.scenario, self.mode, self.cells, self.elapsed
        )?;
        writeln!(
            f,
            "  {:<10} {:>12} {:>12} {:>8}",
            "quantity", "rmse", "max |err|", "missing"
        )?;
        for q in &self.quantities {
            writeln!(
                f,
                "  {:<10} {:>12.4} {:>12.4} {:>8}",
                q.quantity.as_str(),
                q.rmse,
                q.max_abs_error,
                q.missing
            )?;
        }
        Ok(())
    }
}
