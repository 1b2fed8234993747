// smoothflow_core/src/error.rs

use crate::types::QuantityId;
use thiserror::Error;

/// Every failure the estimator reports. All of them are raised synchronously
/// by the offending call; nothing is appended or computed when one occurs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("quantity '{quantity}' already has a stream on source '{source_name}'")]
    DuplicateQuantity {
        source_name: String,
        quantity: QuantityId,
    },

    #[error("cannot register '{requested}' as reference quantity, '{existing}' already is")]
    DuplicateReference {
        existing: QuantityId,
        requested: QuantityId,
    },

    #[error("quantity '{0}' is already registered")]
    DuplicateQuantityId(QuantityId),

    #[error("a data source named '{0}' already exists")]
    DuplicateSource(String),

    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("array length mismatch: {first} has {first_len} elements, {second} has {second_len}")]
    ArrayLengthMismatch {
        first: &'static str,
        first_len: usize,
        second: &'static str,
        second_len: usize,
    },

    #[error("no stream provides quantity '{0}'")]
    UnknownQuantity(QuantityId),

    #[error("unknown data source handle {0}")]
    UnknownSource(usize),

    #[error("unknown data stream handle {0}")]
    UnknownStream(usize),

    #[error("ill-defined output grid: {0}")]
    InvalidGrid(&'static str),

    #[error("data added by quantity and by explicit source cannot be mixed: {0}")]
    MixedIngestion(&'static str),

    #[error("filtering was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EstimationError>;

/// Rejects non-positive and NaN values.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(EstimationError::InvalidParameter {
            name,
            value,
            reason: "must be positive",
        })
    }
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EstimationError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

pub(crate) fn require_same_len(
    first: &'static str,
    first_len: usize,
    second: &'static str,
    second_len: usize,
) -> Result<()> {
    if first_len == second_len {
        Ok(())
    } else {
        Err(EstimationError::ArrayLengthMismatch {
            first,
            first_len,
            second,
            second_len,
        })
    }
}
