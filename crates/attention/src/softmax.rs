//! Numerically stable row-wise softmax over rank-2 tensors.
//!
//! Each row has its maximum subtracted before exponentiation, which bounds
//! every exponential by `1.0` and leaves the normalized result unchanged.
//! The exponentials, row sums and division run in `f64` so long rows still
//! sum to one within `1e-6` once cast back to the input dtype.

use candle_core::{DType, Tensor, D};

use crate::core::AttentionError;

/// Normalize every row of `x` (shape `[rows, cols]`, both non-zero) into a
/// probability distribution.
///
/// Non-finite entries are not guarded and propagate into their row.
pub fn stable_softmax_rows(x: &Tensor) -> Result<Tensor, AttentionError> {
    let (rows, cols) = x.dims2().map_err(|_| {
        AttentionError::shape(format!(
            "softmax input must have shape [rows, cols], got {:?}",
            x.dims()
        ))
    })?;
    if rows == 0 || cols == 0 {
        return Err(AttentionError::shape(format!(
            "softmax input must be non-empty, got [{rows}, {cols}]"
        )));
    }

    let work = x.to_dtype(DType::F64)?;
    let max = work.max_keepdim(D::Minus1)?;
    let shifted = work.broadcast_sub(&max)?.exp()?;
    let denom = shifted.sum_keepdim(D::Minus1)?;
    Ok(shifted.broadcast_div(&denom)?.to_dtype(x.dtype())?)
}
