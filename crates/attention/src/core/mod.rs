//! Core traits and types shared across attention implementations.
//!
//! Implementations operate on rank-2 tensors: `q` shaped `[n_q, d_k]`, `k`
//! shaped `[n_k, d_k]` and `v` shaped `[n_k, d_v]`. Both returned tensors
//! carry the dtype of the inputs.

pub mod config;
pub mod errors;

use candle_core::Tensor;

pub use config::{Config, PrecisionPolicy, PRECISION_ENV};
pub use errors::AttentionError;

/// Result of a single attention invocation.
#[derive(Debug, Clone)]
pub struct AttentionOutput {
    /// Weighted combination of value rows, shaped `[n_q, d_v]`.
    pub output: Tensor,
    /// Row-stochastic attention weights, shaped `[n_q, n_k]`.
    pub weights: Tensor,
}

/// Unified interface for attention kernels.
///
/// * `q.dims()[1]` must equal `k.dims()[1]` and `k.dims()[0]` must equal
///   `v.dims()[0]`; no dimension may be zero.
/// * `q`, `k` and `v` must share a dtype and device.
/// * Inputs containing NaN or infinities produce non-finite results; this is
///   not checked.
pub trait Attention {
    /// Compute scaled dot-product attention.
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError>;
}
