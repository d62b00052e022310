//! Exact scaled dot-product attention primitives.
//!
//! The crate computes single-head attention over rank-2 tensors: queries
//! `Q` shaped `[n_q, d_k]`, keys `K` shaped `[n_k, d_k]` and values `V`
//! shaped `[n_k, d_v]`. Scores `Q · Kᵀ / sqrt(d_k)` are normalized row-wise
//! with a max-subtracted softmax, and the resulting weights combine the rows
//! of `V`. Both the output `[n_q, d_v]` and the weights `[n_q, n_k]` are
//! returned in the dtype of the inputs (bf16, f16, f32 or f64).
//!
//! Shape contracts are validated before any arithmetic and violations are
//! reported as [`AttentionError::ShapeMismatch`]. Non-finite inputs are a
//! caller precondition and are not detected.

pub mod core;
pub mod interop;
pub mod reference;
pub mod softmax;

pub use crate::core::{Attention, AttentionError, AttentionOutput, Config, PrecisionPolicy};
pub use interop::{matrix_from_rows, rows_from_matrix, AttentionShape};
pub use reference::{attention, scaled_scores, ExactAttention};
pub use softmax::stable_softmax_rows;
