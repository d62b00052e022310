//! Reference CPU attention kernel.
//!
//! The exact path prioritises numerical fidelity and mirrors the semantics
//! described by the [`Attention`](crate::core::Attention) trait.

use std::sync::OnceLock;

use candle_core::{DType, Tensor};

use crate::core::{Attention, AttentionError, AttentionOutput, Config};
use crate::interop::AttentionShape;
use crate::softmax::stable_softmax_rows;

/// Numerically stable, portable scaled dot-product attention.
#[derive(Debug, Default)]
pub struct ExactAttention {
    first_call: OnceLock<()>,
}

impl ExactAttention {
    /// Construct a reference attention kernel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Attention for ExactAttention {
    fn attend(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        config: &Config,
    ) -> Result<AttentionOutput, AttentionError> {
        if self.first_call.set(()).is_ok() {
            log::info!("attention::reference init precision={}", config.precision);
        }

        let shape = validate_qkv(q, k, v)?;
        let dtype = q.dtype();
        let compute = config.precision.compute_dtype(dtype);
        log::debug!("attention::reference attend {shape} dtype={dtype:?} compute={compute:?}");

        let q_work = q.to_dtype(compute)?;
        let k_work = k.to_dtype(compute)?;
        let v_work = v.to_dtype(compute)?;

        let scores = score_matrix(&q_work, &k_work, shape.scale())?;
        let weights = stable_softmax_rows(&scores)?;
        let output = weights.matmul(&v_work)?;

        Ok(AttentionOutput {
            output: output.to_dtype(dtype)?,
            weights: weights.to_dtype(dtype)?,
        })
    }
}

/// Run a process-wide [`ExactAttention`] with [`Config::from_env`].
///
/// Returns the `[n_q, d_v]` output alongside the `[n_q, n_k]` weights.
pub fn attention(q: &Tensor, k: &Tensor, v: &Tensor) -> Result<AttentionOutput, AttentionError> {
    default_kernel().attend(q, k, v, &Config::from_env())
}

fn default_kernel() -> &'static ExactAttention {
    static KERNEL: OnceLock<ExactAttention> = OnceLock::new();
    KERNEL.get_or_init(ExactAttention::new)
}

/// Compute the `[n_q, n_k]` score matrix `q · kᵀ / sqrt(d_k)` in the input
/// dtype, before normalization.
pub fn scaled_scores(q: &Tensor, k: &Tensor) -> Result<Tensor, AttentionError> {
    check_same_placement(&[("q", q), ("k", k)])?;
    let (n_q, d_k) = matrix_dims("q", q)?;
    let (n_k, kd) = matrix_dims("k", k)?;
    if kd != d_k {
        return Err(AttentionError::shape(format!(
            "k shape mismatch: expected [?, {d_k}] got [{n_k}, {kd}]"
        )));
    }
    log::debug!("attention::reference scores n_q={n_q} n_k={n_k} d_k={d_k}");
    score_matrix(q, k, AttentionShape::scale_for(d_k))
}

fn score_matrix(q: &Tensor, k: &Tensor, scale: f64) -> Result<Tensor, AttentionError> {
    let k_t = k.t()?.contiguous()?;
    Ok(q.matmul(&k_t)?.affine(scale, 0.0)?)
}

fn validate_qkv(q: &Tensor, k: &Tensor, v: &Tensor) -> Result<AttentionShape, AttentionError> {
    check_same_placement(&[("q", q), ("k", k), ("v", v)])?;

    let (n_q, d_k) = matrix_dims("q", q)?;
    let (n_k, kd) = matrix_dims("k", k)?;
    let (vk, d_v) = matrix_dims("v", v)?;

    if kd != d_k {
        return Err(AttentionError::shape(format!(
            "k shape mismatch: expected [?, {d_k}] got [{n_k}, {kd}]"
        )));
    }
    if vk != n_k {
        return Err(AttentionError::shape(format!(
            "v shape mismatch: expected [{n_k}, ?] got [{vk}, {d_v}]"
        )));
    }

    Ok(AttentionShape { n_q, n_k, d_k, d_v })
}

fn check_same_placement(operands: &[(&str, &Tensor)]) -> Result<(), AttentionError> {
    let Some((_, first)) = operands.first() else {
        return Ok(());
    };
    let device = first.device();
    if operands.iter().any(|(_, t)| !device.same_device(t.device())) {
        let names: Vec<&str> = operands.iter().map(|(name, _)| *name).collect();
        return Err(AttentionError::shape(format!(
            "{} must reside on the same device",
            names.join(", ")
        )));
    }

    let dtype = first.dtype();
    if operands.iter().any(|(_, t)| t.dtype() != dtype) {
        let described: Vec<String> = operands
            .iter()
            .map(|(name, t)| format!("{name}={:?}", t.dtype()))
            .collect();
        return Err(AttentionError::UnsupportedDType {
            requested: format!("mixed dtypes {}", described.join(" ")),
        });
    }
    if !matches!(dtype, DType::F32 | DType::F64 | DType::F16 | DType::BF16) {
        return Err(AttentionError::UnsupportedDType {
            requested: format!("{dtype:?}"),
        });
    }
    Ok(())
}

fn matrix_dims(name: &str, t: &Tensor) -> Result<(usize, usize), AttentionError> {
    let (rows, cols) = t.dims2().map_err(|_| {
        AttentionError::shape(format!(
            "{name} must have shape [rows, cols], got {:?}",
            t.dims()
        ))
    })?;
    if rows == 0 || cols == 0 {
        return Err(AttentionError::shape(format!(
            "{name} must not have a zero-sized dimension, got [{rows}, {cols}]"
        )));
    }
    Ok((rows, cols))
}
