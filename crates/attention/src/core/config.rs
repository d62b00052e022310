//! Configuration options shared by all attention implementations.
//!
//! The [`Config`] struct captures run-time knobs such as the working
//! precision that callers can tune without swapping implementations. The
//! `ATTENTION_PRECISION` environment variable feeds [`Config::from_env`],
//! which the default entry points use; an explicit [`Config`] passed to
//! [`Attention::attend`](crate::core::Attention::attend) is taken as-is.

use std::fmt;
use std::str::FromStr;

use candle_core::DType;
use serde::{Deserialize, Serialize};

use super::AttentionError;

/// Environment variable consulted by [`Config::apply_env_overrides`].
pub const PRECISION_ENV: &str = "ATTENTION_PRECISION";

/// Dtype used for score, softmax and aggregation arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionPolicy {
    /// Promote `f16`/`bf16` inputs to `f32`; `f32` and `f64` run natively.
    /// Softmax normalization always accumulates in `f64`.
    #[default]
    AtLeastF32,
    /// Run the matmuls in the input dtype where candle's CPU matmul
    /// supports it. `bf16` has no CPU matmul and is still promoted to `f32`.
    Inherit,
}

impl PrecisionPolicy {
    /// Working dtype for inputs stored as `dtype`.
    pub fn compute_dtype(self, dtype: DType) -> DType {
        match (self, dtype) {
            (_, DType::BF16) => DType::F32,
            (PrecisionPolicy::AtLeastF32, DType::F16) => DType::F32,
            _ => dtype,
        }
    }
}

impl fmt::Display for PrecisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionPolicy::AtLeastF32 => f.write_str("at_least_f32"),
            PrecisionPolicy::Inherit => f.write_str("inherit"),
        }
    }
}

impl FromStr for PrecisionPolicy {
    type Err = AttentionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "at_least_f32" | "at-least-f32" | "f32" => Ok(PrecisionPolicy::AtLeastF32),
            "inherit" | "native" => Ok(PrecisionPolicy::Inherit),
            other => Err(AttentionError::Config {
                message: format!("unknown precision policy '{other}'"),
            }),
        }
    }
}

/// Configuration driving attention behaviour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Working precision for the score and weight reductions.
    pub precision: PrecisionPolicy,
}

impl Config {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply overrides from the process environment.
    ///
    /// Unparseable values are logged and ignored so a stray variable never
    /// turns a valid call into a failure.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(PRECISION_ENV) {
            self.apply_precision_override(&raw);
        }
    }

    fn apply_precision_override(&mut self, raw: &str) {
        match raw.parse::<PrecisionPolicy>() {
            Ok(policy) => self.precision = policy,
            Err(err) => log::warn!("ignoring {PRECISION_ENV}={raw:?}: {err}"),
        }
    }
}
