//! Shared types describing attention problem sizes.

use std::fmt;

/// Logical description of a validated attention invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionShape {
    /// Number of query rows.
    pub n_q: usize,
    /// Number of key (and value) rows.
    pub n_k: usize,
    /// Shared query/key dimensionality.
    pub d_k: usize,
    /// Value dimensionality.
    pub d_v: usize,
}

impl AttentionShape {
    /// Multiplier applied to raw dot products, `1 / sqrt(d_k)`.
    pub fn scale(&self) -> f64 {
        Self::scale_for(self.d_k)
    }

    pub(crate) fn scale_for(d_k: usize) -> f64 {
        1.0 / (d_k as f64).sqrt()
    }
}

impl fmt::Display for AttentionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_q={} n_k={} d_k={} d_v={}",
            self.n_q, self.n_k, self.d_k, self.d_v
        )
    }
}
