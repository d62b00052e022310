//! Interoperability helpers bridging attention with plain Rust data.

pub mod matrix;
pub mod types;

pub use matrix::{matrix_from_rows, rows_from_matrix};
pub use types::AttentionShape;
