//! Conversions between row-major `Vec<Vec<f32>>` data and rank-2 tensors.

use candle_core::{DType, Device, Tensor};

use crate::core::AttentionError;

/// Build a `[rows.len(), cols]` `f32` tensor from row-major data.
///
/// Every row must have the same length. An empty slice yields a `[0, 0]`
/// tensor, which attention later rejects.
pub fn matrix_from_rows(rows: &[Vec<f32>], device: &Device) -> Result<Tensor, AttentionError> {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
        return Err(AttentionError::shape(format!(
            "ragged matrix: row 0 has {cols} columns but row {idx} has {}",
            row.len()
        )));
    }
    let data: Vec<f32> = rows.iter().flatten().copied().collect();
    Ok(Tensor::from_vec(data, (rows.len(), cols), device)?)
}

/// Copy a rank-2 tensor of any float dtype back into row-major `f32` rows.
pub fn rows_from_matrix(tensor: &Tensor) -> Result<Vec<Vec<f32>>, AttentionError> {
    if tensor.rank() != 2 {
        return Err(AttentionError::shape(format!(
            "expected a rank-2 tensor, got shape {:?}",
            tensor.dims()
        )));
    }
    Ok(tensor.to_dtype(DType::F32)?.to_vec2::<f32>()?)
}
