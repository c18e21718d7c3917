//! Masked mean pooling over transformer token states.

use candle_core::{DType, Result, Tensor};

/// Floor applied to the per-row token count so all-padding rows divide
/// by a positive number instead of zero.
pub const MASK_EPSILON: f32 = 1e-9;

/// Averages token vectors, counting only positions where the mask is set.
///
/// `hidden` is `(batch, seq, hidden)` and `attention_mask` is `(batch, seq)`
/// of 0/1 values in any numeric dtype. Returns `(batch, hidden)` in `f32`.
/// A row with no unmasked tokens pools to the zero vector.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let hidden = hidden.to_dtype(DType::F32)?;
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;

    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let floor = Tensor::new(&[MASK_EPSILON], hidden.device())?;
    let counts = mask.sum(1)?.broadcast_maximum(&floor)?;

    summed.broadcast_div(&counts)
}
