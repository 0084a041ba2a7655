use ndarray::{Array1, ArrayView1};

/// Temperature-scaled softmax
///
/// Logits are divided by `temperature` and shifted by their maximum before
/// exponentiation, so large logits do not overflow. Temperatures below 1
/// sharpen the distribution, above 1 flatten it.
pub fn softmax(logits: ArrayView1<f32>, temperature: f32) -> Array1<f32> {
    let scaled = &logits / temperature;
    let max = scaled.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = (scaled - max).exp();
    let sum = exp.sum();
    exp / sum
}
