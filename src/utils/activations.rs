//! Activation and decision functions
//!
//! The network uses ReLU after every convolution and after F6. The OUTPUT layer has no
//! activation: raw scores go straight to [`argmax_last`].

/// ReLU activation function.
///
/// Returns `x` unchanged when non-negative, otherwise 0.0.
#[inline]
pub fn relu(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

/// ReLU activation function applied in-place.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        *value = relu(*value);
    }
}

/// Index of the largest score, preferring the later index on ties.
///
/// Scans left to right and moves the running best whenever the current score is
/// greater than or equal to it. Returns 0 for an empty slice.
pub fn argmax_last(scores: &[f32]) -> usize {
    let mut best = 0;
    for i in 1..scores.len() {
        if scores[i] >= scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_small_negative() {
        assert_eq!(relu(-0.001), 0.0);
    }

    #[test]
    fn test_relu_small_positive() {
        assert_eq!(relu(0.001), 0.001);
    }

    #[test]
    fn test_relu_mixed() {
        let mut data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_argmax_tie_prefers_later() {
        let scores = [0.5, 0.5, 0.3, 0.1, 0.0, -1.0, 0.2, 0.4, 0.1, 0.0];
        assert_eq!(argmax_last(&scores), 1);
    }

    #[test]
    fn test_argmax_unique_max() {
        assert_eq!(argmax_last(&[0.1, 0.9, 0.3]), 1);
        assert_eq!(argmax_last(&[3.0, -1.0, 2.0]), 0);
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax_last(&[]), 0);
    }
}
