use super::*;

/// Share of rater pairs whose scores differ by at most `threshold`.
/// `None` when fewer than two scores are available.
pub fn pairwise_agreement(scores: &[f64], threshold: f64) -> Option<f64> {
    let valid = scores
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<f64>>();
    if valid.len() < 2 {
        return None;
    }

    let mut total_pairs = 0_usize;
    let mut agreeing_pairs = 0_usize;
    for (position, left) in valid.iter().enumerate() {
        for right in &valid[position + 1..] {
            total_pairs += 1;
            if (left - right).abs() <= threshold + COMPARISON_EPSILON {
                agreeing_pairs += 1;
            }
        }
    }

    Some(round5(agreeing_pairs as f64 / total_pairs as f64))
}

/// Simplified ICC on [0,1] scores: `1 - variance / (mean * (1 - mean))`.
/// A lone score has zero variance and yields 1; `None` only without scores.
pub fn simplified_icc(scores: &[f64]) -> Option<f64> {
    let valid = scores
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<f64>>();
    if valid.is_empty() {
        return None;
    }

    let mean = stats::mean(&valid);
    let spread = mean * (1.0 - mean);
    if spread == 0.0 {
        return Some(1.0);
    }

    let icc = 1.0 - stats::variance(&valid) / spread;
    Some(round5(icc.clamp(0.0, 1.0)))
}
