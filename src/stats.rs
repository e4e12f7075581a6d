use serde::{Deserialize, Serialize};

use crate::util::round5;

/// Upper bounds of the fixed score bins; the first bin is closed on both ends.
const DISTRIBUTION_BOUNDS: [(f64, f64); 5] = [
    (0.0, 0.2),
    (0.2, 0.4),
    (0.4, 0.6),
    (0.6, 0.8),
    (0.8, 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBin {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierKind {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlier {
    pub index: usize,
    pub value: f64,
    pub kind: OutlierKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStatistics {
    pub count: usize,
    pub mean: f64,
    pub weighted_mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub outliers: Vec<Outlier>,
}

fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|value| value.is_finite()).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    let valid = finite_values(values);
    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let (weighted_sum, weight_sum) = values
        .iter()
        .zip(weights.iter())
        .filter(|(value, weight)| value.is_finite() && weight.is_finite())
        .fold((0.0_f64, 0.0_f64), |(sum, total), (value, weight)| {
            (sum + value * weight, total + weight)
        });

    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

/// Population variance (divides by N).
pub fn variance(values: &[f64]) -> f64 {
    let valid = finite_values(values);
    if valid.is_empty() {
        return 0.0;
    }
    let center = valid.iter().sum::<f64>() / valid.len() as f64;
    valid
        .iter()
        .map(|value| (value - center).powi(2))
        .sum::<f64>()
        / valid.len() as f64
}

pub fn standard_deviation(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = finite_values(values);
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|left, right| left.total_cmp(right));

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

pub fn distribution(scores: &[f64]) -> Vec<DistributionBin> {
    let mut counts = [0_usize; DISTRIBUTION_BOUNDS.len()];

    for score in scores.iter().copied().filter(|value| value.is_finite()) {
        if !(0.0..=1.0).contains(&score) {
            continue;
        }
        let index = DISTRIBUTION_BOUNDS
            .iter()
            .position(|(_, upper)| score <= *upper)
            .unwrap_or(DISTRIBUTION_BOUNDS.len() - 1);
        counts[index] += 1;
    }

    DISTRIBUTION_BOUNDS
        .iter()
        .zip(counts)
        .map(|((lower, upper), count)| DistributionBin {
            label: format!("{lower:.1}-{upper:.1}"),
            lower: *lower,
            upper: *upper,
            count,
        })
        .collect()
}

/// Tukey fences at 1.5 IQR; quartiles are taken by index truncation.
pub fn detect_outliers(scores: &[f64]) -> Vec<Outlier> {
    let indexed = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .collect::<Vec<(usize, f64)>>();
    if indexed.len() < 3 {
        return Vec::new();
    }

    let mut sorted = indexed
        .iter()
        .map(|(_, value)| *value)
        .collect::<Vec<f64>>();
    sorted.sort_by(|left, right| left.total_cmp(right));

    let count = sorted.len();
    let q1 = sorted[count / 4];
    let q3 = sorted[(count * 3) / 4];
    let iqr = q3 - q1;
    let lower_bound = q1 - 1.5 * iqr;
    let upper_bound = q3 + 1.5 * iqr;

    indexed
        .into_iter()
        .filter_map(|(index, value)| {
            if value < lower_bound {
                Some(Outlier {
                    index,
                    value,
                    kind: OutlierKind::Low,
                })
            } else if value > upper_bound {
                Some(Outlier {
                    index,
                    value,
                    kind: OutlierKind::High,
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let pairs = x
        .iter()
        .zip(y.iter())
        .filter(|(left, right)| left.is_finite() && right.is_finite())
        .map(|(left, right)| (*left, *right))
        .collect::<Vec<(f64, f64)>>();
    if pairs.is_empty() {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(left, _)| left).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, right)| right).sum::<f64>() / n;

    let mut covariance = 0.0_f64;
    let mut sum_sq_x = 0.0_f64;
    let mut sum_sq_y = 0.0_f64;
    for (left, right) in &pairs {
        let dx = left - mean_x;
        let dy = right - mean_y;
        covariance += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

/// Descriptive block over index-aligned values and weights. A pair is kept
/// only when both sides are finite, so the two series never drift apart.
pub fn summarize(values: &[f64], weights: &[f64]) -> ScoreStatistics {
    let (kept_values, kept_weights): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(weights.iter())
        .filter(|(value, weight)| value.is_finite() && weight.is_finite())
        .map(|(value, weight)| (*value, *weight))
        .unzip();

    if kept_values.is_empty() {
        return ScoreStatistics::default();
    }

    let min = kept_values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = kept_values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let variance_value = variance(&kept_values);

    ScoreStatistics {
        count: kept_values.len(),
        mean: round5(mean(&kept_values)),
        weighted_mean: round5(weighted_mean(&kept_values, &kept_weights)),
        median: round5(median(&kept_values)),
        std_dev: round5(variance_value.sqrt()),
        variance: round5(variance_value),
        min: round5(min),
        max: round5(max),
        outliers: detect_outliers(&kept_values)
            .into_iter()
            .map(|outlier| Outlier {
                value: round5(outlier.value),
                ..outlier
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        OutlierKind, detect_outliers, distribution, mean, median, pearson_correlation,
        standard_deviation, summarize, variance, weighted_mean,
    };

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn mean_ignores_non_finite_entries() {
        assert_eq!(mean(&[]), 0.0);
        assert!(close(mean(&[0.2, f64::NAN, 0.4]), 0.3));
        assert_eq!(mean(&[f64::NAN]), 0.0);
    }

    #[test]
    fn weighted_mean_with_constant_weights_matches_mean() {
        let values = [0.1, 0.35, 0.8, 0.62, 0.0];
        for weight in [0.5, 1.0, 3.0, 42.0] {
            let weights = vec![weight; values.len()];
            assert!(close(weighted_mean(&values, &weights), mean(&values)));
        }
    }

    #[test]
    fn weighted_mean_drops_pairs_in_lockstep() {
        let values = [1.0, f64::NAN, 0.0];
        let weights = [3.0, 100.0, 1.0];
        assert!(close(weighted_mean(&values, &weights), 0.75));
        assert_eq!(weighted_mean(&[0.5, 0.7], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn variance_is_population_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(variance(&values), 4.0));
        assert!(close(standard_deviation(&values), 2.0));
    }

    #[test]
    fn median_averages_middle_pair_for_even_counts() {
        assert!(close(median(&[0.9, 0.1, 0.5]), 0.5));
        assert!(close(median(&[0.4, 0.1, 0.9, 0.2]), 0.3));
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn distribution_uses_closed_first_bin_and_half_open_rest() {
        let bins = distribution(&[0.0, 0.2, 0.21, 0.4, 0.6, 0.61, 1.0, 1.2, -0.1]);
        let counts = bins.iter().map(|bin| bin.count).collect::<Vec<usize>>();
        assert_eq!(counts, vec![2, 2, 1, 1, 1]);
        assert_eq!(bins[0].label, "0.0-0.2");
        assert_eq!(bins[4].label, "0.8-1.0");
    }

    #[test]
    fn detect_outliers_requires_three_samples() {
        assert!(detect_outliers(&[]).is_empty());
        assert!(detect_outliers(&[0.1, 10.0]).is_empty());
    }

    #[test]
    fn detect_outliers_tags_low_and_high() {
        let scores = [0.5, 0.52, 0.48, 0.51, 0.49, 0.5, 0.99, 0.01];
        let outliers = detect_outliers(&scores);
        assert_eq!(outliers.len(), 2);
        assert!(
            outliers
                .iter()
                .any(|outlier| outlier.index == 6 && outlier.kind == OutlierKind::High)
        );
        assert!(
            outliers
                .iter()
                .any(|outlier| outlier.index == 7 && outlier.kind == OutlierKind::Low)
        );
    }

    #[test]
    fn pearson_of_series_with_itself_is_one() {
        let x = [0.1, 0.4, 0.35, 0.9, 0.62];
        assert!(close(pearson_correlation(&x, &x), 1.0));

        let reversed = [0.9, 0.6, 0.65, 0.1, 0.38];
        assert!(close(pearson_correlation(&x, &reversed), -1.0));
    }

    #[test]
    fn pearson_is_zero_for_constant_series_and_uses_shorter_length() {
        assert_eq!(pearson_correlation(&[0.5, 0.5, 0.5], &[0.1, 0.2, 0.3]), 0.0);
        assert_eq!(pearson_correlation(&[], &[]), 0.0);

        let x = [1.0, 2.0, 3.0, 100.0];
        let y = [2.0, 4.0, 6.0];
        assert!(close(pearson_correlation(&x, &y), 1.0));
    }

    #[test]
    fn summarize_keeps_weights_aligned_with_values() {
        let values = [0.9, f64::NAN, 0.1];
        let weights = [4.0, 1.0, 1.0];
        let stats = summarize(&values, &weights);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 0.5);
        assert_eq!(stats.weighted_mean, 0.74);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.9);

        let empty = summarize(&[], &[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.weighted_mean, 0.0);
    }
}
