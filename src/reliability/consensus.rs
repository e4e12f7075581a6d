use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRating {
    pub rating: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub rater_count: usize,
    pub weighted_average: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// Percentage of raters within the tolerance of the weighted average.
    pub agreement_percentage: f64,
    pub level: ConsensusLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisagreementKind {
    HighVariance,
    ExpertiseSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disagreement {
    pub component: ComponentKind,
    pub kind: DisagreementKind,
    pub variance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_expertise_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_expertise_mean: Option<f64>,
}

fn valid_ratings(ratings: &[WeightedRating]) -> Vec<WeightedRating> {
    ratings
        .iter()
        .copied()
        .filter(|entry| entry.rating.is_finite() && entry.weight.is_finite())
        .collect()
}

pub fn consensus(ratings: &[WeightedRating], config: &ReliabilityConfig) -> Option<Consensus> {
    let valid = valid_ratings(ratings);
    if valid.is_empty() {
        return None;
    }

    let values = valid.iter().map(|entry| entry.rating).collect::<Vec<f64>>();
    let weights = valid.iter().map(|entry| entry.weight).collect::<Vec<f64>>();

    let weight_sum = weights.iter().sum::<f64>();
    let weighted_average = if weight_sum > 0.0 {
        stats::weighted_mean(&values, &weights)
    } else {
        stats::mean(&values)
    };
    let variance = stats::variance(&values);

    let within = values
        .iter()
        .filter(|value| {
            (**value - weighted_average).abs() <= config.consensus_tolerance + COMPARISON_EPSILON
        })
        .count();
    let agreement_percentage = within as f64 / values.len() as f64 * 100.0;

    let level = if agreement_percentage >= config.consensus_high {
        ConsensusLevel::High
    } else if agreement_percentage >= config.consensus_medium {
        ConsensusLevel::Medium
    } else {
        ConsensusLevel::Low
    };

    Some(Consensus {
        rater_count: values.len(),
        weighted_average: round5(weighted_average),
        variance: round5(variance),
        std_dev: round5(variance.sqrt()),
        agreement_percentage: round5(agreement_percentage),
        level,
    })
}

pub fn detect_disagreement(
    component: ComponentKind,
    ratings: &[WeightedRating],
    config: &ReliabilityConfig,
) -> Vec<Disagreement> {
    let valid = valid_ratings(ratings);
    if valid.len() < 2 {
        return Vec::new();
    }

    let values = valid.iter().map(|entry| entry.rating).collect::<Vec<f64>>();
    let variance = round5(stats::variance(&values));
    let mut flags = Vec::<Disagreement>::new();

    if variance > config.high_disagreement_variance {
        flags.push(Disagreement {
            component,
            kind: DisagreementKind::HighVariance,
            variance,
            high_expertise_mean: None,
            low_expertise_mean: None,
        });
    }

    let (high, low): (Vec<WeightedRating>, Vec<WeightedRating>) = valid
        .iter()
        .partition(|entry| entry.weight >= config.high_expertise_weight);
    if !high.is_empty() && !low.is_empty() {
        let high_mean = stats::mean(&high.iter().map(|entry| entry.rating).collect::<Vec<f64>>());
        let low_mean = stats::mean(&low.iter().map(|entry| entry.rating).collect::<Vec<f64>>());
        if (high_mean - low_mean).abs() > config.expertise_split_gap {
            flags.push(Disagreement {
                component,
                kind: DisagreementKind::ExpertiseSplit,
                variance,
                high_expertise_mean: Some(round5(high_mean)),
                low_expertise_mean: Some(round5(low_mean)),
            });
        }
    }

    flags
}
