use super::*;

/// Blend of one automated score with one human rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    pub automated_score: f64,
    pub user_rating: f64,
    pub normalized_rating: f64,
    pub expertise_multiplier: f64,
    pub automatic_confidence: f64,
    pub automatic_weight: f64,
    pub user_weight: f64,
    pub combined_score: f64,
    pub agreement: f64,
    pub agreement_bonus: f64,
    pub final_score: f64,
    pub is_capped: bool,
}

pub fn combine_scores(
    automated_score: f64,
    user_rating: f64,
    expertise_multiplier: f64,
    config: &ScoringConfig,
) -> Result<ComponentScore> {
    if !automated_score.is_finite() || !user_rating.is_finite() || !expertise_multiplier.is_finite()
    {
        bail!(
            "non-finite combiner input: automated={automated_score} rating={user_rating} multiplier={expertise_multiplier}"
        );
    }

    let automated = automated_score.clamp(0.0, 1.0);
    let rating = user_rating.clamp(0.0, MAX_USER_RATING);
    let multiplier = expertise_multiplier.max(0.0);

    let normalized_rating = rating / MAX_USER_RATING;
    let automatic_confidence = 1.0 - (2.0 * (automated - 0.5).abs()).powi(2);

    let raw_automatic_weight = config
        .min_automated_weight
        .max(config.automated_weight_base * automatic_confidence);
    let raw_user_weight = config.user_weight_base * multiplier;
    let weight_sum = raw_automatic_weight + raw_user_weight;
    if !weight_sum.is_finite() || weight_sum <= 0.0 {
        bail!(
            "degenerate combiner weights: automatic={raw_automatic_weight} user={raw_user_weight}"
        );
    }

    let automatic_weight = raw_automatic_weight / weight_sum;
    let user_weight = raw_user_weight / weight_sum;
    let combined_score = automatic_weight * automated + user_weight * normalized_rating;

    let agreement = (1.0 - (automated - normalized_rating).abs()).clamp(0.0, 1.0);
    let agreement_bonus = agreement * config.agreement_bonus_factor;

    let unclipped = combined_score * (1.0 + agreement_bonus);
    let final_score = unclipped.clamp(0.0, 1.0);

    let rounded_automatic_weight = round5(automatic_weight);

    Ok(ComponentScore {
        automated_score: round5(automated),
        user_rating: round5(rating),
        normalized_rating: round5(normalized_rating),
        expertise_multiplier: round5(multiplier),
        automatic_confidence: round5(automatic_confidence),
        automatic_weight: rounded_automatic_weight,
        user_weight: round5(1.0 - rounded_automatic_weight),
        combined_score: round5(combined_score),
        agreement: round5(agreement),
        agreement_bonus: round5(agreement_bonus),
        final_score: round5(final_score),
        is_capped: unclipped > 1.0,
    })
}

/// Folds weighted sub-component scores into one automated score. Only
/// components with both a finite score and a nonzero weight take part.
pub fn fold_weighted_components(
    component_scores: &BTreeMap<String, f64>,
    component_weights: &BTreeMap<String, f64>,
) -> f64 {
    let (weighted_sum, weight_sum) = component_scores
        .iter()
        .filter_map(|(name, score)| {
            let weight = component_weights.get(name).copied()?;
            if !score.is_finite() || !weight.is_finite() || weight == 0.0 {
                return None;
            }
            Some((*score, weight))
        })
        .fold((0.0_f64, 0.0_f64), |(sum, total), (score, weight)| {
            (sum + score * weight, total + weight)
        });

    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

pub fn combine_weighted_components(
    component_scores: &BTreeMap<String, f64>,
    component_weights: &BTreeMap<String, f64>,
    user_rating: f64,
    expertise_multiplier: f64,
    importance_factor: f64,
    config: &ScoringConfig,
) -> Result<ComponentScore> {
    if !importance_factor.is_finite() || importance_factor < 0.0 {
        bail!("importance factor must be finite and non-negative, got {importance_factor}");
    }

    let automated_score = fold_weighted_components(component_scores, component_weights);
    let base = combine_scores(automated_score, user_rating, expertise_multiplier, config)?;

    let scaled = base.final_score * importance_factor;
    Ok(ComponentScore {
        final_score: round5(scaled.clamp(0.0, 1.0)),
        is_capped: base.is_capped || scaled > 1.0,
        ..base
    })
}
