use super::*;

fn rating_category(rating: f64) -> Option<usize> {
    if !rating.is_finite() || rating < 0.5 {
        return None;
    }
    let category = rating.round().clamp(1.0, RATING_CATEGORIES as f64) as usize;
    Some(category - 1)
}

/// Fleiss' Kappa over 1-5 ratings. Each inner slice holds the ratings one
/// subject received; subjects rated by fewer than two raters are skipped.
/// `None` when no subject has two raters. When every rating falls in one
/// category the expected agreement is 1 and the result is reported as 1.
pub fn fleiss_kappa(subjects: &[Vec<f64>]) -> Option<f64> {
    let mut category_totals = [0_usize; RATING_CATEGORIES];
    let mut total_ratings = 0_usize;
    let mut subject_agreements = Vec::<f64>::new();

    for ratings in subjects {
        let mut counts = [0_usize; RATING_CATEGORIES];
        for category in ratings.iter().copied().filter_map(rating_category) {
            counts[category] += 1;
        }
        let raters = counts.iter().sum::<usize>();
        if raters < 2 {
            continue;
        }

        let agreeing = counts
            .iter()
            .map(|count| count * count.saturating_sub(1))
            .sum::<usize>();
        subject_agreements.push(agreeing as f64 / (raters * (raters - 1)) as f64);

        for (total, count) in category_totals.iter_mut().zip(counts) {
            *total += count;
        }
        total_ratings += raters;
    }

    if subject_agreements.is_empty() || total_ratings == 0 {
        return None;
    }

    let observed = stats::mean(&subject_agreements);
    let expected = category_totals
        .iter()
        .map(|count| {
            let proportion = *count as f64 / total_ratings as f64;
            proportion * proportion
        })
        .sum::<f64>();

    if (1.0 - expected).abs() < COMPARISON_EPSILON {
        return Some(1.0);
    }
    Some(round5((observed - expected) / (1.0 - expected)))
}
