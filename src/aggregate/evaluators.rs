use super::*;

/// `1 - min(1, std / mean)`, or 0 when the mean is not positive.
pub fn consistency_score(mean: f64, std_dev: f64) -> f64 {
    if !mean.is_finite() || mean <= 0.0 {
        return 0.0;
    }
    round5(1.0 - (std_dev / mean).min(1.0))
}

pub fn build_evaluator_aggregate(
    evaluator_id: &str,
    records: &[&ScoredRecord<'_>],
) -> EvaluatorAggregate {
    let scores = records
        .iter()
        .filter_map(|record| record.overall_score)
        .collect::<Vec<f64>>();
    let mean_score = stats::mean(&scores);
    let std_dev = stats::standard_deviation(&scores);

    let profile = records
        .iter()
        .map(|record| record.expertise.clone())
        .next()
        .unwrap_or_else(|| resolve_expertise(&Default::default()));

    let papers_evaluated = records
        .iter()
        .map(|record| record.paper_id.clone())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect::<Vec<String>>();

    EvaluatorAggregate {
        evaluator_id: evaluator_id.to_string(),
        profile,
        performance: EvaluatorPerformance {
            evaluation_count: records.len(),
            scored_evaluations: scores.len(),
            mean_score: round5(mean_score),
            std_dev: round5(std_dev),
        },
        consistency: if scores.is_empty() {
            0.0
        } else {
            consistency_score(mean_score, std_dev)
        },
        papers_evaluated,
    }
}

pub fn build_evaluator_aggregates(
    by_evaluator: &BTreeMap<String, Vec<&ScoredRecord<'_>>>,
) -> BTreeMap<String, EvaluatorAggregate> {
    by_evaluator
        .iter()
        .map(|(evaluator_id, records)| {
            (
                evaluator_id.clone(),
                build_evaluator_aggregate(evaluator_id, records),
            )
        })
        .collect()
}
