use super::*;

fn paired_scores<'r>(
    records: &[&ScoredRecord<'r>],
    select: impl Fn(&ScoredRecord<'r>) -> Option<f64>,
) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .filter_map(|record| select(*record).map(|score| (score, record.expertise.weight)))
        .unzip()
}

fn weighted_ratings(records: &[&ScoredRecord<'_>], component: ComponentKind) -> Vec<WeightedRating> {
    records
        .iter()
        .filter_map(|record| {
            record
                .user_ratings
                .get(&component)
                .map(|rating| WeightedRating {
                    rating: *rating,
                    weight: record.expertise.weight,
                })
        })
        .collect()
}

/// Fleiss subjects are the paper's components; each rater's 1-5 rating is a category.
fn kappa_subjects(records: &[&ScoredRecord<'_>]) -> Vec<Vec<f64>> {
    ComponentKind::ALL
        .iter()
        .map(|component| {
            records
                .iter()
                .filter_map(|record| record.user_ratings.get(component).copied())
                .collect::<Vec<f64>>()
        })
        .filter(|ratings| !ratings.is_empty())
        .collect()
}

pub fn paper_reliability(records: &[&ScoredRecord<'_>], config: &ReliabilityConfig) -> PaperReliability {
    let overall = records
        .iter()
        .filter_map(|record| record.overall_score)
        .collect::<Vec<f64>>();
    let rater_count = records
        .iter()
        .map(|record| record.evaluator_id.as_str())
        .collect::<BTreeSet<&str>>()
        .len();

    let mut consensus_by_component = BTreeMap::<ComponentKind, Consensus>::new();
    let mut disagreements = Vec::<Disagreement>::new();
    for component in ComponentKind::ALL {
        let ratings = weighted_ratings(records, component);
        if let Some(result) = consensus(&ratings, config) {
            consensus_by_component.insert(component, result);
        }
        disagreements.extend(detect_disagreement(component, &ratings, config));
    }

    PaperReliability {
        rater_count,
        pairwise_agreement: pairwise_agreement(&overall, config.agreement_threshold),
        icc: simplified_icc(&overall),
        fleiss_kappa: fleiss_kappa(&kappa_subjects(records)),
        consensus: consensus_by_component,
        disagreements,
    }
}

fn paper_metadata(records: &[&ScoredRecord<'_>]) -> PaperSnapshot {
    records
        .iter()
        .find_map(|record| record.record.paper.clone())
        .unwrap_or_default()
}

pub fn build_paper_aggregate(
    paper_id: &str,
    records: &[&ScoredRecord<'_>],
    config: &EngineConfig,
) -> PaperAggregate {
    let (overall_values, overall_weights) = paired_scores(records, |record| record.overall_score);
    let overall = stats::summarize(&overall_values, &overall_weights);

    let components = ComponentKind::ALL
        .iter()
        .filter_map(|component| {
            let (values, weights) =
                paired_scores(records, |record| record.component_scores.get(component).copied());
            if values.is_empty() {
                None
            } else {
                Some((*component, stats::summarize(&values, &weights)))
            }
        })
        .collect::<BTreeMap<ComponentKind, ScoreStatistics>>();

    let difficulty = if overall.count == 0 {
        None
    } else {
        Some(Difficulty::classify(overall.mean, &config.difficulty))
    };

    let evaluators = records
        .iter()
        .map(|record| ContributingEvaluator {
            evaluator_id: record.evaluator_id.clone(),
            expertise_weight: record.expertise.weight,
            overall_score: record.overall_score,
            timestamp: record.record.timestamp.clone(),
        })
        .collect::<Vec<ContributingEvaluator>>();

    PaperAggregate {
        paper_id: paper_id.to_string(),
        metadata: paper_metadata(records),
        evaluation_count: records.len(),
        overall,
        components,
        difficulty,
        reliability: paper_reliability(records, &config.reliability),
        evaluators,
    }
}

pub fn build_paper_aggregates(
    by_paper: &BTreeMap<String, Vec<&ScoredRecord<'_>>>,
    config: &EngineConfig,
) -> BTreeMap<String, PaperAggregate> {
    by_paper
        .iter()
        .map(|(paper_id, records)| {
            (
                paper_id.clone(),
                build_paper_aggregate(paper_id, records, config),
            )
        })
        .collect()
}

fn optional_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round5(stats::mean(values)))
    }
}

/// Rolls per-paper reliability up to the whole run. Kappa is recomputed over
/// every paper/component subject rather than averaged.
pub fn summarize_reliability(
    by_paper: &BTreeMap<String, Vec<&ScoredRecord<'_>>>,
    papers: &BTreeMap<String, PaperAggregate>,
) -> ReliabilitySummary {
    let multi_rater = papers
        .values()
        .filter(|paper| paper.reliability.rater_count >= 2)
        .collect::<Vec<&PaperAggregate>>();

    let agreements = multi_rater
        .iter()
        .filter_map(|paper| paper.reliability.pairwise_agreement)
        .collect::<Vec<f64>>();
    let iccs = multi_rater
        .iter()
        .filter_map(|paper| paper.reliability.icc)
        .collect::<Vec<f64>>();

    let subjects = by_paper
        .values()
        .flat_map(|records| kappa_subjects(records))
        .collect::<Vec<Vec<f64>>>();

    let all_flags = papers
        .values()
        .flat_map(|paper| paper.reliability.disagreements.iter())
        .collect::<Vec<&Disagreement>>();

    ReliabilitySummary {
        papers_with_multiple_raters: multi_rater.len(),
        mean_pairwise_agreement: optional_mean(&agreements),
        mean_icc: optional_mean(&iccs),
        fleiss_kappa: fleiss_kappa(&subjects),
        high_variance_flags: all_flags
            .iter()
            .filter(|flag| flag.kind == DisagreementKind::HighVariance)
            .count(),
        expertise_split_flags: all_flags
            .iter()
            .filter(|flag| flag.kind == DisagreementKind::ExpertiseSplit)
            .count(),
        flagged_papers: papers
            .values()
            .filter(|paper| !paper.reliability.disagreements.is_empty())
            .map(|paper| paper.paper_id.clone())
            .collect(),
    }
}
