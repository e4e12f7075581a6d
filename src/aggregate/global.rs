use super::*;

const UNSPECIFIED_ROLE: &str = "unspecified";

/// Counts distinct evaluators by declared role and by domain expertise level.
pub fn expertise_distribution(
    evaluators: &BTreeMap<String, EvaluatorAggregate>,
) -> ExpertiseDistribution {
    let mut distribution = ExpertiseDistribution::default();
    for evaluator in evaluators.values() {
        let role = evaluator
            .profile
            .role
            .as_deref()
            .map(|role| role.trim().to_lowercase())
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| UNSPECIFIED_ROLE.to_string());
        *distribution.by_role.entry(role).or_default() += 1;
        *distribution
            .by_level
            .entry(evaluator.profile.domain_level.as_str().to_string())
            .or_default() += 1;
    }
    distribution
}

pub fn build_global_stats(
    records: &[ScoredRecord<'_>],
    papers: &BTreeMap<String, PaperAggregate>,
    evaluators: &BTreeMap<String, EvaluatorAggregate>,
) -> GlobalStats {
    let overall = records
        .iter()
        .filter_map(|record| record.overall_score)
        .collect::<Vec<f64>>();
    let total = records.len();

    let component_coverage = ComponentKind::ALL
        .iter()
        .map(|component| {
            let covered = records
                .iter()
                .filter(|record| record.component_scores.contains_key(component))
                .count();
            let coverage = if total == 0 {
                0.0
            } else {
                round5(covered as f64 / total as f64)
            };
            (*component, coverage)
        })
        .collect::<BTreeMap<ComponentKind, f64>>();

    let component_user_ratings = ComponentKind::ALL
        .iter()
        .filter_map(|component| {
            let normalized = records
                .iter()
                .filter_map(|record| record.user_ratings.get(component))
                .map(|rating| rating / MAX_USER_RATING)
                .collect::<Vec<f64>>();
            if normalized.is_empty() {
                None
            } else {
                Some((*component, round5(stats::mean(&normalized))))
            }
        })
        .collect::<BTreeMap<ComponentKind, f64>>();

    GlobalStats {
        total_evaluations: total,
        total_papers: papers.len(),
        total_evaluators: evaluators.len(),
        scored_evaluations: overall.len(),
        mean_overall_score: round5(stats::mean(&overall)),
        score_distribution: stats::distribution(&overall),
        expertise_distribution: expertise_distribution(evaluators),
        component_coverage,
        component_user_ratings,
    }
}
