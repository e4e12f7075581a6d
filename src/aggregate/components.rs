use super::*;

pub fn build_component_aggregate(
    component: ComponentKind,
    records: &[ScoredRecord<'_>],
) -> ComponentAggregate {
    let scored = records
        .iter()
        .filter_map(|record| {
            record
                .component_scores
                .get(&component)
                .map(|score| (record, *score))
        })
        .collect::<Vec<(&ScoredRecord, f64)>>();

    if scored.is_empty() {
        return ComponentAggregate::empty(component);
    }

    let values = scored.iter().map(|(_, score)| *score).collect::<Vec<f64>>();
    let weights = scored
        .iter()
        .map(|(record, _)| record.expertise.weight)
        .collect::<Vec<f64>>();

    let ratings = records
        .iter()
        .filter_map(|record| record.user_ratings.get(&component).copied())
        .collect::<Vec<f64>>();
    let mean_user_rating = if ratings.is_empty() {
        None
    } else {
        Some(round5(stats::mean(&ratings)))
    };

    let mut per_paper = BTreeMap::<String, (Vec<f64>, Vec<f64>)>::new();
    for (record, score) in &scored {
        let entry = per_paper.entry(record.paper_id.clone()).or_default();
        entry.0.push(*score);
        entry.1.push(record.expertise.weight);
    }
    let by_paper = per_paper
        .into_iter()
        .map(|(paper_id, (values, weights))| {
            (
                paper_id,
                PaperComponentSummary {
                    count: values.len(),
                    mean: round5(stats::mean(&values)),
                    weighted_mean: round5(stats::weighted_mean(&values, &weights)),
                },
            )
        })
        .collect::<BTreeMap<String, PaperComponentSummary>>();

    ComponentAggregate {
        component,
        evaluation_count: scored.len(),
        statistics: stats::summarize(&values, &weights),
        distribution: stats::distribution(&values),
        mean_user_rating,
        by_paper,
    }
}

pub fn build_component_aggregates(
    records: &[ScoredRecord<'_>],
) -> BTreeMap<ComponentKind, ComponentAggregate> {
    ComponentKind::ALL
        .iter()
        .map(|component| (*component, build_component_aggregate(*component, records)))
        .collect()
}
