use super::*;

/// System output for the record's paper: exact key first, then a DOI match.
pub fn find_system_output<'m>(
    record: &EvaluationRecord,
    system_data: &'m SystemDataMap,
) -> Option<&'m SystemOutput> {
    if let Some(found) = record
        .paper_key()
        .and_then(|key| system_data.get(key.as_str()))
    {
        return Some(found);
    }

    let doi = normalize_identifier(record.doi()?);
    system_data.values().find(|output| {
        output
            .paper
            .doi
            .as_deref()
            .is_some_and(|candidate| normalize_identifier(candidate) == doi)
    })
}

/// Fills content inputs and the paper snapshot from system output without
/// overwriting anything the evaluator recorded. Returns whether anything changed.
fn enrich_record(
    record: &mut EvaluationRecord,
    system: &SystemOutput,
    config: &ScoringConfig,
) -> bool {
    let multiplier = resolve_expertise(&record.user_info).multiplier;
    let paper_key = record.paper_key().unwrap_or_default();
    let mut changed = false;

    let content = record
        .evaluation_metrics
        .overall
        .entry(ComponentKind::Content)
        .or_default();

    if content.scores.automated_score.is_none() {
        let automated = match &system.content {
            Some(analysis) if !analysis.property_scores.is_empty() => Some(round5(
                fold_weighted_components(&analysis.property_scores, &analysis.property_weights),
            )),
            _ => system.scores.get(&ComponentKind::Content).copied(),
        };
        if let Some(automated) = automated.filter(|value| value.is_finite()) {
            content.scores.automated_score = Some(automated);
            changed = true;
        }
    }

    let rating = content
        .scores
        .user_rating
        .filter(|value| value.is_finite() && *value > 0.0);
    if content.scores.final_score.is_none() {
        if let (Some(analysis), Some(rating)) = (&system.content, rating) {
            if !analysis.property_scores.is_empty() {
                match combine_weighted_components(
                    &analysis.property_scores,
                    &analysis.property_weights,
                    rating,
                    multiplier,
                    config.importance_factor,
                    config,
                ) {
                    Ok(score) => {
                        content.scores.final_score = Some(score.final_score);
                        changed = true;
                    }
                    Err(err) => warn!(
                        paper = %paper_key,
                        error = %err,
                        "content score combination failed"
                    ),
                }
            }
        }
    }

    let content_is_empty = record
        .evaluation_metrics
        .overall
        .get(&ComponentKind::Content)
        .is_some_and(|metrics| metrics.scores.is_empty() && metrics.fields.is_empty());
    if content_is_empty {
        record
            .evaluation_metrics
            .overall
            .remove(&ComponentKind::Content);
    }

    if record.paper.is_none() && system.paper != PaperSnapshot::default() {
        record.paper = Some(system.paper.clone());
        changed = true;
    }

    changed
}

/// Copies the records, merging system-generated data where it is missing.
pub fn enrich_records(
    records: &[EvaluationRecord],
    system_data: &SystemDataMap,
    config: &ScoringConfig,
) -> (Vec<EvaluationRecord>, usize) {
    let mut enriched_count = 0usize;
    let enriched = records
        .iter()
        .map(|record| {
            let mut copy = record.clone();
            if let Some(system) = find_system_output(record, system_data) {
                if enrich_record(&mut copy, system, config) {
                    enriched_count += 1;
                }
            }
            copy
        })
        .collect::<Vec<EvaluationRecord>>();

    debug!(
        records = records.len(),
        enriched = enriched_count,
        "merged system output into evaluations"
    );
    (enriched, enriched_count)
}
