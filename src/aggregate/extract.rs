use super::*;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionDiagnostics {
    pub computation_fallbacks: usize,
}

/// One evaluation with every score it contributes resolved up front.
#[derive(Debug, Clone)]
pub struct ScoredRecord<'r> {
    pub record: &'r EvaluationRecord,
    pub paper_id: String,
    pub evaluator_id: String,
    pub expertise: ExpertiseProfile,
    pub component_scores: BTreeMap<ComponentKind, f64>,
    pub user_ratings: BTreeMap<ComponentKind, f64>,
    pub overall_score: Option<f64>,
    pub date: Option<String>,
}

/// Resolves a component score; a failed derivation is logged and replaced by
/// the configured fallback, which then counts as an observation.
pub fn extract_component_score(
    record: &EvaluationRecord,
    component: ComponentKind,
    resolver: &ScoreResolver<'_>,
    diagnostics: &mut ExtractionDiagnostics,
) -> Option<f64> {
    match resolver.component_score(record, component) {
        Ok(score) => score.map(round5),
        Err(err) => {
            warn!(
                paper = %record.paper_key().unwrap_or_default(),
                evaluator = %record.evaluator_key(),
                component = %component,
                error = %err,
                "component score derivation failed; using fallback"
            );
            diagnostics.computation_fallbacks += 1;
            Some(resolver.config().computation_fallback)
        }
    }
}

pub fn extract_component_scores(
    record: &EvaluationRecord,
    resolver: &ScoreResolver<'_>,
    diagnostics: &mut ExtractionDiagnostics,
) -> BTreeMap<ComponentKind, f64> {
    ComponentKind::ALL
        .iter()
        .filter_map(|component| {
            extract_component_score(record, *component, resolver, diagnostics)
                .map(|score| (*component, score))
        })
        .collect()
}

/// Mean of the components present on the record; otherwise the mean of the
/// supplementary 1-5 ratings scaled to [0,1].
pub fn extract_overall_score(
    record: &EvaluationRecord,
    component_scores: &BTreeMap<ComponentKind, f64>,
) -> Option<f64> {
    if !component_scores.is_empty() {
        let values = component_scores.values().copied().collect::<Vec<f64>>();
        return Some(round5(stats::mean(&values)));
    }

    let supplementary = record
        .supplementary_ratings
        .as_ref()
        .map(|ratings| {
            ratings
                .values()
                .into_iter()
                .flatten()
                .filter(|value| value.is_finite() && *value > 0.0)
                .map(|value| value.min(MAX_USER_RATING) / MAX_USER_RATING)
                .collect::<Vec<f64>>()
        })
        .unwrap_or_default();

    if supplementary.is_empty() {
        None
    } else {
        Some(round5(stats::mean(&supplementary)))
    }
}

pub fn record_overall_score(record: &EvaluationRecord, resolver: &ScoreResolver<'_>) -> Option<f64> {
    let mut diagnostics = ExtractionDiagnostics::default();
    let component_scores = extract_component_scores(record, resolver, &mut diagnostics);
    extract_overall_score(record, &component_scores)
}

/// `None` when the record carries no paper identifier.
pub fn score_record<'r>(
    record: &'r EvaluationRecord,
    resolver: &ScoreResolver<'_>,
    diagnostics: &mut ExtractionDiagnostics,
) -> Option<ScoredRecord<'r>> {
    let paper_id = record
        .paper_key()
        .or_else(|| record.doi().map(normalize_identifier))?;

    let component_scores = extract_component_scores(record, resolver, diagnostics);
    let user_ratings = ComponentKind::ALL
        .iter()
        .filter_map(|component| {
            resolver
                .user_rating(record, *component)
                .map(|rating| (*component, rating))
        })
        .collect::<BTreeMap<ComponentKind, f64>>();
    let overall_score = extract_overall_score(record, &component_scores);

    Some(ScoredRecord {
        record,
        paper_id,
        evaluator_id: record.evaluator_key(),
        expertise: resolve_expertise(&record.user_info),
        component_scores,
        user_ratings,
        overall_score,
        date: record.timestamp.as_deref().and_then(calendar_date),
    })
}
