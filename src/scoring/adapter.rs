use super::*;

/// Accessor every score producer implements so consumers never search
/// nested locations for a score.
pub trait ComponentScoreSource {
    fn component_metrics(
        &self,
        metric: MetricKind,
        component: ComponentKind,
    ) -> Option<&ComponentMetrics>;

    fn expertise_multiplier(&self) -> f64;

    /// Scope under which upstream producers persisted scores for this source.
    fn store_scope(&self) -> Option<String>;
}

impl ComponentScoreSource for EvaluationRecord {
    fn component_metrics(
        &self,
        metric: MetricKind,
        component: ComponentKind,
    ) -> Option<&ComponentMetrics> {
        self.evaluation_metrics.table(metric).get(&component)
    }

    fn expertise_multiplier(&self) -> f64 {
        resolve_expertise(&self.user_info).multiplier
    }

    fn store_scope(&self) -> Option<String> {
        self.paper_key()
    }
}

/// Drops a zero score for components where 0 means "not evaluated".
pub fn apply_absence_policy(component: ComponentKind, score: Option<f64>) -> Option<f64> {
    let score = score.filter(|value| value.is_finite())?;
    if score == 0.0 && !component.zero_is_observation() {
        return None;
    }
    Some(score.clamp(0.0, 1.0))
}

pub struct ScoreResolver<'a> {
    config: &'a ScoringConfig,
    store: Option<&'a dyn ScoreStore>,
}

impl<'a> ScoreResolver<'a> {
    pub fn new(config: &'a ScoringConfig, store: Option<&'a dyn ScoreStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ScoringConfig {
        self.config
    }

    /// Resolves one component score. Lookup order: recorded final score,
    /// recombined automated and user inputs, metadata field average,
    /// accuracy/quality average, then the score store.
    pub fn component_score<S: ComponentScoreSource + ?Sized>(
        &self,
        source: &S,
        component: ComponentKind,
    ) -> Result<Option<f64>> {
        let multiplier = source.expertise_multiplier();
        let scope = source.store_scope();

        if let Some(metrics) = source.component_metrics(MetricKind::Overall, component) {
            let direct = self.score_from_inputs(&metrics.scores, multiplier)?;
            if let Some(score) = apply_absence_policy(component, direct) {
                return Ok(Some(score));
            }

            if component == ComponentKind::Metadata {
                let field_average =
                    self.metadata_field_average(metrics, multiplier, scope.as_deref())?;
                if let Some(score) = apply_absence_policy(component, field_average) {
                    return Ok(Some(score));
                }
            }
        } else if component == ComponentKind::Metadata {
            let field_average = self.metadata_field_average(
                &ComponentMetrics::default(),
                multiplier,
                scope.as_deref(),
            )?;
            if let Some(score) = apply_absence_policy(component, field_average) {
                return Ok(Some(score));
            }
        }

        let secondary = [MetricKind::Accuracy, MetricKind::Quality]
            .into_iter()
            .filter_map(|metric| source.component_metrics(metric, component))
            .map(|metrics| self.score_from_inputs(&metrics.scores, multiplier))
            .collect::<Result<Vec<Option<f64>>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<f64>>();
        if !secondary.is_empty() {
            if let Some(score) = apply_absence_policy(component, Some(stats::mean(&secondary))) {
                return Ok(Some(score));
            }
        }

        let stored = scope.as_deref().and_then(|scope| {
            self.stored_final_score(&ScoreKey::for_component(
                scope,
                MetricKind::Overall,
                component,
            ))
        });
        Ok(apply_absence_policy(component, stored))
    }

    /// Raw 1-5 user rating recorded for a component, if any.
    pub fn user_rating<S: ComponentScoreSource + ?Sized>(
        &self,
        source: &S,
        component: ComponentKind,
    ) -> Option<f64> {
        let metrics = source.component_metrics(MetricKind::Overall, component)?;
        if let Some(rating) = valid_rating(metrics.scores.user_rating) {
            return Some(rating);
        }
        if component != ComponentKind::Metadata {
            return None;
        }

        let field_ratings = MetadataField::ALL
            .iter()
            .filter_map(|field| metrics.fields.get(field))
            .filter_map(|inputs| valid_rating(inputs.user_rating))
            .collect::<Vec<f64>>();
        if field_ratings.is_empty() {
            None
        } else {
            Some(stats::mean(&field_ratings))
        }
    }

    fn score_from_inputs(&self, inputs: &ScoreInputs, multiplier: f64) -> Result<Option<f64>> {
        if let Some(final_score) = inputs.final_score.filter(|value| value.is_finite()) {
            return Ok(Some(final_score.clamp(0.0, 1.0)));
        }

        let automated = inputs.automated_score.filter(|value| value.is_finite());
        let rating = valid_rating(inputs.user_rating);
        match (automated, rating) {
            (Some(automated), Some(rating)) => {
                let combined = combine_scores(automated, rating, multiplier, self.config)?;
                Ok(Some(combined.final_score))
            }
            (Some(automated), None) => Ok(Some(automated.clamp(0.0, 1.0))),
            (None, Some(rating)) => Ok(Some(rating / MAX_USER_RATING)),
            (None, None) => Ok(None),
        }
    }

    fn metadata_field_average(
        &self,
        metrics: &ComponentMetrics,
        multiplier: f64,
        scope: Option<&str>,
    ) -> Result<Option<f64>> {
        let mut field_scores = Vec::<f64>::new();
        for field in MetadataField::ALL {
            let from_inputs = match metrics.fields.get(&field) {
                Some(inputs) => self.score_from_inputs(inputs, multiplier)?,
                None => None,
            };
            let score = from_inputs.or_else(|| {
                scope.and_then(|scope| {
                    self.stored_final_score(&ScoreKey::new(
                        scope,
                        MetricKind::Overall,
                        ComponentKind::Metadata,
                        field.as_str(),
                    ))
                })
            });
            if let Some(score) = score.filter(|value| *value > 0.0) {
                field_scores.push(score);
            }
        }

        if field_scores.is_empty() {
            Ok(None)
        } else {
            Ok(Some(stats::mean(&field_scores)))
        }
    }

    fn stored_final_score(&self, key: &ScoreKey) -> Option<f64> {
        let store = self.store?;
        match store.get(key) {
            Ok(score) => score.map(|value| value.final_score),
            Err(err) => {
                warn!(key = %key.storage_key(), error = %err, "score store lookup failed");
                None
            }
        }
    }
}

fn valid_rating(rating: Option<f64>) -> Option<f64> {
    rating
        .filter(|value| value.is_finite() && *value > 0.0)
        .map(|value| value.min(MAX_USER_RATING))
}
