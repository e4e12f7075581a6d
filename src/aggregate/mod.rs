use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DifficultyThresholds, EngineConfig, ReliabilityConfig, ScoringConfig};
use crate::matching::normalize_identifier;
use crate::model::{ComponentKind, EvaluationRecord, PaperSnapshot, SystemDataMap, SystemOutput};
use crate::reliability::{
    Consensus, Disagreement, DisagreementKind, WeightedRating, consensus, detect_disagreement,
    fleiss_kappa, pairwise_agreement, simplified_icc,
};
use crate::scoring::{
    ExpertiseProfile, MAX_USER_RATING, ScoreResolver, combine_weighted_components,
    fold_weighted_components, resolve_expertise,
};
use crate::stats::{self, DistributionBin, ScoreStatistics};
use crate::store::ScoreStore;
use crate::util::{calendar_date, round5, sha256_json};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

mod components;
mod correlations;
mod enrich;
mod evaluators;
mod extract;
mod global;
mod papers;
mod temporal;
#[cfg(test)]
mod tests;
mod types;

pub use components::*;
pub use correlations::*;
pub use enrich::*;
pub use evaluators::*;
pub use extract::*;
pub use global::*;
pub use papers::*;
pub use temporal::*;
pub use types::*;

/// Everything an aggregation run reads besides the evaluation records.
#[derive(Clone, Copy)]
pub struct AggregationContext<'a> {
    pub config: &'a EngineConfig,
    pub system_data: Option<&'a SystemDataMap>,
    pub store: Option<&'a dyn ScoreStore>,
    /// Input records that failed to deserialize and never reached the engine.
    pub malformed_records: usize,
}

impl<'a> AggregationContext<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            system_data: None,
            store: None,
            malformed_records: 0,
        }
    }

    pub fn with_system_data(mut self, system_data: &'a SystemDataMap) -> Self {
        self.system_data = Some(system_data);
        self
    }

    pub fn with_store(mut self, store: &'a dyn ScoreStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_malformed_records(mut self, malformed_records: usize) -> Self {
        self.malformed_records = malformed_records;
        self
    }
}

/// Groups scored records by a string key, preserving input order per group.
fn group_by<'s, 'r, F>(
    records: &'s [ScoredRecord<'r>],
    key: F,
) -> BTreeMap<String, Vec<&'s ScoredRecord<'r>>>
where
    F: for<'x> Fn(&'x ScoredRecord<'r>) -> &'x str,
{
    let mut groups = BTreeMap::<String, Vec<&ScoredRecord>>::new();
    for record in records {
        groups.entry(key(record).to_string()).or_default().push(record);
    }
    groups
}

/// Turns raw evaluation records into the full aggregation. Pure apart from
/// logging: identical inputs produce identical output, `inputHash` included.
pub fn aggregate_all(
    records: &[EvaluationRecord],
    context: AggregationContext<'_>,
) -> Result<Aggregation> {
    let config = context.config;
    let received = records.len() + context.malformed_records;
    let input_hash = sha256_json(&(records, context.system_data, config))?;

    let (enriched, enriched_count) = match context.system_data {
        Some(system_data) => enrich_records(records, system_data, &config.scoring),
        None => (records.to_vec(), 0),
    };

    let resolver = ScoreResolver::new(&config.scoring, context.store);
    let mut diagnostics = ExtractionDiagnostics::default();
    let scored = enriched
        .iter()
        .filter_map(|record| {
            let scored = score_record(record, &resolver, &mut diagnostics);
            if scored.is_none() {
                debug!(
                    evaluator = %record.evaluator_key(),
                    "skipping evaluation without a paper identifier"
                );
            }
            scored
        })
        .collect::<Vec<ScoredRecord>>();

    if scored.is_empty() {
        info!(records = received, "no evaluations could be aggregated");
        return Ok(Aggregation::empty(config, input_hash, received));
    }

    let by_paper = group_by(&scored, |record| record.paper_id.as_str());
    let by_evaluator = group_by(&scored, |record| record.evaluator_id.as_str());

    let papers = build_paper_aggregates(&by_paper, config);
    let evaluators = build_evaluator_aggregates(&by_evaluator);
    let components = build_component_aggregates(&scored);
    let global_stats = build_global_stats(&scored, &papers, &evaluators);
    let temporal = build_temporal_activity(&scored);
    let correlations = build_correlation_matrix(&papers);
    let reliability = summarize_reliability(&by_paper, &papers);

    info!(
        records = received,
        malformed = context.malformed_records,
        scored = scored.len(),
        papers = papers.len(),
        evaluators = evaluators.len(),
        enriched = enriched_count,
        fallbacks = diagnostics.computation_fallbacks,
        "aggregation complete"
    );

    Ok(Aggregation {
        papers,
        evaluators,
        components,
        global_stats,
        temporal,
        correlations,
        reliability,
        metadata: AggregationMetadata {
            engine_version: ENGINE_VERSION.to_string(),
            input_hash,
            record_count: received,
            scored_record_count: scored.len(),
            skipped_records: received - scored.len(),
            enriched_records: enriched_count,
            computation_fallbacks: diagnostics.computation_fallbacks,
            config: config.clone(),
        },
    })
}
