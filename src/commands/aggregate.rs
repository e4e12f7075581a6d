use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::emit_json;
use crate::aggregate::{Aggregation, AggregationContext, aggregate_all};
use crate::cli::AggregateArgs;
use crate::config::load_config;
use crate::model::{EvaluationRecord, SystemDataMap, SystemOutput};
use crate::store::{ScoreStore, SqliteScoreStore};
use crate::util::{now_utc_string, read_json_record_map, read_json_records};

const REPORT_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub report_version: String,
    pub generated_at: String,
    pub aggregation: Aggregation,
}

pub fn build_report(
    records: &[EvaluationRecord],
    context: AggregationContext<'_>,
) -> Result<AggregationReport> {
    Ok(AggregationReport {
        report_version: REPORT_VERSION.to_string(),
        generated_at: now_utc_string(),
        aggregation: aggregate_all(records, context)?,
    })
}

pub fn run(args: AggregateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let (records, malformed) =
        read_json_records::<EvaluationRecord>(&args.records, "evaluation")?;
    let (system_data, malformed_outputs) = match args.system_data.as_deref() {
        Some(path) => {
            let (map, skipped) = read_json_record_map::<SystemOutput>(path, "system output")?;
            (Some(map), skipped)
        }
        None => (None, 0),
    };
    let store = args
        .score_db
        .as_deref()
        .map(SqliteScoreStore::open)
        .transpose()?;

    info!(
        records = records.len(),
        malformed,
        system_outputs = system_data.as_ref().map(SystemDataMap::len).unwrap_or(0),
        malformed_outputs,
        "aggregation requested"
    );
    if let Some(store) = &store {
        info!(entries = store.len()?, "score store opened");
    }

    let mut context = AggregationContext::new(&config).with_malformed_records(malformed);
    if let Some(system_data) = system_data.as_ref() {
        context = context.with_system_data(system_data);
    }
    if let Some(store) = store.as_ref() {
        context = context.with_store(store as &dyn ScoreStore);
    }
    let report = build_report(&records, context)?;

    info!(
        papers = report.aggregation.global_stats.total_papers,
        evaluators = report.aggregation.global_stats.total_evaluators,
        skipped = report.aggregation.metadata.skipped_records,
        input_hash = %report.aggregation.metadata.input_hash,
        "aggregation report ready"
    );
    emit_json(args.output.as_deref(), &report)
}
