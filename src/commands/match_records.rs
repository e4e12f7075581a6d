use anyhow::{Result, bail};
use serde_json::Value;
use tracing::info;

use super::emit_json;
use crate::cli::MatchArgs;
use crate::matching::{MatchInputs, SourceCounts};
use crate::model::{EvaluationRecord, GroundTruthRecord, SystemOutput};
use crate::util::{read_json, read_json_records};

pub fn load_inputs(args: &MatchArgs) -> Result<MatchInputs> {
    if let Some(path) = args.integrated.as_deref() {
        let data: Value = read_json(path)?;
        return Ok(MatchInputs::from_integrated_value(&data));
    }

    let Some(records_path) = args.records.as_deref() else {
        bail!("either --integrated or --records must be provided");
    };

    let (ground_truth, malformed_truth) = match args.ground_truth.as_deref() {
        Some(path) => read_json_records::<GroundTruthRecord>(path, "ground truth")?,
        None => (Vec::new(), 0),
    };
    let (system_outputs, malformed_outputs) = match args.system_output.as_deref() {
        Some(path) => read_json_records::<SystemOutput>(path, "system output")?,
        None => (Vec::new(), 0),
    };
    let (evaluations, malformed_evaluations) =
        read_json_records::<EvaluationRecord>(records_path, "evaluation")?;

    Ok(MatchInputs {
        ground_truth,
        system_outputs,
        evaluations,
        malformed: SourceCounts {
            ground_truth: malformed_truth,
            system_output: malformed_outputs,
            user_evaluations: malformed_evaluations,
        },
    })
}

pub fn run(args: MatchArgs) -> Result<()> {
    let inputs = load_inputs(&args)?;
    let report = inputs.report();

    info!(
        entries = report.total_entries,
        complete = report.complete,
        two_way = report.two_way,
        one_source = report.one_source,
        orphans = report.orphans.total(),
        unidentified_evaluations = report.unidentified.user_evaluations,
        malformed = report.malformed.total(),
        "three-way match complete"
    );
    emit_json(args.output.as_deref(), &report)
}
