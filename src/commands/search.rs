use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::SearchArgs;
use crate::config::load_config;
use crate::matching::{
    MatchInputs, SearchFilter, SearchHit, apply_filters, count_by_classification, search_entries,
    search_hit,
};
use crate::scoring::ScoreResolver;
use crate::util::{read_json, write_json_stdout};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    term: Option<String>,
    returned: usize,
    by_classification: BTreeMap<&'static str, usize>,
    hits: Vec<SearchHit>,
}

pub fn filter_from_args(args: &SearchArgs) -> SearchFilter {
    SearchFilter {
        research_field: args.research_field.clone(),
        venue: args.venue.clone(),
        year_min: args.year_min,
        year_max: args.year_max,
        has_ground_truth: args.has_ground_truth,
        has_system_output: args.has_system_output,
        has_user_evaluations: args.has_evaluations,
        min_accuracy: args.min_accuracy,
        max_accuracy: args.max_accuracy,
    }
}

pub fn run(args: SearchArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let data: Value = read_json(&args.integrated)?;
    let inputs = MatchInputs::from_integrated_value(&data);
    let index = inputs.index();
    if index.is_empty() {
        warn!(
            malformed = inputs.malformed.total(),
            "integrated export holds no identifiable papers"
        );
    }
    let resolver = ScoreResolver::new(&config.scoring, None);

    let filter = filter_from_args(&args);
    let results = apply_filters(
        search_entries(&index, args.term.as_deref()),
        &filter,
        &resolver,
    );
    let by_classification = count_by_classification(&results);
    let hits = results
        .iter()
        .map(|entry| search_hit(entry, &resolver))
        .collect::<Vec<SearchHit>>();

    info!(
        term = %args.term.clone().unwrap_or_default(),
        indexed = index.len(),
        returned = hits.len(),
        "search complete"
    );

    if args.json {
        write_json_stdout(&SearchResponse {
            term: args.term.clone(),
            returned: hits.len(),
            by_classification,
            hits,
        })
    } else {
        write_text_response(args.term.as_deref(), &by_classification, &hits)
    }
}

fn write_text_response(
    term: Option<&str>,
    by_classification: &BTreeMap<&'static str, usize>,
    hits: &[SearchHit],
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Term: {}", term.unwrap_or("*"))?;
    let summary = by_classification
        .iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect::<Vec<String>>()
        .join(" ");
    writeln!(output, "Results: {} ({summary})", hits.len())?;

    for (rank, hit) in hits.iter().enumerate() {
        writeln!(
            output,
            "{}. [{}] {}",
            rank + 1,
            hit.key,
            hit.title.as_deref().unwrap_or("(untitled)")
        )?;
        if let Some(venue) = hit.venue.as_deref() {
            writeln!(output, "\tvenue: {venue}")?;
        }
        if let Some(year) = hit.year {
            writeln!(output, "\tyear: {year}")?;
        }
        if let Some(field) = hit.research_field.as_deref() {
            writeln!(output, "\tresearch_field: {field}")?;
        }
        writeln!(
            output,
            "\tevaluations: {} accuracy: {}",
            hit.user_evaluation_count,
            hit.accuracy
                .map(|value| format!("{value:.3}"))
                .unwrap_or_else(|| "n/a".to_string())
        )?;
    }

    output.flush()?;
    Ok(())
}
