use super::*;
use crate::config::ScoringConfig;
use crate::model::{ComponentKind, ComponentMetrics, ScoreInputs};

fn ground_truth(doi: Option<&str>, paper_id: Option<&str>, title: &str) -> GroundTruthRecord {
    GroundTruthRecord {
        paper_id: paper_id.map(ToOwned::to_owned),
        paper: PaperSnapshot {
            title: Some(title.to_string()),
            doi: doi.map(ToOwned::to_owned),
            ..PaperSnapshot::default()
        },
    }
}

fn system_output(doi: Option<&str>, paper_id: Option<&str>) -> SystemOutput {
    SystemOutput {
        paper_id: paper_id.map(ToOwned::to_owned),
        paper: PaperSnapshot {
            doi: doi.map(ToOwned::to_owned),
            ..PaperSnapshot::default()
        },
        ..SystemOutput::default()
    }
}

fn entry_with_key<'i, 'a>(index: &'i MatchIndex<'a>, key: &str) -> Option<&'i MatchEntry<'a>> {
    index.entries().find(|entry| entry.keys.contains(key))
}

fn keys_of(results: &[&MatchEntry<'_>]) -> Vec<String> {
    results
        .iter()
        .map(|entry| entry.primary_key().to_string())
        .collect()
}

fn evaluation(paper_id: &str, template_score: f64) -> EvaluationRecord {
    let mut record = EvaluationRecord {
        evaluator_id: Some("e1".to_string()),
        paper_id: Some(paper_id.to_string()),
        ..EvaluationRecord::default()
    };
    record.evaluation_metrics.overall.insert(
        ComponentKind::Template,
        ComponentMetrics {
            scores: ScoreInputs {
                final_score: Some(template_score),
                ..ScoreInputs::default()
            },
            ..ComponentMetrics::default()
        },
    );
    record
}

#[test]
fn identifiers_normalize_resolver_prefix_and_case() {
    assert_eq!(
        normalize_identifier("HTTPS://DX.DOI.ORG/10.1/ABC"),
        normalize_identifier("10.1/abc")
    );
    assert_eq!(normalize_identifier(" http://doi.org/10.5/Q "), "10.5/q");
    assert_eq!(doi_key("   "), None);
    assert_eq!(paper_id_key("R123").as_deref(), Some("id:R123"));
    assert_eq!(
        identifier_keys(Some("10.1/X"), Some("R1")).into_iter().collect::<Vec<_>>(),
        vec!["doi:10.1/x".to_string(), "id:R1".to_string()]
    );
}

#[test]
fn ground_truth_and_system_output_with_same_doi_form_one_entry() {
    let truth = vec![ground_truth(Some("10.1/x"), None, "Paper X")];
    let system = vec![system_output(Some("10.1/X"), None)];
    let index = MatchIndex::build(&truth, &system, &[]);

    assert_eq!(index.len(), 1);
    let report = index.report();
    assert_eq!(report.two_way, 1);
    assert_eq!(report.orphans.total(), 0);
    assert_eq!(report.entries[0].classification, MatchClass::TwoWay);
    assert_eq!(report.entries[0].title.as_deref(), Some("Paper X"));
}

#[test]
fn classifications_add_up_to_indexed_entries() {
    let truth = vec![
        ground_truth(Some("10.1/a"), Some("p-a"), "A"),
        ground_truth(Some("10.1/b"), None, "B"),
    ];
    let system = vec![
        system_output(Some("10.1/a"), None),
        system_output(None, Some("p-c")),
    ];
    let evaluations = vec![evaluation("p-a", 0.8), evaluation("p-d", 0.4)];
    let index = MatchIndex::build(&truth, &system, &evaluations);
    let report = index.report();

    assert_eq!(report.complete, 1);
    assert_eq!(report.two_way, 0);
    assert_eq!(report.one_source, 3);
    assert_eq!(
        report.complete + report.two_way + report.one_source,
        report.total_entries
    );
    assert_eq!(report.orphans.ground_truth_only, vec!["doi:10.1/b".to_string()]);
    assert_eq!(report.orphans.system_output_only, vec!["id:p-c".to_string()]);
    assert_eq!(report.orphans.user_evaluation_only, vec!["id:p-d".to_string()]);
}

#[test]
fn a_record_carrying_both_keys_bridges_separate_entries() {
    let truth = vec![ground_truth(Some("10.1/z"), None, "Z")];
    let system = vec![system_output(None, Some("p-z"))];
    let mut bridge = evaluation("p-z", 0.6);
    bridge.paper = Some(PaperSnapshot {
        doi: Some("https://doi.org/10.1/Z".to_string()),
        ..PaperSnapshot::default()
    });
    let evaluations = vec![bridge];
    let index = MatchIndex::build(&truth, &system, &evaluations);

    assert_eq!(index.len(), 1);
    let entry = entry_with_key(&index, "doi:10.1/z").expect("entry reachable by doi");
    assert_eq!(entry.classification(), MatchClass::Complete);
    assert!(entry_with_key(&index, "id:p-z").is_some());
    assert_eq!(entry.primary_key(), "doi:10.1/z");
}

#[test]
fn duplicates_and_unidentified_records_are_counted() {
    let truth = vec![
        ground_truth(Some("10.1/a"), None, "first"),
        ground_truth(Some("10.1/A"), None, "second"),
        ground_truth(None, None, "nameless"),
    ];
    let mut anonymous = evaluation("x", 0.5);
    anonymous.paper_id = None;
    let evaluations = vec![anonymous];
    let index = MatchIndex::build(&truth, &[], &evaluations);
    let report = index.report();

    assert_eq!(index.len(), 1);
    assert_eq!(report.duplicates.ground_truth, 1);
    assert_eq!(report.unidentified.ground_truth, 1);
    assert_eq!(report.unidentified.user_evaluations, 1);
    assert_eq!(report.entries[0].title.as_deref(), Some("first"));
}

#[test]
fn integrated_export_flattens_into_match_inputs() {
    let data = IntegratedData {
        papers: vec![crate::model::IntegratedPaper {
            ground_truth: Some(ground_truth(None, Some("p1"), "One")),
            system_output: Some(system_output(None, Some("p1"))),
            user_evaluations: vec![evaluation("p1", 0.7), evaluation("p1", 0.9)],
        }],
    };
    let inputs = MatchInputs::from_integrated(data);
    let index = inputs.index();

    assert_eq!(inputs.evaluations.len(), 2);
    let entry = entry_with_key(&index, "id:p1").expect("entry");
    assert_eq!(entry.classification(), MatchClass::Complete);
    assert_eq!(entry.user_evaluations.len(), 2);
}

#[test]
fn search_matches_text_and_applies_filters() {
    let mut truth = vec![
        ground_truth(Some("10.1/a"), Some("p-a"), "Knowledge Graph Curation"),
        ground_truth(Some("10.1/b"), Some("p-b"), "Protein Folding"),
    ];
    truth[0].paper.year = Some(2021);
    truth[0].paper.research_field = Some("Computer Science".to_string());
    truth[1].paper.year = Some(2018);
    let evaluations = vec![evaluation("p-a", 0.8), evaluation("p-b", 0.3)];
    let index = MatchIndex::build(&truth, &[], &evaluations);

    let config = ScoringConfig::default();
    let resolver = ScoreResolver::new(&config, None);

    let everything = search_entries(&index, None);
    assert_eq!(everything.len(), 2);

    let graph = search_entries(&index, Some("  GRAPH "));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph[0].title(), Some("Knowledge Graph Curation"));

    let by_doi = search_entries(&index, Some("10.1/B"));
    assert_eq!(by_doi.len(), 1);
    assert_eq!(by_doi[0].title(), Some("Protein Folding"));

    let recent = apply_filters(
        everything.clone(),
        &SearchFilter {
            year_min: Some(2020),
            ..SearchFilter::default()
        },
        &resolver,
    );
    assert_eq!(recent.len(), 1);

    let accurate = apply_filters(
        everything.clone(),
        &SearchFilter {
            min_accuracy: Some(0.5),
            has_user_evaluations: Some(true),
            ..SearchFilter::default()
        },
        &resolver,
    );
    assert_eq!(accurate.len(), 1);
    assert_eq!(accurate[0].primary_key(), "doi:10.1/a");

    let by_field = apply_filters(
        everything,
        &SearchFilter {
            research_field: Some("computer".to_string()),
            ..SearchFilter::default()
        },
        &resolver,
    );
    assert_eq!(by_field.len(), 1);

    let hit = search_hit(accurate[0], &resolver);
    assert_eq!(hit.accuracy, Some(0.8));
    assert_eq!(hit.year, Some(2021));
    assert_eq!(hit.classification, MatchClass::TwoWay);
    assert_eq!(count_by_classification(&accurate).get("two-way"), Some(&1));
}

fn searchable_index_inputs() -> Vec<GroundTruthRecord> {
    let mut truth = vec![
        ground_truth(Some("10.1/a"), Some("p-a"), "Scholarly Graphs"),
        ground_truth(Some("10.1/ab"), Some("p-ab"), "Citation Networks"),
        ground_truth(None, Some("p-c"), "Soil Chemistry"),
    ];
    truth[0].paper.authors = vec!["Ada Lovelace".to_string()];
    truth[1].paper.venue = Some("Semantic Web Journal".to_string());
    truth[2].paper.research_problem = Some("Nitrogen retention in clay".to_string());
    truth[2].paper.research_field = Some("Geoscience".to_string());
    truth
}

#[test]
fn search_term_that_is_a_doi_still_returns_every_substring_match() {
    let truth = searchable_index_inputs();
    let index = MatchIndex::build(&truth, &[], &[]);

    let hits = search_entries(&index, Some("10.1/a"));
    assert_eq!(
        keys_of(&hits),
        vec!["doi:10.1/a".to_string(), "doi:10.1/ab".to_string()]
    );
}

#[test]
fn search_reaches_authors_venue_field_and_problem() {
    let truth = searchable_index_inputs();
    let index = MatchIndex::build(&truth, &[], &[]);

    assert_eq!(keys_of(&search_entries(&index, Some("lovelace"))), vec!["doi:10.1/a"]);
    assert_eq!(keys_of(&search_entries(&index, Some("semantic web"))), vec!["doi:10.1/ab"]);
    assert_eq!(keys_of(&search_entries(&index, Some("NITROGEN"))), vec!["id:p-c"]);
    assert_eq!(keys_of(&search_entries(&index, Some("geoscience"))), vec!["id:p-c"]);
    assert_eq!(search_entries(&index, Some("network")).len(), 1);
    assert_eq!(search_entries(&index, Some("s")).len(), 3);
}

#[test]
fn search_ignores_internal_identifier_prefixes() {
    let truth = searchable_index_inputs();
    let index = MatchIndex::build(&truth, &[], &[]);

    assert!(search_entries(&index, Some("doi")).is_empty());
    assert!(search_entries(&index, Some("id:")).is_empty());
    assert!(search_entries(&index, Some("p-ab")).is_empty());
}

#[test]
fn integrated_value_keeps_sources_that_parse() {
    let raw = serde_json::json!({
        "papers": [
            {
                "groundTruth": { "paperId": "p1", "title": "One", "year": "soon" },
                "systemOutput": { "paperId": "p1" },
                "userEvaluations": [
                    { "evaluatorId": "e1", "paperId": "p1" },
                    { "evaluatorId": ["not", "a", "string"] },
                    {
                        "evaluatorId": "e2",
                        "paperId": "p1",
                        "evaluationMetrics": { "overall": { "novelty": { "finalScore": 0.5 } } }
                    }
                ]
            },
            "stray",
            { "groundTruth": null, "userEvaluations": [{ "paperId": "p2" }] }
        ]
    });
    let inputs = MatchInputs::from_integrated_value(&raw);

    assert_eq!(inputs.ground_truth.len(), 0);
    assert_eq!(inputs.system_outputs.len(), 1);
    assert_eq!(inputs.evaluations.len(), 3);
    assert_eq!(
        inputs.malformed,
        SourceCounts {
            ground_truth: 1,
            system_output: 0,
            user_evaluations: 1,
        }
    );

    let report = inputs.report();
    assert_eq!(report.total_entries, 2);
    assert_eq!(report.malformed.total(), 2);
    assert_eq!(report.two_way, 1);
}
