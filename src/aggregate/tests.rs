use super::*;
use crate::model::{
    ComponentMetrics, ContentAnalysis, ScoreInputs, SupplementaryRatings, UserInfo,
};

fn evaluator(id: &str, paper: &str, weight: f64) -> EvaluationRecord {
    EvaluationRecord {
        evaluator_id: Some(id.to_string()),
        paper_id: Some(paper.to_string()),
        timestamp: Some("2024-03-01T10:00:00Z".to_string()),
        user_info: UserInfo {
            role: Some("PhD Student".to_string()),
            expertise_weight: Some(weight),
            ..UserInfo::default()
        },
        ..EvaluationRecord::default()
    }
}

fn with_final(mut record: EvaluationRecord, component: ComponentKind, score: f64) -> EvaluationRecord {
    record.evaluation_metrics.overall.insert(
        component,
        ComponentMetrics {
            scores: ScoreInputs {
                final_score: Some(score),
                ..ScoreInputs::default()
            },
            ..ComponentMetrics::default()
        },
    );
    record
}

fn with_rating(mut record: EvaluationRecord, component: ComponentKind, rating: f64) -> EvaluationRecord {
    record
        .evaluation_metrics
        .overall
        .entry(component)
        .or_default()
        .scores
        .user_rating = Some(rating);
    record
}

fn aggregate(records: &[EvaluationRecord]) -> Aggregation {
    let config = EngineConfig::default();
    aggregate_all(records, AggregationContext::new(&config)).expect("aggregation succeeds")
}

#[test]
fn empty_input_returns_the_empty_shape() {
    let aggregation = aggregate(&[]);

    assert!(aggregation.papers.is_empty());
    assert!(aggregation.evaluators.is_empty());
    assert!(aggregation.temporal.is_empty());
    assert_eq!(aggregation.global_stats.total_evaluations, 0);
    assert_eq!(aggregation.global_stats.total_papers, 0);
    assert_eq!(aggregation.components.len(), ComponentKind::ALL.len());
    assert!(
        aggregation
            .components
            .values()
            .all(|component| component.evaluation_count == 0)
    );
    assert!(
        aggregation
            .global_stats
            .score_distribution
            .iter()
            .all(|bin| bin.count == 0)
    );
    assert_eq!(aggregation.metadata.record_count, 0);
    assert_eq!(aggregation.metadata.input_hash.len(), 64);
}

#[test]
fn records_without_a_paper_identifier_are_skipped() {
    let mut orphan = with_final(evaluator("e1", "p1", 3.0), ComponentKind::Template, 0.5);
    orphan.paper_id = None;

    let aggregation = aggregate(&[orphan]);
    assert!(aggregation.papers.is_empty());
    assert_eq!(aggregation.metadata.record_count, 1);
    assert_eq!(aggregation.metadata.skipped_records, 1);
}

#[test]
fn paper_statistics_keep_scores_and_weights_aligned() {
    let strong = with_final(
        with_final(evaluator("e1", "p1", 4.0), ComponentKind::Metadata, 0.8),
        ComponentKind::Template,
        0.6,
    );
    let weak = with_final(
        with_final(evaluator("e2", "p1", 1.0), ComponentKind::Metadata, 0.4),
        ComponentKind::Template,
        0.2,
    );
    // A heavy rater without any score must not shift the weighted mean.
    let silent = evaluator("e3", "p1", 5.0);

    let aggregation = aggregate(&[strong, weak, silent]);
    let paper = aggregation.papers.get("p1").expect("paper aggregated");

    assert_eq!(paper.evaluation_count, 3);
    assert_eq!(paper.overall.count, 2);
    assert_eq!(paper.overall.mean, 0.5);
    assert_eq!(paper.overall.weighted_mean, 0.62);
    assert_eq!(paper.difficulty, Some(Difficulty::Medium));

    let metadata = paper
        .components
        .get(&ComponentKind::Metadata)
        .expect("metadata stats");
    assert_eq!(metadata.mean, 0.6);
    assert_eq!(metadata.weighted_mean, 0.72);

    assert_eq!(paper.reliability.rater_count, 3);
    assert_eq!(paper.reliability.pairwise_agreement, Some(0.0));
    assert_eq!(paper.reliability.icc, Some(0.84));
    assert_eq!(paper.evaluators.len(), 3);
    assert_eq!(aggregation.reliability.papers_with_multiple_raters, 1);
    assert_eq!(aggregation.global_stats.scored_evaluations, 2);
}

#[test]
fn zero_scores_follow_the_absence_policy() {
    let record = with_final(
        with_final(evaluator("e1", "p1", 3.0), ComponentKind::ResearchField, 0.0),
        ComponentKind::Content,
        0.0,
    );

    let aggregation = aggregate(&[record]);
    let coverage = &aggregation.global_stats.component_coverage;
    assert_eq!(coverage.get(&ComponentKind::ResearchField), Some(&0.0));
    assert_eq!(coverage.get(&ComponentKind::Content), Some(&1.0));

    let content = &aggregation.components[&ComponentKind::Content];
    assert_eq!(content.evaluation_count, 1);
    assert_eq!(content.statistics.mean, 0.0);
    assert_eq!(
        aggregation.components[&ComponentKind::ResearchField].evaluation_count,
        0
    );
}

#[test]
fn difficulty_follows_the_mean_overall_score() {
    let hard = with_final(evaluator("e1", "hard", 3.0), ComponentKind::Template, 0.3);
    let easy = with_final(evaluator("e1", "easy", 3.0), ComponentKind::Template, 0.9);

    let aggregation = aggregate(&[hard, easy]);
    assert_eq!(aggregation.papers["hard"].difficulty, Some(Difficulty::Hard));
    assert_eq!(aggregation.papers["easy"].difficulty, Some(Difficulty::Easy));
}

#[test]
fn supplementary_ratings_stand_in_for_missing_components() {
    let mut record = evaluator("e1", "p1", 3.0);
    record.supplementary_ratings = Some(SupplementaryRatings {
        overall: Some(4.0),
        clarity: Some(3.0),
        ..SupplementaryRatings::default()
    });

    let aggregation = aggregate(&[record]);
    assert_eq!(aggregation.papers["p1"].overall.mean, 0.7);
}

#[test]
fn evaluator_consistency_and_expertise_distribution() {
    let first = with_final(evaluator("e1", "p1", 3.0), ComponentKind::Template, 0.6);
    let second = with_final(evaluator("e1", "p2", 3.0), ComponentKind::Template, 0.6);
    let mut unnamed = with_final(evaluator("e2", "p1", 2.0), ComponentKind::Template, 0.4);
    unnamed.user_info.role = None;

    let aggregation = aggregate(&[first, second, unnamed]);
    let steady = &aggregation.evaluators["e1"];
    assert_eq!(steady.performance.evaluation_count, 2);
    assert_eq!(steady.consistency, 1.0);
    assert_eq!(steady.papers_evaluated, vec!["p1".to_string(), "p2".to_string()]);

    let roles = &aggregation.global_stats.expertise_distribution.by_role;
    assert_eq!(roles.get("phd student"), Some(&1));
    assert_eq!(roles.get("unspecified"), Some(&1));
    assert_eq!(aggregation.global_stats.total_evaluators, 2);

    assert_eq!(consistency_score(0.0, 0.2), 0.0);
    assert_eq!(consistency_score(0.5, 1.0), 0.0);
    assert_eq!(consistency_score(0.5, 0.1), 0.8);
}

#[test]
fn temporal_activity_is_bucketed_by_day_in_order() {
    let mut late = with_final(evaluator("e1", "p1", 3.0), ComponentKind::Template, 0.8);
    late.timestamp = Some("2024-03-02T09:00:00Z".to_string());
    let mut early = with_final(evaluator("e2", "p1", 3.0), ComponentKind::Template, 0.4);
    early.timestamp = Some("2024-03-01T23:59:00Z".to_string());
    let mut also_early = with_final(evaluator("e3", "p2", 3.0), ComponentKind::Template, 0.6);
    also_early.timestamp = Some("2024-03-01T08:00:00Z".to_string());
    let mut undated = with_final(evaluator("e4", "p2", 3.0), ComponentKind::Template, 0.6);
    undated.timestamp = Some("yesterday".to_string());

    let temporal = aggregate(&[late, early, also_early, undated]).temporal;
    assert_eq!(temporal.len(), 2);
    assert_eq!(temporal[0].date, "2024-03-01");
    assert_eq!(temporal[0].evaluation_count, 2);
    assert_eq!(temporal[0].mean_score, 0.5);
    assert_eq!(temporal[1].date, "2024-03-02");
    assert_eq!(temporal[1].evaluation_count, 1);
}

#[test]
fn correlations_use_only_papers_scoring_both_components() {
    let records = [("p1", 0.2, 0.3), ("p2", 0.5, 0.6), ("p3", 0.8, 0.9)]
        .into_iter()
        .map(|(paper, metadata, template)| {
            with_final(
                with_final(evaluator("e1", paper, 3.0), ComponentKind::Metadata, metadata),
                ComponentKind::Template,
                template,
            )
        })
        .collect::<Vec<EvaluationRecord>>();

    let matrix = aggregate(&records).correlations;
    let metadata_row = &matrix.coefficients[&ComponentKind::Metadata];
    assert_eq!(metadata_row[&ComponentKind::Template], 1.0);
    assert_eq!(metadata_row[&ComponentKind::Metadata], 1.0);
    assert_eq!(metadata_row[&ComponentKind::ResearchField], 0.0);
    assert_eq!(
        matrix.paired_papers[&ComponentKind::Metadata][&ComponentKind::Template],
        3
    );
    assert_eq!(
        matrix.paired_papers[&ComponentKind::Metadata][&ComponentKind::ResearchField],
        0
    );
}

#[test]
fn failed_derivations_fall_back_and_are_counted() {
    let mut config = EngineConfig::default();
    config.scoring.min_automated_weight = 0.0;
    config.scoring.automated_weight_base = 0.0;

    let mut record = evaluator("e1", "p1", 3.0);
    record.user_info.expertise_multiplier = Some(0.0);
    record.evaluation_metrics.overall.insert(
        ComponentKind::Template,
        ComponentMetrics {
            scores: ScoreInputs {
                automated_score: Some(0.6),
                user_rating: Some(3.0),
                final_score: None,
            },
            ..ComponentMetrics::default()
        },
    );

    let aggregation = aggregate_all(&[record], AggregationContext::new(&config))
        .expect("aggregation succeeds");
    assert_eq!(aggregation.metadata.computation_fallbacks, 1);
    assert_eq!(aggregation.papers["p1"].overall.mean, 0.5);
}

#[test]
fn system_output_fills_missing_content_scores() {
    let mut system_data = SystemDataMap::new();
    system_data.insert(
        "p1".to_string(),
        SystemOutput {
            paper: PaperSnapshot {
                title: Some("Graph Extraction".to_string()),
                doi: Some("10.1000/xyz".to_string()),
                ..PaperSnapshot::default()
            },
            scores: BTreeMap::from([(ComponentKind::Content, 0.6)]),
            ..SystemOutput::default()
        },
    );

    let config = EngineConfig::default();
    let context = AggregationContext::new(&config).with_system_data(&system_data);
    let aggregation = aggregate_all(&[evaluator("e1", "p1", 3.0)], context)
        .expect("aggregation succeeds");

    assert_eq!(aggregation.metadata.enriched_records, 1);
    let paper = &aggregation.papers["p1"];
    assert_eq!(paper.metadata.title.as_deref(), Some("Graph Extraction"));
    assert_eq!(paper.components[&ComponentKind::Content].mean, 0.6);
}

#[test]
fn content_analysis_combines_with_the_user_rating() {
    let analysis = ContentAnalysis {
        property_scores: BTreeMap::from([("a".to_string(), 0.8), ("b".to_string(), 0.6)]),
        property_weights: BTreeMap::from([("a".to_string(), 1.0), ("b".to_string(), 1.0)]),
    };
    let mut system_data = SystemDataMap::new();
    system_data.insert(
        "sys-1".to_string(),
        SystemOutput {
            paper: PaperSnapshot {
                doi: Some("https://doi.org/10.1000/ABC".to_string()),
                ..PaperSnapshot::default()
            },
            content: Some(analysis.clone()),
            ..SystemOutput::default()
        },
    );

    let mut record = with_rating(evaluator("e1", "p1", 3.0), ComponentKind::Content, 4.0);
    record.paper = Some(PaperSnapshot {
        doi: Some("10.1000/abc".to_string()),
        ..PaperSnapshot::default()
    });
    let found = find_system_output(&record, &system_data).expect("matched by doi");
    assert!(found.content.is_some());

    let config = EngineConfig::default();
    let expected = combine_weighted_components(
        &analysis.property_scores,
        &analysis.property_weights,
        4.0,
        1.0,
        config.scoring.importance_factor,
        &config.scoring,
    )
    .expect("combination succeeds");

    let (enriched, count) = enrich_records(&[record.clone()], &system_data, &config.scoring);
    assert_eq!(count, 1);
    let content = &enriched[0].evaluation_metrics.overall[&ComponentKind::Content];
    assert_eq!(content.scores.automated_score, Some(0.7));
    assert_eq!(content.scores.final_score, Some(expected.final_score));
    assert_eq!(content.scores.user_rating, Some(4.0));

    // Recorded final scores are never overwritten.
    let recorded = with_final(record, ComponentKind::Content, 0.25);
    let (kept, _) = enrich_records(&[recorded], &system_data, &config.scoring);
    assert_eq!(
        kept[0].evaluation_metrics.overall[&ComponentKind::Content]
            .scores
            .final_score,
        Some(0.25)
    );
}

#[test]
fn input_hash_is_stable_for_identical_inputs() {
    let records = vec![with_final(evaluator("e1", "p1", 3.0), ComponentKind::Template, 0.5)];
    let first = aggregate(&records);
    let second = aggregate(&records);
    assert_eq!(first.metadata.input_hash, second.metadata.input_hash);
    assert_eq!(first.papers, second.papers);
}
