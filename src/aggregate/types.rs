use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Hard,
    Medium,
    Easy,
}

impl Difficulty {
    pub fn classify(mean_score: f64, thresholds: &DifficultyThresholds) -> Self {
        if mean_score < thresholds.hard_below {
            Self::Hard
        } else if mean_score > thresholds.easy_above {
            Self::Easy
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributingEvaluator {
    pub evaluator_id: String,
    pub expertise_weight: f64,
    pub overall_score: Option<f64>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaperReliability {
    pub rater_count: usize,
    pub pairwise_agreement: Option<f64>,
    pub icc: Option<f64>,
    pub fleiss_kappa: Option<f64>,
    pub consensus: BTreeMap<ComponentKind, Consensus>,
    pub disagreements: Vec<Disagreement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperAggregate {
    pub paper_id: String,
    pub metadata: PaperSnapshot,
    pub evaluation_count: usize,
    pub overall: ScoreStatistics,
    pub components: BTreeMap<ComponentKind, ScoreStatistics>,
    pub difficulty: Option<Difficulty>,
    pub reliability: PaperReliability,
    pub evaluators: Vec<ContributingEvaluator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorPerformance {
    pub evaluation_count: usize,
    pub scored_evaluations: usize,
    pub mean_score: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorAggregate {
    pub evaluator_id: String,
    pub profile: ExpertiseProfile,
    pub performance: EvaluatorPerformance,
    /// `1 - min(1, std / mean)`; 0 when the evaluator has no positive mean.
    pub consistency: f64,
    pub papers_evaluated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperComponentSummary {
    pub count: usize,
    pub mean: f64,
    pub weighted_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAggregate {
    pub component: ComponentKind,
    pub evaluation_count: usize,
    pub statistics: ScoreStatistics,
    pub distribution: Vec<DistributionBin>,
    pub mean_user_rating: Option<f64>,
    pub by_paper: BTreeMap<String, PaperComponentSummary>,
}

impl ComponentAggregate {
    pub fn empty(component: ComponentKind) -> Self {
        Self {
            component,
            evaluation_count: 0,
            statistics: ScoreStatistics::default(),
            distribution: stats::distribution(&[]),
            mean_user_rating: None,
            by_paper: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpertiseDistribution {
    pub by_role: BTreeMap<String, usize>,
    pub by_level: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_evaluations: usize,
    pub total_papers: usize,
    pub total_evaluators: usize,
    pub scored_evaluations: usize,
    pub mean_overall_score: f64,
    pub score_distribution: Vec<DistributionBin>,
    pub expertise_distribution: ExpertiseDistribution,
    /// Fraction of evaluations that carry a score for the component.
    pub component_coverage: BTreeMap<ComponentKind, f64>,
    /// Mean user rating per component, normalized to [0,1].
    pub component_user_ratings: BTreeMap<ComponentKind, f64>,
}

impl GlobalStats {
    pub fn empty() -> Self {
        Self {
            total_evaluations: 0,
            total_papers: 0,
            total_evaluators: 0,
            scored_evaluations: 0,
            mean_overall_score: 0.0,
            score_distribution: stats::distribution(&[]),
            expertise_distribution: ExpertiseDistribution::default(),
            component_coverage: ComponentKind::ALL
                .iter()
                .map(|component| (*component, 0.0))
                .collect(),
            component_user_ratings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: String,
    pub evaluation_count: usize,
    pub mean_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub coefficients: BTreeMap<ComponentKind, BTreeMap<ComponentKind, f64>>,
    pub paired_papers: BTreeMap<ComponentKind, BTreeMap<ComponentKind, usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilitySummary {
    pub papers_with_multiple_raters: usize,
    pub mean_pairwise_agreement: Option<f64>,
    pub mean_icc: Option<f64>,
    pub fleiss_kappa: Option<f64>,
    pub high_variance_flags: usize,
    pub expertise_split_flags: usize,
    pub flagged_papers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationMetadata {
    pub engine_version: String,
    pub input_hash: String,
    pub record_count: usize,
    pub scored_record_count: usize,
    pub skipped_records: usize,
    pub enriched_records: usize,
    pub computation_fallbacks: usize,
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub papers: BTreeMap<String, PaperAggregate>,
    pub evaluators: BTreeMap<String, EvaluatorAggregate>,
    pub components: BTreeMap<ComponentKind, ComponentAggregate>,
    pub global_stats: GlobalStats,
    pub temporal: Vec<DailyActivity>,
    pub correlations: CorrelationMatrix,
    pub reliability: ReliabilitySummary,
    pub metadata: AggregationMetadata,
}

impl Aggregation {
    /// Shape returned when no record can be aggregated: every count is 0.
    pub fn empty(config: &EngineConfig, input_hash: String, record_count: usize) -> Self {
        Self {
            papers: BTreeMap::new(),
            evaluators: BTreeMap::new(),
            components: ComponentKind::ALL
                .iter()
                .map(|component| (*component, ComponentAggregate::empty(*component)))
                .collect(),
            global_stats: GlobalStats::empty(),
            temporal: Vec::new(),
            correlations: CorrelationMatrix::default(),
            reliability: ReliabilitySummary::default(),
            metadata: AggregationMetadata {
                engine_version: ENGINE_VERSION.to_string(),
                input_hash,
                record_count,
                scored_record_count: 0,
                skipped_records: record_count,
                enriched_records: 0,
                computation_fallbacks: 0,
                config: config.clone(),
            },
        }
    }
}
