use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Metadata,
    ResearchField,
    ResearchProblem,
    Template,
    Content,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        Self::Metadata,
        Self::ResearchField,
        Self::ResearchProblem,
        Self::Template,
        Self::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::ResearchField => "research_field",
            Self::ResearchProblem => "research_problem",
            Self::Template => "template",
            Self::Content => "content",
        }
    }

    /// A score of 0 is a real observation for these components; elsewhere it
    /// means the component was not evaluated.
    pub fn zero_is_observation(self) -> bool {
        matches!(self, Self::ResearchProblem | Self::Content)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "metadata" => Some(Self::Metadata),
            "research_field" | "researchfield" | "field" => Some(Self::ResearchField),
            "research_problem" | "researchproblem" | "problem" => Some(Self::ResearchProblem),
            "template" => Some(Self::Template),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Overall,
    Accuracy,
    Quality,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::Accuracy => "accuracy",
            Self::Quality => "quality",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overall" => Some(Self::Overall),
            "accuracy" => Some(Self::Accuracy),
            "quality" => Some(Self::Quality),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Title,
    Authors,
    Doi,
    Year,
    Venue,
}

impl MetadataField {
    pub const ALL: [MetadataField; 5] = [
        Self::Title,
        Self::Authors,
        Self::Doi,
        Self::Year,
        Self::Venue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Authors => "authors",
            Self::Doi => "doi",
            Self::Year => "year",
            Self::Venue => "venue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "authors" | "author" => Some(Self::Authors),
            "doi" => Some(Self::Doi),
            "year" => Some(Self::Year),
            "venue" => Some(Self::Venue),
            _ => None,
        }
    }
}

/// Reads a table keyed by a closed enum. Keys `parse` does not recognize are
/// ignored along with their values; recognized keys must hold a valid `V`.
fn known_keys<'de, D, K, V>(
    deserializer: D,
    parse: fn(&str) -> Option<K>,
) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Ord,
    V: DeserializeOwned,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    let mut table = BTreeMap::new();
    for (key, value) in raw {
        if let Some(known) = parse(&key) {
            let parsed = V::deserialize(value)
                .map_err(|error| de::Error::custom(format!("`{key}`: {error}")))?;
            table.insert(known, parsed);
        }
    }
    Ok(table)
}

fn component_keyed<'de, D, V>(deserializer: D) -> Result<BTreeMap<ComponentKind, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    known_keys(deserializer, ComponentKind::parse)
}

fn metadata_keyed<'de, D, V>(deserializer: D) -> Result<BTreeMap<MetadataField, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    known_keys(deserializer, MetadataField::parse)
}

/// Raw inputs a producer recorded for one component or one metadata field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

impl ScoreInputs {
    pub fn is_empty(&self) -> bool {
        self.automated_score.is_none() && self.user_rating.is_none() && self.final_score.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetrics {
    #[serde(flatten)]
    pub scores: ScoreInputs,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "metadata_keyed"
    )]
    pub fields: BTreeMap<MetadataField, ScoreInputs>,
}

pub type ComponentTable = BTreeMap<ComponentKind, ComponentMetrics>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMetrics {
    #[serde(default, deserialize_with = "component_keyed")]
    pub overall: ComponentTable,
    #[serde(default, deserialize_with = "component_keyed")]
    pub accuracy: ComponentTable,
    #[serde(default, deserialize_with = "component_keyed")]
    pub quality: ComponentTable,
}

impl EvaluationMetrics {
    pub fn table(&self, metric: MetricKind) -> &ComponentTable {
        match metric {
            MetricKind::Overall => &self.overall,
            MetricKind::Accuracy => &self.accuracy,
            MetricKind::Quality => &self.quality,
        }
    }
}

/// A profile level given either as a 1-5 number or as a descriptive label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileLevel {
    Score(f64),
    Label(String),
}

impl ProfileLevel {
    pub fn level(&self) -> Option<f64> {
        match self {
            Self::Score(value) if value.is_finite() => Some(value.clamp(1.0, 5.0)),
            Self::Score(_) => None,
            Self::Label(label) => match label.trim().to_ascii_lowercase().as_str() {
                "none" | "novice" => Some(1.0),
                "beginner" | "basic" | "limited" | "low" => Some(2.0),
                "intermediate" | "moderate" | "medium" => Some(3.0),
                "advanced" | "extensive" | "high" => Some(4.0),
                "expert" => Some(5.0),
                other => other.parse::<f64>().ok().map(|value| value.clamp(1.0, 5.0)),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub domain_expertise: Option<ProfileLevel>,
    #[serde(default)]
    pub evaluation_experience: Option<ProfileLevel>,
    #[serde(default)]
    pub orkg_experience: bool,
    #[serde(default)]
    pub expertise_weight: Option<f64>,
    #[serde(default)]
    pub expertise_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_problem: Option<String>,
}

/// Optional 1-5 ratings collected outside the per-component metrics tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementaryRatings {
    #[serde(default)]
    pub overall: Option<f64>,
    #[serde(default)]
    pub clarity: Option<f64>,
    #[serde(default)]
    pub usefulness: Option<f64>,
    #[serde(default)]
    pub completeness: Option<f64>,
}

impl SupplementaryRatings {
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.overall, self.clarity, self.usefulness, self.completeness]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    #[serde(default)]
    pub evaluator_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub user_info: UserInfo,
    #[serde(default)]
    pub paper: Option<PaperSnapshot>,
    #[serde(default)]
    pub evaluation_metrics: EvaluationMetrics,
    #[serde(default)]
    pub supplementary_ratings: Option<SupplementaryRatings>,
}

impl EvaluationRecord {
    /// Identifier used to group evaluations of the same paper.
    pub fn paper_key(&self) -> Option<String> {
        non_empty(self.paper_id.as_deref())
            .or_else(|| non_empty(self.token.as_deref()))
            .map(ToOwned::to_owned)
    }

    pub fn evaluator_key(&self) -> String {
        non_empty(self.evaluator_id.as_deref())
            .unwrap_or("anonymous")
            .to_string()
    }

    pub fn doi(&self) -> Option<&str> {
        self.paper
            .as_ref()
            .and_then(|paper| non_empty(paper.doi.as_deref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthRecord {
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(flatten)]
    pub paper: PaperSnapshot,
}

/// Property-level content analysis produced by the extraction system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    #[serde(default)]
    pub property_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub property_weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemOutput {
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(flatten)]
    pub paper: PaperSnapshot,
    #[serde(default, deserialize_with = "component_keyed")]
    pub scores: BTreeMap<ComponentKind, f64>,
    #[serde(default)]
    pub content: Option<ContentAnalysis>,
}

pub type SystemDataMap = BTreeMap<String, SystemOutput>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedPaper {
    #[serde(default)]
    pub ground_truth: Option<GroundTruthRecord>,
    #[serde(default)]
    pub system_output: Option<SystemOutput>,
    #[serde(default)]
    pub user_evaluations: Vec<EvaluationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedData {
    #[serde(default)]
    pub papers: Vec<IntegratedPaper>,
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
