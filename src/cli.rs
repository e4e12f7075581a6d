use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::{ComponentKind, MetricKind};

#[derive(Parser, Debug)]
#[command(
    name = "paper-eval",
    version,
    about = "Aggregation and scoring of paper extraction evaluations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Aggregate(AggregateArgs),
    Match(MatchArgs),
    Search(SearchArgs),
    Combine(CombineArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    /// JSON array of evaluation records.
    #[arg(long)]
    pub records: PathBuf,

    /// JSON object mapping paper ids to system output.
    #[arg(long)]
    pub system_data: Option<PathBuf>,

    #[arg(long)]
    pub score_db: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[arg(long, conflicts_with_all = ["ground_truth", "system_output", "records"])]
    pub integrated: Option<PathBuf>,

    #[arg(long, requires = "records")]
    pub ground_truth: Option<PathBuf>,

    #[arg(long, requires = "records")]
    pub system_output: Option<PathBuf>,

    #[arg(long)]
    pub records: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub integrated: PathBuf,

    #[arg(long)]
    pub term: Option<String>,

    #[arg(long)]
    pub research_field: Option<String>,

    #[arg(long)]
    pub venue: Option<String>,

    #[arg(long)]
    pub year_min: Option<i32>,

    #[arg(long)]
    pub year_max: Option<i32>,

    #[arg(long)]
    pub has_ground_truth: Option<bool>,

    #[arg(long)]
    pub has_system_output: Option<bool>,

    #[arg(long)]
    pub has_evaluations: Option<bool>,

    #[arg(long)]
    pub min_accuracy: Option<f64>,

    #[arg(long)]
    pub max_accuracy: Option<f64>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_metric(value: &str) -> Result<MetricKind, String> {
    MetricKind::parse(value)
        .ok_or_else(|| format!("unknown metric `{value}` (expected overall, accuracy or quality)"))
}

fn parse_component(value: &str) -> Result<ComponentKind, String> {
    ComponentKind::parse(value).ok_or_else(|| format!("unknown component `{value}`"))
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    #[arg(long)]
    pub automated: f64,

    /// User rating on the 1-5 scale.
    #[arg(long)]
    pub rating: f64,

    #[arg(long, default_value_t = 1.0)]
    pub multiplier: f64,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Persist the combined score into this SQLite score store.
    #[arg(long, requires_all = ["scope", "component"])]
    pub score_db: Option<PathBuf>,

    #[arg(long)]
    pub scope: Option<String>,

    #[arg(long, value_parser = parse_metric, default_value = "overall")]
    pub metric: MetricKind,

    #[arg(long, value_parser = parse_component)]
    pub component: Option<ComponentKind>,

    /// Metadata field or component id; defaults to the component name.
    #[arg(long)]
    pub target: Option<String>,
}
