use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ScoringConfig;
use crate::model::{
    ComponentKind, ComponentMetrics, EvaluationRecord, MetadataField, MetricKind, ProfileLevel,
    ScoreInputs, UserInfo,
};
use crate::stats;
use crate::store::{ScoreKey, ScoreStore};
use crate::util::round5;

pub const MAX_USER_RATING: f64 = 5.0;

mod adapter;
mod combine;
mod expertise;

pub use adapter::*;
pub use combine::*;
pub use expertise::*;
