use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::{
    EvaluationRecord, GroundTruthRecord, IntegratedData, IntegratedPaper, PaperSnapshot,
    SystemOutput, non_empty,
};
use crate::scoring::ScoreResolver;
use crate::stats;
use crate::util::parse_record;

mod identifiers;
mod index;
mod search;
#[cfg(test)]
mod tests;

pub use identifiers::*;
pub use index::*;
pub use search::*;
