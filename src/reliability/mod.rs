use serde::{Deserialize, Serialize};

use crate::config::ReliabilityConfig;
use crate::model::ComponentKind;
use crate::stats;
use crate::util::round5;

const RATING_CATEGORIES: usize = 5;
const COMPARISON_EPSILON: f64 = 1e-9;

mod agreement;
mod consensus;
mod kappa;

pub use agreement::*;
pub use consensus::*;
pub use kappa::*;
