use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "PAPER_EVAL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub reliability: ReliabilityConfig,
    pub difficulty: DifficultyThresholds,
}

/// Constants used when blending an automated score with a human rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub min_automated_weight: f64,
    pub automated_weight_base: f64,
    pub user_weight_base: f64,
    pub agreement_bonus_factor: f64,
    pub importance_factor: f64,
    /// Score substituted when a derivation fails; counted as an observation.
    pub computation_fallback: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_automated_weight: 0.1,
            automated_weight_base: 0.4,
            user_weight_base: 0.6,
            agreement_bonus_factor: 0.1,
            importance_factor: 1.0,
            computation_fallback: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReliabilityConfig {
    pub agreement_threshold: f64,
    pub consensus_tolerance: f64,
    pub consensus_high: f64,
    pub consensus_medium: f64,
    pub high_disagreement_variance: f64,
    pub high_expertise_weight: f64,
    pub expertise_split_gap: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            agreement_threshold: 0.1,
            consensus_tolerance: 1.0,
            consensus_high: 80.0,
            consensus_medium: 60.0,
            high_disagreement_variance: 1.5,
            high_expertise_weight: 4.0,
            expertise_split_gap: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DifficultyThresholds {
    pub hard_below: f64,
    pub easy_above: f64,
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self {
            hard_below: 0.4,
            easy_above: 0.7,
        }
    }
}

pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = resolve_config_path(explicit) else {
        return Ok(EngineConfig::default());
    };

    let raw =
        fs::read(&path).with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: EngineConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    validate_config(&config)
        .with_context(|| format!("invalid config values in {}", path.display()))?;

    info!(path = %path.display(), "loaded engine config");
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let scoring = &config.scoring;
    let non_negative = [
        ("minAutomatedWeight", scoring.min_automated_weight),
        ("automatedWeightBase", scoring.automated_weight_base),
        ("userWeightBase", scoring.user_weight_base),
        ("agreementBonusFactor", scoring.agreement_bonus_factor),
        ("importanceFactor", scoring.importance_factor),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            bail!("scoring.{name} must be a finite non-negative number, got {value}");
        }
    }
    if scoring.min_automated_weight + scoring.user_weight_base <= 0.0 {
        bail!("scoring.minAutomatedWeight and scoring.userWeightBase cannot both be zero");
    }
    if !(0.0..=1.0).contains(&scoring.computation_fallback) {
        bail!(
            "scoring.computationFallback must lie in [0, 1], got {}",
            scoring.computation_fallback
        );
    }

    let difficulty = &config.difficulty;
    if difficulty.hard_below > difficulty.easy_above {
        bail!(
            "difficulty.hardBelow ({}) must not exceed difficulty.easyAbove ({})",
            difficulty.hard_below,
            difficulty.easy_above
        );
    }

    let reliability = &config.reliability;
    if reliability.consensus_medium > reliability.consensus_high {
        bail!(
            "reliability.consensusMedium ({}) must not exceed reliability.consensusHigh ({})",
            reliability.consensus_medium,
            reliability.consensus_high
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, validate_config};

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let raw = r#"{ "scoring": { "agreementBonusFactor": 0.2 } }"#;
        let config: EngineConfig = serde_json::from_str(raw).expect("partial config parses");
        assert_eq!(config.scoring.agreement_bonus_factor, 0.2);
        assert_eq!(config.scoring.automated_weight_base, 0.4);
        assert_eq!(config.reliability.agreement_threshold, 0.1);
        assert_eq!(config.difficulty.easy_above, 0.7);
    }

    #[test]
    fn validate_rejects_negative_weights_and_inverted_thresholds() {
        let mut config = EngineConfig::default();
        config.scoring.user_weight_base = -0.1;
        let error = validate_config(&config).expect_err("negative weight is rejected");
        assert!(error.to_string().contains("userWeightBase"), "{error}");

        let mut config = EngineConfig::default();
        config.difficulty.hard_below = 0.9;
        assert!(validate_config(&config).is_err());

        assert!(validate_config(&EngineConfig::default()).is_ok());
    }
}
