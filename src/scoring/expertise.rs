use super::*;

const MIN_EXPERTISE_WEIGHT: f64 = 1.0;
const MAX_EXPERTISE_WEIGHT: f64 = 5.0;
const NEUTRAL_EXPERTISE_WEIGHT: f64 = 3.0;
const DEFAULT_ROLE_LEVEL: f64 = 2.0;
const DEFAULT_PROFILE_LEVEL: f64 = 1.0;
const ORKG_EXPERIENCE_BONUS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    Beginner,
    Intermediate,
    Expert,
    Unknown,
}

impl ExpertiseLevel {
    pub fn from_level(level: Option<f64>) -> Self {
        match level {
            Some(value) if value < 2.0 => Self::Beginner,
            Some(value) if value < 4.0 => Self::Intermediate,
            Some(_) => Self::Expert,
            None => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertiseProfile {
    pub role: Option<String>,
    pub domain_level: ExpertiseLevel,
    pub orkg_experience: bool,
    /// Rater influence on a 1-5 scale.
    pub weight: f64,
    pub multiplier: f64,
}

pub fn role_level(role: Option<&str>) -> f64 {
    let Some(role) = role.map(|value| value.trim().to_ascii_lowercase()) else {
        return DEFAULT_ROLE_LEVEL;
    };

    if role.contains("professor") {
        5.0
    } else if role.contains("postdoc") || role.contains("senior") || role.contains("researcher")
    {
        4.0
    } else if role.contains("phd") || role.contains("doctoral") || role.contains("curator") {
        3.0
    } else if role.contains("master") {
        2.0
    } else if role.contains("bachelor") || role.contains("student") {
        1.5
    } else {
        DEFAULT_ROLE_LEVEL
    }
}

pub fn resolve_expertise(user_info: &UserInfo) -> ExpertiseProfile {
    let domain_level = user_info
        .domain_expertise
        .as_ref()
        .and_then(ProfileLevel::level);
    let experience_level = user_info
        .evaluation_experience
        .as_ref()
        .and_then(ProfileLevel::level);

    let weight = match user_info
        .expertise_weight
        .filter(|value| value.is_finite() && *value >= 0.0)
    {
        Some(precomputed) => precomputed,
        None => {
            let mut derived = 0.4 * role_level(user_info.role.as_deref())
                + 0.35 * domain_level.unwrap_or(DEFAULT_PROFILE_LEVEL)
                + 0.25 * experience_level.unwrap_or(DEFAULT_PROFILE_LEVEL);
            if user_info.orkg_experience {
                derived += ORKG_EXPERIENCE_BONUS;
            }
            derived.clamp(MIN_EXPERTISE_WEIGHT, MAX_EXPERTISE_WEIGHT)
        }
    };

    let multiplier = user_info
        .expertise_multiplier
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(weight / NEUTRAL_EXPERTISE_WEIGHT);

    ExpertiseProfile {
        role: user_info
            .role
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned),
        domain_level: ExpertiseLevel::from_level(domain_level),
        orkg_experience: user_info.orkg_experience,
        weight: round5(weight),
        multiplier: round5(multiplier),
    }
}
