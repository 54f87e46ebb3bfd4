use serde::{Deserialize, Serialize};

use super::Platform;
use crate::error::AppError;

/// How much mental energy the user has for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    High,
}

impl std::str::FromStr for EnergyLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(EnergyLevel::Low),
            "high" => Ok(EnergyLevel::High),
            other => Err(AppError::InvalidInput(format!(
                "invalid energy_level: {}",
                other
            ))),
        }
    }
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::High => "high",
        }
    }
}

/// Whether the user wants to play alone, with others, or has no preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialMode {
    Solo,
    Social,
    Any,
}

impl std::str::FromStr for SocialMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solo" => Ok(SocialMode::Solo),
            "social" => Ok(SocialMode::Social),
            "any" => Ok(SocialMode::Any),
            other => Err(AppError::InvalidInput(format!(
                "invalid social_mode: {}",
                other
            ))),
        }
    }
}

impl SocialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialMode::Solo => "solo",
            SocialMode::Social => "social",
            SocialMode::Any => "any",
        }
    }
}

/// Ephemeral per-request situation the scorer ranks against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationContext {
    pub time_available_min: i32,
    pub energy_level: EnergyLevel,
    pub platform: Platform,
    pub social_mode: SocialMode,
    pub prefer_installed: bool,
    pub friends_online_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_parse() {
        assert_eq!("low".parse::<EnergyLevel>().unwrap(), EnergyLevel::Low);
        assert_eq!("HIGH".parse::<EnergyLevel>().unwrap(), EnergyLevel::High);
        assert!("medium".parse::<EnergyLevel>().is_err());
    }

    #[test]
    fn test_social_parse() {
        assert_eq!("solo".parse::<SocialMode>().unwrap(), SocialMode::Solo);
        assert_eq!("social".parse::<SocialMode>().unwrap(), SocialMode::Social);
        assert_eq!("any".parse::<SocialMode>().unwrap(), SocialMode::Any);
        assert!("party".parse::<SocialMode>().is_err());
    }
}
