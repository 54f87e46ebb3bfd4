use serde::{Deserialize, Serialize};

use super::{Difficulty, EnergyLevel, MultiplayerMode, Platform, SocialMode};

/// Raw recommendation request as received from the caller.
///
/// Fields arrive untyped and optional; `recommend` validates them and rejects
/// out-of-enum values with `InvalidInput`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    pub time_available_min: Option<i32>,
    pub energy_level: Option<String>,
    pub platform: Option<String>,
    pub social_mode: Option<String>,
    pub prefer_installed: Option<bool>,
    pub friends_online_count: Option<i32>,
    /// Nonzero seed adds a small deterministic jitter to break up repeats
    pub shuffle_seed: Option<i64>,
}

/// Validated context echoed back with each recommendation response.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEcho {
    pub time_available_min: i32,
    pub energy_level: EnergyLevel,
    pub platform: Platform,
    pub social_mode: SocialMode,
}

/// One scored candidate with its display metadata and reasons.
#[derive(Debug, Clone, Serialize)]
pub struct RankedGame {
    pub app_id: i64,
    pub name: String,
    pub header_image: Option<String>,
    pub genres: String,
    pub avg_session_minutes: Option<i32>,
    pub difficulty: Difficulty,
    pub multiplayer_mode: MultiplayerMode,
    pub playtime_forever_min: i32,
    /// Rounded to 4 decimal places
    pub score: f64,
    /// Up to three reasons, in scorer trigger order
    pub why: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub context: ContextEcho,
    pub friends_online_count: i32,
    pub top_pick: Option<RankedGame>,
    pub alternatives: Vec<RankedGame>,
    pub total_candidates: usize,
}
