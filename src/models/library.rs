use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binding between a local account and an external game-network profile.
///
/// One account binds one external profile; library rows are keyed by the
/// external id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: i64,
    pub external_id: String,
    pub persona: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Per-(profile, game) playtime facts synced from the external library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryStat {
    pub profile_id: String,
    pub app_id: i64,
    /// Total minutes played across the account's lifetime
    pub playtime_forever_min: i32,
    /// Minutes played in the trailing two weeks
    pub playtime_2weeks_min: i32,
    pub last_played: Option<DateTime<Utc>>,
}
