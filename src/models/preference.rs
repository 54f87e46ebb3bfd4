use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppError;

/// Feedback a user can give on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Accept,
    Reject,
    Click,
}

impl std::str::FromStr for FeedbackAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(FeedbackAction::Accept),
            "reject" => Ok(FeedbackAction::Reject),
            "click" => Ok(FeedbackAction::Click),
            other => Err(AppError::InvalidInput(format!("invalid action: {}", other))),
        }
    }
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackAction::Accept => "accept",
            FeedbackAction::Reject => "reject",
            FeedbackAction::Click => "click",
        }
    }
}

/// Append-only record of a single feedback interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub user_id: i64,
    pub app_id: i64,
    pub action: FeedbackAction,
    pub ts: DateTime<Utc>,
    /// Snapshot of the recommendation context the feedback was given in
    pub context_snapshot: Option<serde_json::Value>,
}

/// Learned per-user preference state.
///
/// Genre weights live in [-3, 5], comfort bias in [-1, 2]; only the
/// preference learner writes either. Stores decode the persisted payload into
/// this typed shape at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: i64,
    pub genre_weights: HashMap<String, f64>,
    pub comfort_bias: f64,
    pub updated_at: DateTime<Utc>,
}

impl UserPreference {
    /// Fresh state for a user who has never given feedback.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            genre_weights: HashMap::new(),
            comfort_bias: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// Weight for a normalized genre, zero when unseen.
    pub fn genre_weight(&self, genre: &str) -> f64 {
        self.genre_weights.get(genre).copied().unwrap_or(0.0)
    }
}
