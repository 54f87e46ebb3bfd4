use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    db::{FeedbackLog, PreferenceStore},
    error::{AppError, AppResult},
    models::{FeedbackAction, FeedbackEvent, UserPreference},
};

const ACCEPT_DELTA: f64 = 0.15;
const REJECT_DELTA: f64 = -0.10;
const CLICK_DELTA: f64 = 0.02;

const GENRE_WEIGHT_MIN: f64 = -3.0;
const GENRE_WEIGHT_MAX: f64 = 5.0;
const COMFORT_BIAS_MIN: f64 = -1.0;
const COMFORT_BIAS_MAX: f64 = 2.0;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Online preference learner driven by recommendation feedback.
///
/// Each call appends an immutable feedback record, then applies the additive
/// update rule to the user's persisted state. The read-modify-write is
/// serialized per user, so concurrent feedback from the same user never loses
/// an update; different users proceed independently.
pub struct PreferenceService {
    feedback_log: Arc<dyn FeedbackLog>,
    preferences: Arc<dyn PreferenceStore>,
    user_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl PreferenceService {
    pub fn new(feedback_log: Arc<dyn FeedbackLog>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            feedback_log,
            preferences,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Records one feedback event and folds it into the user's preferences.
    pub async fn record_feedback(
        &self,
        user_id: i64,
        app_id: i64,
        action: &str,
        genres: &str,
        context_snapshot: Option<serde_json::Value>,
    ) -> AppResult<()> {
        if app_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "app_id must be positive, got {}",
                app_id
            )));
        }
        let action: FeedbackAction = action.parse()?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        // The event log is the source of truth; it is written before any
        // preference mutation.
        let event = FeedbackEvent {
            user_id,
            app_id,
            action,
            ts: Utc::now(),
            context_snapshot,
        };
        self.feedback_log.append(&event).await?;

        let mut pref = self
            .preferences
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| UserPreference::new(user_id));

        let delta = match action {
            FeedbackAction::Accept => ACCEPT_DELTA,
            FeedbackAction::Reject => REJECT_DELTA,
            FeedbackAction::Click => CLICK_DELTA,
        };

        match action {
            FeedbackAction::Accept => {
                pref.comfort_bias =
                    (pref.comfort_bias + 0.05).clamp(COMFORT_BIAS_MIN, COMFORT_BIAS_MAX);
            }
            FeedbackAction::Reject => {
                pref.comfort_bias =
                    (pref.comfort_bias - 0.03).clamp(COMFORT_BIAS_MIN, COMFORT_BIAS_MAX);
            }
            FeedbackAction::Click => {}
        }

        for genre in super::recommender::normalize_genres(genres) {
            let current = pref.genre_weight(&genre);
            let updated = round3((current + delta).clamp(GENRE_WEIGHT_MIN, GENRE_WEIGHT_MAX));
            pref.genre_weights.insert(genre, updated);
        }

        pref.updated_at = Utc::now();
        self.preferences.upsert(&pref).await?;

        tracing::info!(
            user_id,
            app_id,
            action = action.as_str(),
            comfort_bias = pref.comfort_bias,
            genres = pref.genre_weights.len(),
            "Feedback recorded"
        );

        Ok(())
    }
}
