//! Postgres-backed store implementations.
//!
//! Schema ownership (DDL, migrations) lives outside this crate; these
//! implementations only read and write the agreed tables. The persisted
//! preference payload is decoded into the typed model here and nowhere else.

use std::collections::{HashMap, HashSet};

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::AppResult;
use crate::models::{
    CatalogEntry, Difficulty, FeedbackEvent, LibraryStat, MultiplayerMode, PlayerProfile,
    UserPreference,
};

use super::{CatalogStore, FeedbackLog, LibraryStore, PreferenceStore, ProfileStore};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

fn catalog_entry_from_row(row: &PgRow) -> Result<CatalogEntry, sqlx::Error> {
    let difficulty: Option<String> = row.try_get("difficulty")?;
    let multiplayer_mode: Option<String> = row.try_get("multiplayer_mode")?;

    Ok(CatalogEntry {
        app_id: row.try_get("app_id")?,
        name: row.try_get("name")?,
        developers: row.try_get("developers")?,
        publishers: row.try_get("publishers")?,
        genres: row.try_get::<Option<String>, _>("genres")?.unwrap_or_default(),
        tags: row.try_get::<Option<String>, _>("tags")?.unwrap_or_default(),
        header_image: row.try_get("header_image")?,
        price: row.try_get("price")?,
        positive: row.try_get::<Option<i32>, _>("positive")?.unwrap_or(0),
        negative: row.try_get::<Option<i32>, _>("negative")?.unwrap_or(0),
        avg_session_minutes: row.try_get("avg_session_minutes")?,
        difficulty: Difficulty::from_raw(difficulty.as_deref().unwrap_or("")),
        multiplayer_mode: MultiplayerMode::from_raw(multiplayer_mode.as_deref().unwrap_or("")),
        windows: row.try_get::<Option<bool>, _>("windows")?.unwrap_or(false),
        mac: row.try_get::<Option<bool>, _>("mac")?.unwrap_or(false),
        linux: row.try_get::<Option<bool>, _>("linux")?.unwrap_or(false),
        document: row.try_get("document")?,
    })
}

const CATALOG_COLUMNS: &str = "app_id, name, developers, publishers, genres, tags, header_image, \
     price, positive, negative, avg_session_minutes, difficulty, multiplayer_mode, \
     windows, mac, linux, document";

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get(&self, app_id: i64) -> AppResult<Option<CatalogEntry>> {
        let sql = format!("SELECT {} FROM game_catalog WHERE app_id = $1", CATALOG_COLUMNS);
        let row = sqlx::query(&sql).bind(app_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(catalog_entry_from_row).transpose().map_err(Into::into)
    }

    async fn get_many(&self, app_ids: &[i64]) -> AppResult<HashMap<i64, CatalogEntry>> {
        if app_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM game_catalog WHERE app_id = ANY($1)",
            CATALOG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(app_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in &rows {
            let entry = catalog_entry_from_row(row)?;
            entries.insert(entry.app_id, entry);
        }
        Ok(entries)
    }

    async fn all_documents(&self) -> AppResult<Vec<(i64, String)>> {
        let rows = sqlx::query(
            "SELECT app_id, document FROM game_catalog \
             WHERE document IS NOT NULL AND document <> '' ORDER BY app_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("app_id")?, row.try_get("document")?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(Into::into)
    }

    async fn all_app_ids(&self) -> AppResult<HashSet<i64>> {
        let rows = sqlx::query("SELECT app_id FROM game_catalog")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<i64, _>("app_id"))
            .collect::<Result<HashSet<_>, sqlx::Error>>()
            .map_err(Into::into)
    }

    async fn upsert(&self, entry: CatalogEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO game_catalog (app_id, name, developers, publishers, genres, tags, \
                 header_image, price, positive, negative, avg_session_minutes, difficulty, \
                 multiplayer_mode, windows, mac, linux, document) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (app_id) DO UPDATE SET \
                 name = EXCLUDED.name, developers = EXCLUDED.developers, \
                 publishers = EXCLUDED.publishers, genres = EXCLUDED.genres, \
                 tags = EXCLUDED.tags, header_image = EXCLUDED.header_image, \
                 price = EXCLUDED.price, positive = EXCLUDED.positive, \
                 negative = EXCLUDED.negative, \
                 avg_session_minutes = EXCLUDED.avg_session_minutes, \
                 difficulty = EXCLUDED.difficulty, \
                 multiplayer_mode = EXCLUDED.multiplayer_mode, \
                 windows = EXCLUDED.windows, mac = EXCLUDED.mac, linux = EXCLUDED.linux, \
                 document = EXCLUDED.document",
        )
        .bind(entry.app_id)
        .bind(&entry.name)
        .bind(&entry.developers)
        .bind(&entry.publishers)
        .bind(&entry.genres)
        .bind(&entry.tags)
        .bind(&entry.header_image)
        .bind(entry.price)
        .bind(entry.positive)
        .bind(entry.negative)
        .bind(entry.avg_session_minutes)
        .bind(entry.difficulty.as_str())
        .bind(entry.multiplayer_mode.as_str())
        .bind(entry.windows)
        .bind(entry.mac)
        .bind(entry.linux)
        .bind(&entry.document)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgLibraryStore {
    pool: PgPool,
}

impl PgLibraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LibraryStore for PgLibraryStore {
    async fn list_by_profile(&self, profile_id: &str) -> AppResult<Vec<LibraryStat>> {
        let rows = sqlx::query(
            "SELECT profile_id, app_id, playtime_forever_min, playtime_2weeks_min, last_played \
             FROM user_game_stats WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LibraryStat {
                    profile_id: row.try_get("profile_id")?,
                    app_id: row.try_get("app_id")?,
                    playtime_forever_min: row
                        .try_get::<Option<i32>, _>("playtime_forever_min")?
                        .unwrap_or(0),
                    playtime_2weeks_min: row
                        .try_get::<Option<i32>, _>("playtime_2weeks_min")?
                        .unwrap_or(0),
                    last_played: row.try_get("last_played")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(Into::into)
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<PlayerProfile>> {
        let row = sqlx::query(
            "SELECT user_id, external_id, persona, last_sync \
             FROM player_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(PlayerProfile {
                user_id: row.try_get("user_id")?,
                external_id: row.try_get("external_id")?,
                persona: row.try_get("persona")?,
                last_sync: row.try_get("last_sync")?,
            })
        })
        .transpose()
        .map_err(|e: sqlx::Error| e.into())
    }
}

pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn find_by_user(&self, user_id: i64) -> AppResult<Option<UserPreference>> {
        let row = sqlx::query(
            "SELECT user_id, genre_weights, comfort_bias, updated_at \
             FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: Option<String> = row.try_get("genre_weights")?;
        // A malformed payload degrades to empty weights rather than failing
        // the request; the next feedback write repairs it.
        let genre_weights = match payload.as_deref() {
            Some(json) if !json.is_empty() => match serde_json::from_str(json) {
                Ok(weights) => weights,
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Undecodable genre weights, resetting");
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };

        Ok(Some(UserPreference {
            user_id: row.try_get("user_id")?,
            genre_weights,
            comfort_bias: row.try_get("comfort_bias")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn upsert(&self, pref: &UserPreference) -> AppResult<()> {
        let payload = serde_json::to_string(&pref.genre_weights)
            .map_err(|e| crate::error::AppError::Internal(format!("encode weights: {}", e)))?;

        sqlx::query(
            "INSERT INTO user_preferences (user_id, genre_weights, comfort_bias, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 genre_weights = EXCLUDED.genre_weights, \
                 comfort_bias = EXCLUDED.comfort_bias, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(pref.user_id)
        .bind(payload)
        .bind(pref.comfort_bias)
        .bind(pref.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgFeedbackLog {
    pool: PgPool,
}

impl PgFeedbackLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackLog for PgFeedbackLog {
    async fn append(&self, event: &FeedbackEvent) -> AppResult<()> {
        let snapshot = event.context_snapshot.as_ref().map(|v| v.to_string());

        sqlx::query(
            "INSERT INTO feedback (user_id, app_id, action, ts, context_snapshot) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.user_id)
        .bind(event.app_id)
        .bind(event.action.as_str())
        .bind(event.ts)
        .bind(snapshot)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
