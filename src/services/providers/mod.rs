/// Game metadata provider abstraction
///
/// Pluggable architecture for external catalog metadata sources. The
/// enrichment worker is the only consumer; the request path never calls a
/// provider.
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{CatalogEntry, Difficulty, MultiplayerMode},
};

pub mod steamspy;

/// Trait for catalog metadata providers
///
/// A provider resolves one external app id to the raw metadata needed to
/// fill a catalog row. Fetch failures are per-item: the caller decides
/// whether to retry or skip, never the provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch metadata for a single game by its external app id.
    async fn fetch(&self, app_id: i64) -> AppResult<AppMetadata>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Raw metadata for one game as delivered by a provider.
#[derive(Debug, Clone)]
pub struct AppMetadata {
    pub name: String,
    pub developers: Option<String>,
    pub publishers: Option<String>,
    pub genres: String,
    /// Community tag -> vote count
    pub tags: HashMap<String, i64>,
    pub positive: i32,
    pub negative: i32,
    /// Average lifetime playtime in minutes; 0 means unknown
    pub avg_session_minutes: i32,
}

impl AppMetadata {
    /// Builds the catalog row for this metadata, inferring the context
    /// attributes the scorer needs from community tags.
    pub fn into_catalog_entry(self, app_id: i64) -> CatalogEntry {
        let difficulty = infer_difficulty(&self.tags);
        let multiplayer_mode = infer_multiplayer_mode(&self.tags);
        let tags_csv = tags_to_csv(&self.tags);
        let document = build_document(&self.name, &self.genres, &tags_csv);

        // Brand-new games report zero average playtime; assume an hour.
        let avg_session_minutes = if self.avg_session_minutes > 0 {
            self.avg_session_minutes
        } else {
            60
        };

        CatalogEntry {
            app_id,
            name: self.name,
            developers: self.developers,
            publishers: self.publishers,
            genres: self.genres,
            tags: tags_csv,
            header_image: None,
            price: None,
            positive: self.positive,
            negative: self.negative,
            avg_session_minutes: Some(avg_session_minutes),
            difficulty,
            multiplayer_mode,
            // Providers carry no platform data; nearly every catalog title
            // ships for Windows, the rest arrives with bulk import.
            windows: true,
            mac: false,
            linux: false,
            document: Some(document),
        }
    }
}

/// Infers difficulty from community tags.
pub fn infer_difficulty(tags: &HashMap<String, i64>) -> Difficulty {
    let lowered: Vec<String> = tags.keys().map(|t| t.to_lowercase()).collect();
    let has = |needles: &[&str]| lowered.iter().any(|t| needles.contains(&t.as_str()));

    if has(&["souls-like", "difficult", "hard", "roguelike", "permadeath"]) {
        Difficulty::High
    } else if has(&["casual", "relaxing", "cozy", "visual novel", "walking simulator"]) {
        Difficulty::Low
    } else {
        Difficulty::Medium
    }
}

/// Infers the dominant multiplayer mode from community tags.
pub fn infer_multiplayer_mode(tags: &HashMap<String, i64>) -> MultiplayerMode {
    let lowered: Vec<String> = tags.keys().map(|t| t.to_lowercase()).collect();
    let has = |needles: &[&str]| lowered.iter().any(|t| needles.contains(&t.as_str()));

    if has(&["co-op", "online co-op", "local co-op"]) {
        MultiplayerMode::Coop
    } else if has(&["multiplayer", "pvp", "competitive", "e-sports"]) {
        MultiplayerMode::Pvp
    } else if has(&["mmo", "massively multiplayer"]) {
        MultiplayerMode::Mmo
    } else {
        MultiplayerMode::Solo
    }
}

/// Flattens the tag map to a stable comma-separated list, most-voted first.
fn tags_to_csv(tags: &HashMap<String, i64>) -> String {
    let mut ordered: Vec<(&String, &i64)> = tags.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ordered
        .into_iter()
        .map(|(tag, _)| tag.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the searchable document text for a game.
pub fn build_document(name: &str, genres: &str, tags_csv: &str) -> String {
    let mut parts = vec![name];
    if !genres.is_empty() {
        parts.push(genres);
    }
    if !tags_csv.is_empty() {
        parts.push(tags_csv);
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[(&str, i64)]) -> HashMap<String, i64> {
        names.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_infer_difficulty() {
        assert_eq!(
            infer_difficulty(&tags(&[("Souls-like", 100)])),
            Difficulty::High
        );
        assert_eq!(
            infer_difficulty(&tags(&[("Cozy", 50), ("Farming", 10)])),
            Difficulty::Low
        );
        assert_eq!(
            infer_difficulty(&tags(&[("Action", 10)])),
            Difficulty::Medium
        );
        // Hard markers win over relaxing ones
        assert_eq!(
            infer_difficulty(&tags(&[("Roguelike", 5), ("Casual", 90)])),
            Difficulty::High
        );
    }

    #[test]
    fn test_infer_multiplayer_mode() {
        assert_eq!(
            infer_multiplayer_mode(&tags(&[("Online Co-Op", 10)])),
            MultiplayerMode::Coop
        );
        assert_eq!(
            infer_multiplayer_mode(&tags(&[("PvP", 10)])),
            MultiplayerMode::Pvp
        );
        assert_eq!(
            infer_multiplayer_mode(&tags(&[("MMO", 10)])),
            MultiplayerMode::Mmo
        );
        assert_eq!(
            infer_multiplayer_mode(&tags(&[("Singleplayer", 10)])),
            MultiplayerMode::Solo
        );
    }

    #[test]
    fn test_build_document_skips_empty_sections() {
        assert_eq!(build_document("Hades", "", ""), "Hades");
        assert_eq!(
            build_document("Hades", "Roguelike", "Action, Indie"),
            "Hades\nRoguelike\nAction, Indie"
        );
    }

    #[test]
    fn test_into_catalog_entry() {
        let meta = AppMetadata {
            name: "Stardew Valley".into(),
            developers: Some("ConcernedApe".into()),
            publishers: Some("ConcernedApe".into()),
            genres: "Simulation, RPG".into(),
            tags: tags(&[("Farming Sim", 900), ("Cozy", 800), ("Pixel Graphics", 700)]),
            positive: 500_000,
            negative: 8_000,
            avg_session_minutes: 0,
        };

        let entry = meta.into_catalog_entry(413150);
        assert_eq!(entry.app_id, 413150);
        assert_eq!(entry.difficulty, Difficulty::Low);
        assert_eq!(entry.multiplayer_mode, MultiplayerMode::Solo);
        assert_eq!(entry.avg_session_minutes, Some(60));
        assert_eq!(entry.tags, "Farming Sim, Cozy, Pixel Graphics");
        let document = entry.document.unwrap();
        assert!(document.starts_with("Stardew Valley\n"));
        assert!(document.contains("Simulation, RPG"));
        assert!(entry.windows);
    }
}
