/// SteamSpy metadata provider
///
/// Fetches per-game community metadata from SteamSpy's appdetails endpoint.
/// SteamSpy answers unknown app ids with an empty payload rather than an
/// HTTP error, and serializes an empty tag set as a JSON array instead of an
/// object, so both shapes are handled here.
use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::{AppMetadata, MetadataProvider},
};

#[derive(Clone)]
pub struct SteamSpyProvider {
    http_client: HttpClient,
    api_url: String,
}

impl SteamSpyProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SteamSpyAppDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    developer: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    /// Tag -> vote map, or an empty array when the game has no tags
    #[serde(default)]
    tags: serde_json::Value,
    #[serde(default)]
    positive: i32,
    #[serde(default)]
    negative: i32,
    #[serde(default)]
    average_forever: i32,
}

fn parse_tags(value: &serde_json::Value) -> HashMap<String, i64> {
    match value.as_object() {
        Some(map) => map
            .iter()
            .filter_map(|(tag, votes)| votes.as_i64().map(|v| (tag.clone(), v)))
            .collect(),
        None => HashMap::new(),
    }
}

#[async_trait::async_trait]
impl MetadataProvider for SteamSpyProvider {
    async fn fetch(&self, app_id: i64) -> AppResult<AppMetadata> {
        let app_id_param = app_id.to_string();
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("request", "appdetails"), ("appid", app_id_param.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(app_id, status = %status, "SteamSpy request failed");
            return Err(AppError::Upstream(format!(
                "SteamSpy returned status {} for app {}",
                status, app_id
            )));
        }

        let details: SteamSpyAppDetails = response.json().await?;

        let name = details
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::NotFound(format!("no SteamSpy metadata for app {}", app_id)))?;

        let metadata = AppMetadata {
            name,
            developers: details.developer.filter(|d| !d.is_empty()),
            publishers: details.publisher.filter(|p| !p.is_empty()),
            genres: details.genre.unwrap_or_default(),
            tags: parse_tags(&details.tags),
            positive: details.positive,
            negative: details.negative,
            avg_session_minutes: details.average_forever,
        };

        tracing::debug!(
            app_id,
            name = %metadata.name,
            tags = metadata.tags.len(),
            provider = "steamspy",
            "Metadata fetched"
        );

        Ok(metadata)
    }

    fn name(&self) -> &'static str {
        "steamspy"
    }
}
