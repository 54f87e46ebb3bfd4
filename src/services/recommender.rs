use std::collections::HashMap;

use crate::{
    db::{CatalogStore, LibraryStore, PreferenceStore, ProfileStore},
    error::{AppError, AppResult},
    models::{
        CatalogEntry, ContextEcho, Difficulty, EnergyLevel, LibraryStat, MultiplayerMode,
        Platform, RankedGame, RecommendRequest, RecommendationContext, RecommendationResponse,
        SocialMode,
    },
};

/// Splits a raw genre field into normalized tokens.
///
/// Upstream sources disagree on the separator, so the first of `, ; |`
/// present wins and the string is split on that separator only: a value
/// like "a,b;c" splits on the comma and keeps "b;c" intact.
pub fn normalize_genres(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let parts: Vec<String> = match [',', ';', '|'].iter().find(|sep| raw.contains(**sep)) {
        Some(sep) => raw
            .split(*sep)
            .map(|p| p.trim().to_lowercase())
            .collect(),
        None => vec![trimmed.to_lowercase()],
    };

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Scores one candidate against the request context.
///
/// Features are additive and independent, evaluated in a fixed order; the
/// reasons list keeps the first three triggers in that order rather than
/// re-sorting by magnitude.
pub fn score_candidate(
    stat: &LibraryStat,
    entry: &CatalogEntry,
    ctx: &RecommendationContext,
    genre_weights: &HashMap<String, f64>,
    comfort_bias: f64,
) -> (f64, Vec<String>) {
    let mut score = 0.0f64;
    let mut reasons: Vec<String> = Vec::new();

    // Time fit: prefer a typical session length close to the available time.
    let target = match entry.avg_session_minutes {
        Some(minutes) if minutes > 0 => minutes,
        _ => 45,
    };
    let diff = (ctx.time_available_min - target).abs() as f64;
    let time_fit = (1.0 - diff / ctx.time_available_min.max(30) as f64).max(0.0);
    score += time_fit * 35.0;
    if time_fit > 0.7 {
        reasons.push(format!("Fits a ~{} minute session", target));
    }

    // Energy fit: low energy prefers lower difficulty.
    match ctx.energy_level {
        EnergyLevel::Low => match entry.difficulty {
            Difficulty::Low => {
                score += 20.0;
                reasons.push("Low mental load".to_string());
            }
            Difficulty::High => score -= 10.0,
            Difficulty::Medium => {}
        },
        EnergyLevel::High => {
            if entry.difficulty == Difficulty::High {
                score += 18.0;
                reasons.push("Worth a high-energy session".to_string());
            }
        }
    }

    // Social fit plus friends-online boost.
    match ctx.social_mode {
        SocialMode::Social => {
            if entry.multiplayer_mode.is_multiplayer() {
                let boost = (ctx.friends_online_count.max(0) as f64 * 2.0).min(10.0);
                score += 10.0 + boost;
                reasons.push("Friends are online to play with".to_string());
            } else {
                score -= 4.0;
            }
        }
        SocialMode::Solo => {
            if entry.multiplayer_mode == MultiplayerMode::Solo {
                score += 8.0;
            }
        }
        SocialMode::Any => {}
    }

    // Genre preference fit.
    let mut genre_fit = 0.0f64;
    for genre in normalize_genres(&entry.genres) {
        genre_fit = genre_fit.max(genre_weights.get(&genre).copied().unwrap_or(0.0));
    }
    if genre_fit > 0.0 {
        score += genre_fit.clamp(0.0, 4.0) * 6.0;
        reasons.push("Matches your genre tastes".to_string());
    }

    // Comfort loop bias from historical behavior.
    if stat.playtime_forever_min > 500 {
        score += comfort_bias * 8.0;
        if comfort_bias > 0.7 {
            reasons.push("One of your comfort games".to_string());
        }
    }

    // Novelty bonus for backlog items.
    if stat.playtime_forever_min < 30 {
        score += 6.0;
    }

    // Tiny boost for recent activity.
    if stat.playtime_2weeks_min > 0 {
        score += (1.0 + stat.playtime_2weeks_min as f64 / 30.0).log2().min(5.0);
    }

    reasons.truncate(3);
    (score, reasons)
}

/// Generates a ranked recommendation for `user_id`.
///
/// Candidates are the user's library rows whose catalog entry exists and
/// supports the requested platform; rows missing from the catalog are
/// silently dropped since catalog completeness is eventual.
pub async fn recommend(
    user_id: i64,
    request: RecommendRequest,
    profiles: &dyn ProfileStore,
    library: &dyn LibraryStore,
    catalog: &dyn CatalogStore,
    preferences: &dyn PreferenceStore,
) -> AppResult<RecommendationResponse> {
    let energy_level: EnergyLevel = request.energy_level.as_deref().unwrap_or("low").parse()?;
    let platform: Platform = request.platform.as_deref().unwrap_or("windows").parse()?;
    let social_mode: SocialMode = request.social_mode.as_deref().unwrap_or("any").parse()?;
    let time_available_min = request.time_available_min.unwrap_or(45).clamp(10, 300);
    let prefer_installed = request.prefer_installed.unwrap_or(true);
    let friends_online_count = request.friends_online_count.unwrap_or(0).max(0);
    let shuffle_seed = request.shuffle_seed.unwrap_or(0);

    let profile = profiles
        .find_by_user(user_id)
        .await?
        .ok_or(AppError::NotBound)?;

    let stats = library.list_by_profile(&profile.external_id).await?;
    if stats.is_empty() {
        return Err(AppError::EmptyLibrary);
    }

    let app_ids: Vec<i64> = stats.iter().map(|s| s.app_id).collect();
    let by_app_id = catalog.get_many(&app_ids).await?;

    let (genre_weights, comfort_bias) = match preferences.find_by_user(user_id).await? {
        Some(pref) => (pref.genre_weights, pref.comfort_bias),
        None => (HashMap::new(), 0.0),
    };

    let ctx = RecommendationContext {
        time_available_min,
        energy_level,
        platform,
        social_mode,
        prefer_installed,
        friends_online_count,
    };

    let mut scored: Vec<RankedGame> = Vec::new();
    for stat in &stats {
        let Some(entry) = by_app_id.get(&stat.app_id) else {
            continue;
        };
        if !entry.supports(platform) {
            continue;
        }

        let (mut score, why) = score_candidate(stat, entry, &ctx, &genre_weights, comfort_bias);

        if shuffle_seed != 0 {
            score += (stat.app_id + shuffle_seed).rem_euclid(7) as f64 * 0.07;
        }

        scored.push(RankedGame {
            app_id: stat.app_id,
            name: entry.name.clone(),
            header_image: entry.header_image.clone(),
            genres: entry.genres.clone(),
            avg_session_minutes: entry.avg_session_minutes,
            difficulty: entry.difficulty,
            multiplayer_mode: entry.multiplayer_mode,
            playtime_forever_min: stat.playtime_forever_min,
            score: round4(score),
            why,
        });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.app_id.cmp(&b.app_id))
    });

    let total_candidates = scored.len();
    let mut ranked = scored.into_iter();
    let top_pick = ranked.next();
    let alternatives: Vec<RankedGame> = ranked.take(7).collect();

    tracing::info!(
        user_id,
        total_candidates,
        platform = platform.as_str(),
        social_mode = social_mode.as_str(),
        "Recommendation generated"
    );

    Ok(RecommendationResponse {
        context: ContextEcho {
            time_available_min,
            energy_level,
            platform,
            social_mode,
        },
        friends_online_count,
        top_pick,
        alternatives,
        total_candidates,
    })
}
