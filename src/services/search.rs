use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{SearchResponse, SearchResultEntry, WhyTerm},
    search::{tokenize, IndexHandle},
};

const DEFAULT_TOPK: usize = 10;
const MAX_TOPK: usize = 50;

/// Runs a free-text query against the active index snapshot and joins the
/// hits with catalog metadata.
///
/// Hits whose catalog row has gone missing are skipped silently; the index
/// and the catalog converge eventually and a stale hit is not an error.
pub async fn search_catalog(
    handle: &IndexHandle,
    catalog: &dyn CatalogStore,
    query: &str,
    topk: Option<usize>,
) -> AppResult<SearchResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }
    let topk = topk.unwrap_or(DEFAULT_TOPK).clamp(1, MAX_TOPK);

    let index = handle.snapshot();
    let hits = index.search(query, topk);

    let app_ids: Vec<i64> = hits.iter().map(|h| h.app_id).collect();
    let by_app_id = catalog.get_many(&app_ids).await?;

    let results: Vec<SearchResultEntry> = hits
        .iter()
        .filter_map(|hit| {
            let entry = by_app_id.get(&hit.app_id)?;
            let why = hit
                .why
                .iter()
                .filter_map(|c| {
                    index.term(c.term_id).map(|term| WhyTerm {
                        term: term.to_string(),
                        contribution: c.contribution,
                    })
                })
                .collect();
            Some(SearchResultEntry {
                app_id: hit.app_id,
                name: entry.name.clone(),
                header_image: entry.header_image.clone(),
                price: entry.price,
                genres: entry.genres.clone(),
                tags: entry.tags.clone(),
                score: hit.score,
                why,
            })
        })
        .collect();

    tracing::debug!(query, hits = results.len(), "Catalog search completed");

    Ok(SearchResponse {
        query: query.to_string(),
        topk,
        results,
        query_tokens: tokenize(query),
    })
}
