use serde::Serialize;

/// A query term's contribution to one search hit, resolved to display text.
#[derive(Debug, Clone, Serialize)]
pub struct WhyTerm {
    pub term: String,
    pub contribution: f64,
}

/// One catalog game matched by a search query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultEntry {
    pub app_id: i64,
    pub name: String,
    pub header_image: Option<String>,
    pub price: Option<f64>,
    pub genres: String,
    pub tags: String,
    pub score: f64,
    /// Top contributing query terms, strongest first (at most three)
    pub why: Vec<WhyTerm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub topk: usize,
    pub results: Vec<SearchResultEntry>,
    pub query_tokens: Vec<String>,
}
