use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "as", "is",
            "are", "be", "by", "at", "from", "this", "that", "it", "its", "you", "your", "we",
            "our", "they", "their", "i", "me", "my",
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Tokenize text into lowercase alphanumeric terms of length >= 2, stopwords
/// removed. The exact same rules run at index-build and query time; diverging
/// them makes vocabulary lookups silently miss.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t) && t.len() >= 2)
        .map(|t| t.to_string())
        .collect()
}
