use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

use super::tokenizer::tokenize;

pub type TermId = u32;
pub type DocId = u32;

/// One (document, weight) entry in a posting list. Weight is the document's
/// tf-idf weight for the term: (1 + ln(tf)) * idf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64,
}

/// A query term's share of one hit's dot product, kept for explanations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermContribution {
    pub term_id: TermId,
    pub contribution: f64,
}

/// A single ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub app_id: i64,
    pub score: f64,
    /// Top contributing query terms, strongest first (at most three)
    pub why: Vec<TermContribution>,
}

/// Immutable TF-IDF inverted index over the game catalog.
///
/// Built wholesale from a document batch and never mutated afterwards;
/// rebuilds produce a fresh value that replaces the previous snapshot.
///
/// Term ids are dense 0..V-1 in descending document-frequency order; equal
/// frequencies keep first-seen corpus order, so identical corpora always
/// number identically.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TfidfIndex {
    terms: Vec<String>,
    vocab: HashMap<String, TermId>,
    postings: Vec<Vec<Posting>>,
    doc_norms: Vec<f64>,
    doc_appids: Vec<i64>,
    idf: Vec<f64>,
}

impl TfidfIndex {
    /// Builds an index over `documents`, where `appids[i]` is the external id
    /// of `documents[i]`. An empty corpus yields a valid empty index.
    pub fn build(documents: &[String], appids: &[i64]) -> AppResult<Self> {
        if documents.len() != appids.len() {
            return Err(AppError::ArityMismatch {
                documents: documents.len(),
                ids: appids.len(),
            });
        }

        let n = documents.len();

        // Per-document term counts plus corpus document frequencies.
        let mut doc_term_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(n);
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();

        for doc in documents {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for term in tokenize(doc) {
                let count = counts.entry(term.clone()).or_insert(0);
                *count += 1;
                // First occurrence in this document; token-stream order keeps
                // the first-seen tie-break independent of map iteration.
                if *count == 1 {
                    let df_entry = df.entry(term.clone()).or_insert(0);
                    if *df_entry == 0 {
                        first_seen.push(term);
                    }
                    *df_entry += 1;
                }
            }
            doc_term_counts.push(counts);
        }

        // Term ids by descending df; the stable sort keeps first-seen order
        // for equal frequencies.
        let mut terms = first_seen;
        terms.sort_by_key(|t| std::cmp::Reverse(df[t]));

        let vocab: HashMap<String, TermId> = terms
            .iter()
            .enumerate()
            .map(|(tid, term)| (term.clone(), tid as TermId))
            .collect();

        // Smoothed idf: strictly positive, decreasing in df.
        let idf: Vec<f64> = terms
            .iter()
            .map(|t| ((n as f64 + 1.0) / (df[t] as f64 + 1.0)).ln() + 1.0)
            .collect();

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); terms.len()];
        let mut doc_norms: Vec<f64> = Vec::with_capacity(n);

        for (doc_id, counts) in doc_term_counts.iter().enumerate() {
            // Accumulate in ascending term-id order so rebuilds of the same
            // corpus are bit-identical.
            let mut entries: Vec<(TermId, u32)> = counts
                .iter()
                .map(|(term, tf)| (vocab[term], *tf))
                .collect();
            entries.sort_unstable_by_key(|(tid, _)| *tid);

            let mut norm_sq = 0.0f64;
            for (tid, tf) in entries {
                let weight = (1.0 + (tf as f64).ln()) * idf[tid as usize];
                postings[tid as usize].push(Posting {
                    doc_id: doc_id as DocId,
                    weight,
                });
                norm_sq += weight * weight;
            }
            // Floor empty documents to 1.0 so cosine division is safe.
            doc_norms.push(if norm_sq > 0.0 { norm_sq.sqrt() } else { 1.0 });
        }

        Ok(Self {
            terms,
            vocab,
            postings,
            doc_norms,
            doc_appids: appids.to_vec(),
            idf,
        })
    }

    /// Ranks documents against `query` by cosine similarity, returning at
    /// most `topk` hits sorted by descending score (ties by ascending doc
    /// id). A query with no recognized terms yields no hits.
    pub fn search(&self, query: &str, topk: usize) -> Vec<Hit> {
        let mut q_tf: HashMap<&str, u32> = HashMap::new();
        let tokens = tokenize(query);
        for token in &tokens {
            *q_tf.entry(token.as_str()).or_insert(0) += 1;
        }

        // Query weights for recognized terms only, in ascending term-id
        // order for deterministic accumulation.
        let mut q_weights: Vec<(TermId, f64)> = q_tf
            .iter()
            .filter_map(|(term, tf)| {
                self.vocab.get(*term).map(|&tid| {
                    let w = (1.0 + (*tf as f64).ln()) * self.idf[tid as usize];
                    (tid, w)
                })
            })
            .collect();
        q_weights.sort_unstable_by_key(|(tid, _)| *tid);

        if q_weights.is_empty() {
            return Vec::new();
        }

        let mut q_norm = q_weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if q_norm == 0.0 {
            q_norm = 1.0;
        }

        // Sparse accumulation: only documents in touched posting lists.
        let mut dots: HashMap<DocId, f64> = HashMap::new();
        let mut contribs: HashMap<DocId, Vec<TermContribution>> = HashMap::new();

        for (tid, qw) in &q_weights {
            for posting in &self.postings[*tid as usize] {
                let contribution = qw * posting.weight;
                *dots.entry(posting.doc_id).or_insert(0.0) += contribution;
                contribs.entry(posting.doc_id).or_default().push(TermContribution {
                    term_id: *tid,
                    contribution,
                });
            }
        }

        let mut ranked: Vec<(DocId, f64)> = dots
            .into_iter()
            .map(|(doc_id, dot)| {
                let d_norm = self.doc_norms[doc_id as usize];
                (doc_id, dot / (q_norm * d_norm))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(topk);

        ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let mut why = contribs.remove(&doc_id).unwrap_or_default();
                why.sort_by(|a, b| {
                    b.contribution
                        .partial_cmp(&a.contribution)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                why.truncate(3);
                Hit {
                    doc_id,
                    app_id: self.doc_appids[doc_id as usize],
                    score,
                    why,
                }
            })
            .collect()
    }

    /// Checks the structural invariants a well-formed index must satisfy.
    /// Used after deserialization; a violation means the blob is corrupt.
    pub fn validate(&self) -> AppResult<()> {
        let n = self.doc_appids.len();
        let v = self.terms.len();

        if self.doc_norms.len() != n {
            return Err(AppError::DataIntegrity(format!(
                "doc_norms length {} does not match document count {}",
                self.doc_norms.len(),
                n
            )));
        }
        if self.vocab.len() != v || self.idf.len() != v || self.postings.len() != v {
            return Err(AppError::DataIntegrity(format!(
                "vocabulary arrays disagree: terms={} vocab={} idf={} postings={}",
                v,
                self.vocab.len(),
                self.idf.len(),
                self.postings.len()
            )));
        }
        for plist in &self.postings {
            if plist.iter().any(|p| (p.doc_id as usize) >= n) {
                return Err(AppError::DataIntegrity(
                    "posting references a document out of range".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn num_docs(&self) -> usize {
        self.doc_appids.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_appids.is_empty()
    }

    /// Display text for a term id from the shared vocabulary.
    pub fn term(&self, term_id: TermId) -> Option<&str> {
        self.terms.get(term_id as usize).map(|s| s.as_str())
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.vocab.get(term).copied()
    }

    pub fn idf(&self, term_id: TermId) -> Option<f64> {
        self.idf.get(term_id as usize).copied()
    }

    pub fn doc_norm(&self, doc_id: DocId) -> Option<f64> {
        self.doc_norms.get(doc_id as usize).copied()
    }

    pub fn posting_count(&self, term_id: TermId) -> Option<usize> {
        self.postings.get(term_id as usize).map(|p| p.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn sample_index() -> TfidfIndex {
        TfidfIndex::build(
            &docs(&[
                "Stardew Valley farming sim cozy",
                "Dark Souls punishing boss rush",
            ]),
            &[100, 200],
        )
        .unwrap()
    }

    #[test]
    fn test_arity_mismatch() {
        let err = TfidfIndex::build(&docs(&["one doc"]), &[1, 2]).unwrap_err();
        assert!(matches!(err, AppError::ArityMismatch { documents: 1, ids: 2 }));
    }

    #[test]
    fn test_empty_corpus_is_valid() {
        let index = TfidfIndex::build(&[], &[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.vocab_size(), 0);
        assert!(index.search("anything", 10).is_empty());
        index.validate().unwrap();
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = sample_index();
        assert!(index.search("", 10).is_empty());
        assert!(index.search("   ", 10).is_empty());
        // All tokens unknown to the vocabulary
        assert!(index.search("zzzz qqqq", 10).is_empty());
    }

    #[test]
    fn test_cozy_farming_ranks_stardew_first() {
        let index = sample_index();
        let hits = index.search("cozy farming", 10);
        assert_eq!(hits.len(), 1, "only the stardew doc shares query terms");
        assert_eq!(hits[0].app_id, 100);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_scores_bounded_by_one() {
        let index = sample_index();
        for hit in index.search("dark souls boss rush punishing", 10) {
            assert!(hit.score >= 0.0);
            assert!(hit.score <= 1.0 + 1e-9);
        }
        // A query identical to a document scores ~1 against it
        let hits = index.search("stardew valley farming sim cozy", 10);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_is_deterministic() {
        let index = sample_index();
        let first = index.search("farming boss cozy", 10);
        for _ in 0..10 {
            let again = index.search("farming boss cozy", 10);
            assert_eq!(again.len(), first.len());
            for (a, b) in first.iter().zip(again.iter()) {
                assert_eq!(a.doc_id, b.doc_id);
                assert_eq!(a.score, b.score);
                assert_eq!(a.why, b.why);
            }
        }
    }

    #[test]
    fn test_rebuild_is_reproducible() {
        let texts = docs(&[
            "roguelike dungeon crawler with permadeath",
            "cozy farming and fishing village life",
            "dungeon boss raids with friends",
        ]);
        let ids = [1, 2, 3];
        let a = TfidfIndex::build(&texts, &ids).unwrap();
        let b = TfidfIndex::build(&texts, &ids).unwrap();
        assert_eq!(a.vocab_size(), b.vocab_size());
        for tid in 0..a.vocab_size() as TermId {
            assert_eq!(a.term(tid), b.term(tid));
            assert_eq!(a.idf(tid), b.idf(tid));
            assert_eq!(a.posting_count(tid), b.posting_count(tid));
        }
        for doc in 0..a.num_docs() as DocId {
            assert_eq!(a.doc_norm(doc), b.doc_norm(doc));
        }
    }

    #[test]
    fn test_term_ids_ordered_by_document_frequency() {
        let index = TfidfIndex::build(
            &docs(&["alpha beta", "alpha gamma", "alpha beta delta"]),
            &[1, 2, 3],
        )
        .unwrap();
        // df: alpha=3, beta=2, gamma=1, delta=1; gamma seen before delta
        assert_eq!(index.term(0), Some("alpha"));
        assert_eq!(index.term(1), Some("beta"));
        assert_eq!(index.term(2), Some("gamma"));
        assert_eq!(index.term(3), Some("delta"));
    }

    #[test]
    fn test_idf_decreases_with_df() {
        let index = TfidfIndex::build(
            &docs(&["alpha beta", "alpha gamma", "alpha beta delta"]),
            &[1, 2, 3],
        )
        .unwrap();
        let idf_common = index.idf(index.term_id("alpha").unwrap()).unwrap();
        let idf_mid = index.idf(index.term_id("beta").unwrap()).unwrap();
        let idf_rare = index.idf(index.term_id("delta").unwrap()).unwrap();
        assert!(idf_common < idf_mid);
        assert!(idf_mid < idf_rare);
        assert!(idf_common > 0.0);
    }

    #[test]
    fn test_tie_break_by_doc_id() {
        // Two identical documents score identically; lower doc id first.
        let index = TfidfIndex::build(
            &docs(&["space shooter arcade", "space shooter arcade"]),
            &[11, 22],
        )
        .unwrap();
        let hits = index.search("space shooter", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[0].doc_id, 0);
        assert_eq!(hits[1].doc_id, 1);
    }

    #[test]
    fn test_explanations_capped_at_three() {
        let index = TfidfIndex::build(
            &docs(&["dungeon crawler roguelike permadeath loot grind"]),
            &[5],
        )
        .unwrap();
        let hits = index.search("dungeon crawler roguelike permadeath loot", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].why.len(), 3);
        // Strongest contribution first
        let contribs: Vec<f64> = hits[0].why.iter().map(|w| w.contribution).collect();
        assert!(contribs.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_topk_truncation() {
        let texts = docs(&["rpg quest", "rpg battle", "rpg story", "rpg world"]);
        let index = TfidfIndex::build(&texts, &[1, 2, 3, 4]).unwrap();
        assert_eq!(index.search("rpg", 2).len(), 2);
        assert_eq!(index.search("rpg", 10).len(), 4);
    }

    #[test]
    fn test_validate_rejects_truncated_arrays() {
        let mut index = sample_index();
        index.doc_norms.pop();
        assert!(matches!(
            index.validate().unwrap_err(),
            AppError::DataIntegrity(_)
        ));
    }
}
