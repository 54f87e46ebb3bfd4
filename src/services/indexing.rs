use std::path::Path;

use crate::{
    db::CatalogStore,
    error::AppResult,
    search::{persist, IndexHandle, TfidfIndex},
};

/// Summary of one completed rebuild.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub documents: usize,
    pub vocabulary: usize,
}

/// Rebuilds the TF-IDF index from the full catalog, persists the blob, and
/// atomically installs the new snapshot.
///
/// In-flight searches keep the snapshot they started with; only new searches
/// observe the rebuilt index. An empty catalog produces a valid empty index.
pub async fn rebuild_index(
    catalog: &dyn CatalogStore,
    handle: &IndexHandle,
    blob_path: &Path,
) -> AppResult<IndexStats> {
    let documents = catalog.all_documents().await?;
    let (app_ids, texts): (Vec<i64>, Vec<String>) = documents.into_iter().unzip();

    let index = TfidfIndex::build(&texts, &app_ids)?;
    persist::save_index(&index, blob_path)?;

    let stats = IndexStats {
        documents: index.num_docs(),
        vocabulary: index.vocab_size(),
    };
    handle.swap(index);

    tracing::info!(
        documents = stats.documents,
        vocabulary = stats.vocabulary,
        blob = %blob_path.display(),
        "Index rebuilt and swapped"
    );

    Ok(stats)
}
