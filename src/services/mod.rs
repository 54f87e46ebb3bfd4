pub mod enrichment;
pub mod indexing;
pub mod preferences;
pub mod providers;
pub mod recommender;
pub mod search;

pub use enrichment::{EnrichmentEvent, EnrichmentQueue, EnrichmentWorker};
pub use indexing::rebuild_index;
pub use preferences::PreferenceService;
pub use recommender::recommend;
pub use search::search_catalog;
