pub mod catalog;
pub mod context;
pub mod library;
pub mod preference;
pub mod recommendation;
pub mod search;

pub use catalog::{CatalogEntry, Difficulty, MultiplayerMode, Platform};
pub use context::{EnergyLevel, RecommendationContext, SocialMode};
pub use library::{LibraryStat, PlayerProfile};
pub use preference::{FeedbackAction, FeedbackEvent, UserPreference};
pub use recommendation::{ContextEcho, RankedGame, RecommendRequest, RecommendationResponse};
pub use search::{SearchResponse, SearchResultEntry, WhyTerm};
