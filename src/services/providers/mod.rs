/// Third-party movie metadata
///
/// The catalog used for scoring lives in our own store; this module only
/// proxies discovery data (trending, search, details, "more like this") from
/// an external provider so clients can browse beyond the local catalog.
use crate::{
    error::AppResult,
    models::{TimeWindow, TmdbMovieDetails, TmdbPage},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie metadata providers
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Movies trending over the given window
    async fn trending(&self, window: TimeWindow, page: u32) -> AppResult<TmdbPage>;

    /// Movies whose title matches `query`
    ///
    /// An empty query is rejected with `InvalidInput`.
    async fn search(&self, query: &str, page: u32) -> AppResult<TmdbPage>;

    /// Full details of a single movie; `NotFound` when the provider has no such id
    async fn movie_details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails>;

    /// The provider's own "more like this" list for a movie
    async fn similar_movies(&self, tmdb_id: i64, page: u32) -> AppResult<TmdbPage>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
