/// Read access to ratings and the movie catalog
///
/// The recommendation engine never queries storage directly. Everything it
/// needs comes through this trait as plain in-memory collections, so the
/// engine makes no assumptions about lazy loading or query execution.
use crate::{
    error::AppResult,
    models::{GenreId, Movie, MovieId, Rating, TmdbMovieDetails, UserId},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Trait for rating and catalog stores
///
/// Any failure is reported as an error and propagated to the caller unchanged;
/// implementations own retry and timeout policy.
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// All ratings given by `user`
    async fn ratings_for_user(&self, user: UserId) -> AppResult<Vec<Rating>>;

    /// All ratings given to `movie`
    async fn ratings_for_movie(&self, movie: MovieId) -> AppResult<Vec<Rating>>;

    /// Genres attached to `movie`
    async fn genres_for_movie(&self, movie: MovieId) -> AppResult<Vec<GenreId>>;

    /// Catalog minus the movies `user` has already rated
    async fn all_movies_excluding(&self, user: UserId) -> AppResult<Vec<Movie>>;

    /// Movies with at least `min_rating_count` ratings and their average rating
    ///
    /// Order is unspecified; callers sort.
    async fn popular_movies(&self, min_rating_count: i64) -> AppResult<Vec<(Movie, f64)>>;

    /// A page of the catalog ordered by movie id
    async fn list_movies(&self, limit: i64, offset: i64) -> AppResult<Vec<Movie>>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Writes behind the favorites endpoints
///
/// Favoriting a provider movie is how titles enter the local catalog, so this
/// trait also owns the catalog import.
#[async_trait::async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Inserts the movie and its genres unless the TMDb id is already in the
    /// catalog. Existing entries keep their metadata but gain any new genres.
    async fn import_movie(&self, details: &TmdbMovieDetails) -> AppResult<Movie>;

    /// Catalog entry for a TMDb id, if it was ever imported
    async fn movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>>;

    /// Returns false when the movie was already a favorite
    async fn add_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool>;

    /// Returns false when the movie was not a favorite
    async fn remove_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool>;

    /// Favorites of `user`, oldest first
    async fn favorites(&self, user: UserId) -> AppResult<Vec<Movie>>;
}
