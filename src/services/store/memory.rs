use std::collections::{BTreeMap, HashSet};

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Genre, GenreId, Movie, MovieId, Rating, TmdbMovieDetails, UserId},
    services::store::{FavoriteStore, RecommendationStore},
};

#[derive(Debug, Default)]
struct Catalog {
    movies: BTreeMap<MovieId, Movie>,
    genres: BTreeMap<GenreId, Genre>,
    ratings: Vec<Rating>,
    /// In the order they were added
    favorites: Vec<(UserId, MovieId)>,
}

/// Store over an owned snapshot of movies and ratings
///
/// Used for fixtures and tests. Movies are kept ordered by id so every read
/// returns the same order. Favorites and imported movies are the only writes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryStore {
    pub fn new(movies: Vec<Movie>, ratings: Vec<Rating>) -> Self {
        Self {
            catalog: RwLock::new(Catalog {
                movies: movies.into_iter().map(|m| (m.id, m)).collect(),
                ratings,
                ..Default::default()
            }),
        }
    }

    pub fn with_movie(mut self, movie: Movie) -> Self {
        self.catalog.get_mut().movies.insert(movie.id, movie);
        self
    }

    pub fn with_rating(mut self, user: i64, movie: i64, value: f64) -> Self {
        self.catalog
            .get_mut()
            .ratings
            .push(Rating::new(user, movie, value));
        self
    }
}

#[async_trait::async_trait]
impl RecommendationStore for InMemoryStore {
    async fn ratings_for_user(&self, user: UserId) -> AppResult<Vec<Rating>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .ratings
            .iter()
            .filter(|r| r.user_id == user)
            .copied()
            .collect())
    }

    async fn ratings_for_movie(&self, movie: MovieId) -> AppResult<Vec<Rating>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .ratings
            .iter()
            .filter(|r| r.movie_id == movie)
            .copied()
            .collect())
    }

    async fn genres_for_movie(&self, movie: MovieId) -> AppResult<Vec<GenreId>> {
        // A rating may point at a movie missing from the catalog; it simply has no genres.
        let catalog = self.catalog.read().await;
        Ok(catalog
            .movies
            .get(&movie)
            .map(|m| m.genres.clone())
            .unwrap_or_default())
    }

    async fn all_movies_excluding(&self, user: UserId) -> AppResult<Vec<Movie>> {
        let catalog = self.catalog.read().await;
        let rated: HashSet<MovieId> = catalog
            .ratings
            .iter()
            .filter(|r| r.user_id == user)
            .map(|r| r.movie_id)
            .collect();

        Ok(catalog
            .movies
            .values()
            .filter(|m| !rated.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn popular_movies(&self, min_rating_count: i64) -> AppResult<Vec<(Movie, f64)>> {
        let catalog = self.catalog.read().await;
        let mut stats: BTreeMap<MovieId, (f64, i64)> = BTreeMap::new();
        for rating in &catalog.ratings {
            let entry = stats.entry(rating.movie_id).or_insert((0.0, 0));
            entry.0 += rating.value;
            entry.1 += 1;
        }

        let mut popular = Vec::new();
        for (movie_id, (sum, count)) in stats {
            if count < min_rating_count {
                continue;
            }
            if let Some(movie) = catalog.movies.get(&movie_id) {
                popular.push((movie.clone(), sum / count as f64));
            }
        }

        Ok(popular)
    }

    async fn list_movies(&self, limit: i64, offset: i64) -> AppResult<Vec<Movie>> {
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        let catalog = self.catalog.read().await;
        Ok(catalog
            .movies
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

#[async_trait::async_trait]
impl FavoriteStore for InMemoryStore {
    async fn import_movie(&self, details: &TmdbMovieDetails) -> AppResult<Movie> {
        let mut catalog = self.catalog.write().await;

        for genre in &details.genres {
            catalog
                .genres
                .entry(GenreId(genre.id))
                .or_insert_with(|| Genre::from(genre));
        }

        let mut movie = match catalog.movies.values().find(|m| m.tmdb_id == details.id) {
            Some(existing) => existing.clone(),
            None => {
                let id = catalog
                    .movies
                    .keys()
                    .next_back()
                    .map_or(MovieId(1), |last| MovieId(last.0 + 1));
                Movie {
                    id,
                    tmdb_id: details.id,
                    title: details.title.clone(),
                    overview: details.overview.clone(),
                    poster_path: details.poster_path.clone(),
                    release_date: details.parsed_release_date(),
                    vote_average: details.vote_average,
                    genres: Vec::new(),
                }
            }
        };

        movie
            .genres
            .extend(details.genres.iter().map(|g| GenreId(g.id)));
        movie.genres.sort();
        movie.genres.dedup();

        catalog.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .movies
            .values()
            .find(|m| m.tmdb_id == tmdb_id)
            .cloned())
    }

    async fn add_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool> {
        let mut catalog = self.catalog.write().await;
        if catalog.favorites.contains(&(user, movie)) {
            return Ok(false);
        }
        catalog.favorites.push((user, movie));
        Ok(true)
    }

    async fn remove_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool> {
        let mut catalog = self.catalog.write().await;
        let before = catalog.favorites.len();
        catalog.favorites.retain(|favorite| *favorite != (user, movie));
        Ok(catalog.favorites.len() < before)
    }

    async fn favorites(&self, user: UserId) -> AppResult<Vec<Movie>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .favorites
            .iter()
            .filter(|(owner, _)| *owner == user)
            .filter_map(|(_, movie)| catalog.movies.get(movie).cloned())
            .collect())
    }
}
