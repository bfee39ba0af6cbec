use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{GenreId, Movie, MovieId, Rating, TmdbMovieDetails, UserId},
    services::store::{FavoriteStore, RecommendationStore},
};

/// Movie columns plus the aggregated genre ids, shared by every catalog query
const MOVIE_COLUMNS: &str = r#"
    m.id, m.tmdb_id, m.title, m.overview, m.poster_path, m.release_date, m.vote_average,
    COALESCE(
        array_agg(mg.genre_id ORDER BY mg.genre_id) FILTER (WHERE mg.genre_id IS NOT NULL),
        '{}'
    ) AS genre_ids
"#;

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    tmdb_id: i64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    release_date: Option<NaiveDate>,
    vote_average: f64,
    genre_ids: Vec<i64>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        let mut genres: Vec<GenreId> = row.genre_ids.into_iter().map(GenreId).collect();
        genres.dedup();

        Movie {
            id: MovieId(row.id),
            tmdb_id: row.tmdb_id,
            title: row.title,
            overview: row.overview,
            poster_path: row.poster_path,
            release_date: row.release_date,
            vote_average: row.vote_average,
            genres,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PopularRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    avg_rating: f64,
}

/// Postgres-backed store
///
/// Every read is a single explicit query returning owned rows.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgStore {
    async fn ratings_for_user(&self, user: UserId) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT user_id, movie_id, rating FROM ratings WHERE user_id = $1 ORDER BY id",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn ratings_for_movie(&self, movie: MovieId) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT user_id, movie_id, rating FROM ratings WHERE movie_id = $1 ORDER BY id",
        )
        .bind(movie)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn genres_for_movie(&self, movie: MovieId) -> AppResult<Vec<GenreId>> {
        let genres = sqlx::query_scalar::<_, GenreId>(
            "SELECT genre_id FROM movie_genres WHERE movie_id = $1 ORDER BY genre_id",
        )
        .bind(movie)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn all_movies_excluding(&self, user: UserId) -> AppResult<Vec<Movie>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM movies m
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            WHERE NOT EXISTS (
                SELECT 1 FROM ratings r WHERE r.movie_id = m.id AND r.user_id = $1
            )
            GROUP BY m.id
            ORDER BY m.id
            "#,
            MOVIE_COLUMNS
        );

        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn popular_movies(&self, min_rating_count: i64) -> AppResult<Vec<(Movie, f64)>> {
        let sql = format!(
            r#"
            WITH stats AS (
                SELECT movie_id, AVG(rating) AS avg_rating
                FROM ratings
                GROUP BY movie_id
                HAVING COUNT(*) >= $1
            )
            SELECT {}, s.avg_rating
            FROM movies m
            JOIN stats s ON s.movie_id = m.id
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            GROUP BY m.id, s.avg_rating
            "#,
            MOVIE_COLUMNS
        );

        let rows = sqlx::query_as::<_, PopularRow>(&sql)
            .bind(min_rating_count)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            min_rating_count,
            movies = rows.len(),
            "Loaded popularity statistics"
        );

        Ok(rows
            .into_iter()
            .map(|row| (Movie::from(row.movie), row.avg_rating))
            .collect())
    }

    async fn list_movies(&self, limit: i64, offset: i64) -> AppResult<Vec<Movie>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM movies m
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            GROUP BY m.id
            ORDER BY m.id
            LIMIT $1 OFFSET $2
            "#,
            MOVIE_COLUMNS
        );

        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait::async_trait]
impl FavoriteStore for PgStore {
    async fn import_movie(&self, details: &TmdbMovieDetails) -> AppResult<Movie> {
        let mut tx = self.pool.begin().await?;

        // The no-op update makes RETURNING yield the id of an existing row too
        let movie_id = sqlx::query_scalar::<_, MovieId>(
            r#"
            INSERT INTO movies (tmdb_id, title, overview, poster_path, release_date, vote_average)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tmdb_id) DO UPDATE SET tmdb_id = EXCLUDED.tmdb_id
            RETURNING id
            "#,
        )
        .bind(details.id)
        .bind(&details.title)
        .bind(&details.overview)
        .bind(&details.poster_path)
        .bind(details.parsed_release_date())
        .bind(details.vote_average)
        .fetch_one(&mut *tx)
        .await?;

        for genre in &details.genres {
            sqlx::query("INSERT INTO genres (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
                .bind(genre.id)
                .bind(&genre.name)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO movie_genres (movie_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(movie_id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            movie_id = %movie_id,
            tmdb_id = details.id,
            genres = details.genres.len(),
            "Imported movie into catalog"
        );

        self.movie_by_tmdb_id(details.id).await?.ok_or_else(|| {
            AppError::Internal(format!("movie with TMDb id {} vanished after import", details.id))
        })
    }

    async fn movie_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM movies m
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            WHERE m.tmdb_id = $1
            GROUP BY m.id
            "#,
            MOVIE_COLUMNS
        );

        let row = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Movie::from))
    }

    async fn add_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO favorite_movies (user_id, movie_id) VALUES ($1, $2) ON CONFLICT (user_id, movie_id) DO NOTHING",
        )
        .bind(user)
        .bind(movie)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_favorite(&self, user: UserId, movie: MovieId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorite_movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user)
            .bind(movie)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn favorites(&self, user: UserId) -> AppResult<Vec<Movie>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM favorite_movies f
            JOIN movies m ON m.id = f.movie_id
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            WHERE f.user_id = $1
            GROUP BY m.id, f.id
            ORDER BY f.id
            "#,
            MOVIE_COLUMNS
        );

        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_row_conversion() {
        let row = MovieRow {
            id: 1,
            tmdb_id: 550,
            title: "Fight Club".to_string(),
            overview: Some("An insomniac office worker...".to_string()),
            poster_path: None,
            release_date: NaiveDate::from_ymd_opt(1999, 10, 15),
            vote_average: 8.4,
            genre_ids: vec![18, 53, 53],
        };

        let movie = Movie::from(row);
        assert_eq!(movie.id, MovieId(1));
        assert_eq!(movie.tmdb_id, 550);
        assert_eq!(movie.genres, vec![GenreId(18), GenreId(53)]);
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(1999, 10, 15));
    }

    #[test]
    fn test_movie_row_without_genres() {
        let row = MovieRow {
            id: 2,
            tmdb_id: 603,
            title: "The Matrix".to_string(),
            overview: None,
            poster_path: None,
            release_date: None,
            vote_average: 0.0,
            genre_ids: vec![],
        };

        assert!(Movie::from(row).genres.is_empty());
    }
}
