use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod tmdb;

pub use tmdb::{TimeWindow, TmdbGenre, TmdbMovie, TmdbMovieDetails, TmdbPage};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a user owned by the external identity system
    UserId
);
id_type!(
    /// Catalog identifier of a movie (not the TMDb id)
    MovieId
);
id_type!(
    /// Identifier of a genre tag
    GenreId
);

/// Genre tag attached to zero or more movies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

impl From<&TmdbGenre> for Genre {
    fn from(genre: &TmdbGenre) -> Self {
        Self {
            id: GenreId(genre.id),
            name: genre.name.clone(),
        }
    }
}

/// Catalog entry returned to clients and scored by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub tmdb_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    /// Genres attached to the movie, deduplicated
    pub genres: Vec<GenreId>,
}

impl Movie {
    /// Minimal movie with no metadata, mostly useful for fixtures
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>, genres: Vec<GenreId>) -> Self {
        let id = id.into();
        Self {
            id,
            tmdb_id: id.0,
            title: title.into(),
            overview: None,
            poster_path: None,
            release_date: None,
            vote_average: 0.0,
            genres,
        }
    }
}

/// A single rating observation
///
/// Several ratings for the same (user, movie) pair are allowed and treated as
/// independent observations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    #[sqlx(rename = "rating")]
    #[serde(rename = "rating")]
    pub value: f64,
}

impl Rating {
    pub fn new(user_id: impl Into<UserId>, movie_id: impl Into<MovieId>, value: f64) -> Self {
        Self {
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            value,
        }
    }
}

/// Response body of the recommendations endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub count: usize,
    pub recommendations: Vec<Movie>,
}

/// Response body of the favorites add/remove endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub message: String,
    pub movie: Movie,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", MovieId(550)), "550");
        assert_eq!(format!("{}", UserId(7)), "7");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&GenreId(28)).unwrap();
        assert_eq!(json, "28");
    }

    #[test]
    fn test_rating_serializes_value_as_rating() {
        let rating = Rating::new(1, 550, 4.5);
        let json = serde_json::to_value(rating).unwrap();
        assert_eq!(json["user_id"], 1);
        assert_eq!(json["movie_id"], 550);
        assert_eq!(json["rating"], 4.5);
    }

    #[test]
    fn test_movie_new_uses_id_as_tmdb_id() {
        let movie = Movie::new(550, "Fight Club", vec![GenreId(18)]);
        assert_eq!(movie.id, MovieId(550));
        assert_eq!(movie.tmdb_id, 550);
        assert_eq!(movie.genres, vec![GenreId(18)]);
        assert_eq!(movie.release_date, None);
    }
}
