use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use mockall::{mock, predicate};
use serde_json::Value;

use movie_recs_api::{
    error::{AppError, AppResult},
    models::{GenreId, Movie, TimeWindow, TmdbGenre, TmdbMovie, TmdbMovieDetails, TmdbPage},
    routes::{create_router, AppState},
    services::{
        providers::MetadataProvider,
        recommendations::{Recommender, RecommenderConfig},
        store::InMemoryStore,
    },
};

mock! {
    pub Metadata {}

    #[async_trait]
    impl MetadataProvider for Metadata {
        async fn trending(&self, window: TimeWindow, page: u32) -> AppResult<TmdbPage>;
        async fn search(&self, query: &str, page: u32) -> AppResult<TmdbPage>;
        async fn movie_details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails>;
        async fn similar_movies(&self, tmdb_id: i64, page: u32) -> AppResult<TmdbPage>;
        fn name(&self) -> &'static str;
    }
}

fn fight_club_page() -> TmdbPage {
    TmdbPage {
        page: 1,
        results: vec![TmdbMovie {
            id: 550,
            title: "Fight Club".to_string(),
            overview: Some("An insomniac office worker...".to_string()),
            poster_path: None,
            release_date: Some("1999-10-15".to_string()),
            vote_average: 8.4,
            genre_ids: vec![18],
        }],
        total_pages: 1,
        total_results: 1,
    }
}

fn fight_club_details() -> TmdbMovieDetails {
    TmdbMovieDetails {
        id: 550,
        title: "Fight Club".to_string(),
        overview: Some("An insomniac office worker...".to_string()),
        poster_path: None,
        release_date: Some("1999-10-15".to_string()),
        vote_average: 8.4,
        runtime: Some(139),
        tagline: None,
        genres: vec![TmdbGenre {
            id: 18,
            name: "Drama".to_string(),
        }],
    }
}

/// Twelve movies, each rated by five users, with descending averages by id.
fn catalog_store() -> InMemoryStore {
    let mut store = InMemoryStore::default();
    for id in 1..=12 {
        let genre = GenreId(if id % 2 == 0 { 1 } else { 2 });
        store = store.with_movie(Movie::new(id, format!("Movie {}", id), vec![genre]));
        for rater in 100..105 {
            store = store.with_rating(rater, id, 10.0 - id as f64 * 0.5);
        }
    }
    store
}

fn create_test_server(store: InMemoryStore, metadata: MockMetadata) -> TestServer {
    let store = Arc::new(store);
    let recommender = Recommender::new(store.clone(), RecommenderConfig::default()).unwrap();
    let state = AppState::new(store.clone(), recommender, store, Arc::new(metadata));
    TestServer::new(create_router(Arc::new(state))).unwrap()
}

fn recommended_ids(body: &Value) -> Vec<i64> {
    body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(InMemoryStore::default(), MockMetadata::new());
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(InMemoryStore::default(), MockMetadata::new());
    let request_id = "0b4c1a3e-5d7f-4a8e-9c2b-1f3e5d7a9b0c";

    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static(request_id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_cold_start_recommendations_follow_popularity() {
    let server = create_test_server(catalog_store(), MockMetadata::new());

    let response = server
        .get("/api/v1/users/1/recommendations")
        .add_query_param("count", 3)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["count"], 3);
    assert_eq!(recommended_ids(&body), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_invalid_count_is_clamped_to_default() {
    let server = create_test_server(catalog_store(), MockMetadata::new());

    for count in ["0", "-3", "lots"] {
        let response = server
            .get("/api/v1/users/1/recommendations")
            .add_query_param("count", count)
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["count"], 10, "count={}", count);
    }
}

#[tokio::test]
async fn test_rated_movies_are_not_recommended() {
    let store = catalog_store()
        .with_rating(1, 2, 5.0)
        .with_rating(1, 5, 4.0)
        .with_rating(1, 7, 1.0);
    let server = create_test_server(store, MockMetadata::new());

    let response = server.get("/api/v1/users/1/recommendations").await;
    response.assert_status_ok();

    let ids = recommended_ids(&response.json());
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|id| ![2, 5, 7].contains(id)));
}

#[tokio::test]
async fn test_recommendations_are_stable_across_requests() {
    let store = catalog_store().with_rating(1, 2, 5.0).with_rating(1, 3, 2.0);
    let server = create_test_server(store, MockMetadata::new());

    let first: Value = server.get("/api/v1/users/1/recommendations").await.json();
    let second: Value = server.get("/api/v1/users/1/recommendations").await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_catalog_listing_pages() {
    let server = create_test_server(catalog_store(), MockMetadata::new());

    let response = server
        .get("/api/v1/movies")
        .add_query_param("limit", 5)
        .add_query_param("offset", 10)
        .await;
    response.assert_status_ok();

    let movies: Vec<Value> = response.json();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], 11);
}

#[tokio::test]
async fn test_trending_defaults_to_weekly_first_page() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_trending()
        .with(predicate::eq(TimeWindow::Week), predicate::eq(1))
        .times(1)
        .returning(|_, _| Ok(fight_club_page()));

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server.get("/api/v1/tmdb/trending").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["results"][0]["title"], "Fight Club");
}

#[tokio::test]
async fn test_trending_rejects_unknown_window() {
    let mut metadata = MockMetadata::new();
    metadata.expect_trending().never();

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server
        .get("/api/v1/tmdb/trending")
        .add_query_param("time_window", "month")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_passes_query_and_page() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_search()
        .with(predicate::eq("fight"), predicate::eq(2))
        .times(1)
        .returning(|_, _| Ok(fight_club_page()));

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server
        .get("/api/v1/tmdb/search")
        .add_query_param("query", "fight")
        .add_query_param("page", 2)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_requires_query() {
    let mut metadata = MockMetadata::new();
    metadata.expect_search().never();

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server.get("/api/v1/tmdb/search").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Query parameter is required");
}

#[tokio::test]
async fn test_unknown_movie_details_is_not_found() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .with(predicate::eq(999_999))
        .returning(|id| Err(AppError::NotFound(format!("TMDb resource movie/{} not found", id))));

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server.get("/api/v1/tmdb/movies/999999").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_similar_movies()
        .returning(|_, _| Err(AppError::ExternalApi("TMDb API returned status 503".to_string())));

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server.get("/api/v1/tmdb/movies/550/recommendations").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_add_favorite_imports_movie_into_catalog() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .with(predicate::eq(550))
        .times(1)
        .returning(|_| Ok(fight_club_details()));

    let server = create_test_server(catalog_store(), metadata);
    let response = server.post("/api/v1/users/7/favorites/550").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], "Added Fight Club to favorites");
    assert_eq!(body["movie"]["id"], 13);
    assert_eq!(body["movie"]["tmdb_id"], 550);
    assert_eq!(body["movie"]["genres"], serde_json::json!([18]));

    let favorites: Value = server.get("/api/v1/users/7/favorites").await.json();
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert_eq!(favorites[0]["title"], "Fight Club");

    let catalog: Value = server.get("/api/v1/movies").await.json();
    assert_eq!(catalog.as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn test_duplicate_favorite_is_kept_once() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .with(predicate::eq(550))
        .times(2)
        .returning(|_| Ok(fight_club_details()));

    let server = create_test_server(InMemoryStore::default(), metadata);
    server.post("/api/v1/users/7/favorites/550").await.assert_status_ok();

    let response = server.post("/api/v1/users/7/favorites/550").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Fight Club is already in favorites");

    let favorites: Value = server.get("/api/v1/users/7/favorites").await.json();
    assert_eq!(favorites.as_array().unwrap().len(), 1);

    let catalog: Value = server.get("/api/v1/movies").await.json();
    assert_eq!(catalog.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_unknown_favorite_is_not_found() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .returning(|id| Err(AppError::NotFound(format!("TMDb resource movie/{} not found", id))));

    let server = create_test_server(InMemoryStore::default(), metadata);
    let response = server.post("/api/v1/users/7/favorites/999999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let catalog: Value = server.get("/api/v1/movies").await.json();
    assert!(catalog.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_favorite() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .returning(|_| Ok(fight_club_details()));

    let server = create_test_server(InMemoryStore::default(), metadata);
    server.post("/api/v1/users/7/favorites/550").await.assert_status_ok();

    let response = server.delete("/api/v1/users/7/favorites/550").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Removed Fight Club from favorites");

    let favorites: Value = server.get("/api/v1/users/7/favorites").await.json();
    assert!(favorites.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_movie_not_in_favorites_is_bad_request() {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_movie_details()
        .returning(|_| Ok(fight_club_details()));

    let server = create_test_server(InMemoryStore::default(), metadata);
    server.post("/api/v1/users/7/favorites/550").await.assert_status_ok();

    let response = server.delete("/api/v1/users/8/favorites/550").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Movie not in favorites");

    server
        .delete("/api/v1/users/7/favorites/603")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
