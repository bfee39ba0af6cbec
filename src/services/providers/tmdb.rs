/// TMDb API provider
///
/// Endpoints used:
/// 1. Trending: /trending/movie/{day|week}
/// 2. Search: /search/movie
/// 3. Details: /movie/{id}
/// 4. Recommendations: /movie/{id}/recommendations
///
/// Every response is cached in Redis; TTLs follow how quickly each list changes.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{TimeWindow, TmdbMovieDetails, TmdbPage},
    services::providers::MetadataProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

const TRENDING_CACHE_TTL: u64 = 6 * 60 * 60;
const SEARCH_CACHE_TTL: u64 = 6 * 60 * 60;
const SIMILAR_CACHE_TTL: u64 = 24 * 60 * 60;
const DETAILS_CACHE_TTL: u64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// GETs `path` with the API key attached and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = endpoint(&self.api_url, path);

        let mut query: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self.http_client.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, body = %body, "TMDb request failed");
            return Err(status_error(path, status, &body));
        }

        Ok(response.json().await?)
    }
}

/// Joins the configured base URL and an API path
fn endpoint(api_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        api_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Maps a non-success TMDb status to an application error
fn status_error(path: &str, status: StatusCode, body: &str) -> AppError {
    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(format!("TMDb resource {} not found", path))
    } else {
        AppError::ExternalApi(format!("TMDb API returned status {}: {}", status, body))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn trending(&self, window: TimeWindow, page: u32) -> AppResult<TmdbPage> {
        cached!(
            self.cache,
            CacheKey::Trending(window, page),
            TRENDING_CACHE_TTL,
            async move {
                let path = format!("trending/movie/{}", window);
                let result: TmdbPage = self.get_json(&path, &[("page", page.to_string())]).await?;

                tracing::info!(
                    window = %window,
                    page,
                    results = result.results.len(),
                    provider = "tmdb",
                    "Trending movies fetched"
                );

                Ok::<_, AppError>(result)
            }
        )
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<TmdbPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Query parameter is required".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string(), page),
            SEARCH_CACHE_TTL,
            async move {
                let result: TmdbPage = self
                    .get_json(
                        "search/movie",
                        &[("query", query.to_string()), ("page", page.to_string())],
                    )
                    .await?;

                tracing::info!(
                    query = %query,
                    page,
                    results = result.results.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(result)
            }
        )
    }

    async fn movie_details(&self, tmdb_id: i64) -> AppResult<TmdbMovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(tmdb_id),
            DETAILS_CACHE_TTL,
            async move {
                let path = format!("movie/{}", tmdb_id);
                let details: TmdbMovieDetails = self.get_json(&path, &[]).await?;
                tracing::debug!(tmdb_id, title = %details.title, "Movie details fetched");
                Ok::<_, AppError>(details)
            }
        )
    }

    async fn similar_movies(&self, tmdb_id: i64, page: u32) -> AppResult<TmdbPage> {
        cached!(
            self.cache,
            CacheKey::SimilarMovies(tmdb_id, page),
            SIMILAR_CACHE_TTL,
            async move {
                let path = format!("movie/{}/recommendations", tmdb_id);
                self.get_json::<TmdbPage>(&path, &[("page", page.to_string())])
                    .await
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
