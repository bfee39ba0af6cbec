use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};
use crate::models::TimeWindow;

/// Keys for cached TMDb responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Trending(TimeWindow, u32),
    Search(String, u32),
    SimilarMovies(i64, u32),
    MovieDetails(i64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Trending(window, page) => write!(f, "trending:{}:{}", window, page),
            CacheKey::Search(query, page) => {
                write!(f, "search:{}:{}", query.trim().to_lowercase(), page)
            }
            CacheKey::SimilarMovies(tmdb_id, page) => write!(f, "similar:{}:{}", tmdb_id, page),
            CacheKey::MovieDetails(tmdb_id) => write!(f, "details:{}", tmdb_id),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Serialized value waiting to be written by the background writer
struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// Read-through cache for third-party responses
///
/// Reads go straight to Redis through a shared connection manager. Writes are
/// queued and applied by a background task so a slow Redis never delays the
/// HTTP response that produced the value.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Handle for stopping the background writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to stop and waits until queued writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Connects to Redis and spawns the background writer
    pub async fn new(redis_client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(redis_client).await?;
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_conn = conn.clone();
        let task = tokio::spawn(async move {
            Self::run_writer(writer_conn, write_rx, shutdown_rx).await;
        });

        Ok((Self { conn, write_tx }, CacheWriterHandle { shutdown_tx, task }))
    }

    async fn run_writer(
        mut conn: ConnectionManager,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    Self::apply(&mut conn, write).await;
                }
                _ = shutdown_rx.recv() => {
                    // Senders live in every Cache clone, so drain without waiting.
                    let mut flushed = 0usize;
                    while let Ok(write) = write_rx.try_recv() {
                        Self::apply(&mut conn, write).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(conn: &mut ConnectionManager, write: PendingWrite) {
        let result: redis::RedisResult<()> = conn.set_ex(&write.key, write.json, write.ttl).await;
        match result {
            Ok(()) => tracing::debug!(key = %write.key, ttl = write.ttl, "Cached response"),
            Err(e) => tracing::error!(key = %write.key, error = %e, "Failed to write to Redis cache"),
        }
    }

    /// Looks up a cached value
    ///
    /// A Redis failure is logged and reported as a miss; the caller falls back
    /// to the upstream API instead of failing the request.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = match conn.get(key.to_string()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis read failed, treating as miss");
                return Ok(None);
            }
        };

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                tracing::debug!(key = %key, "Cache hit");
                Ok(Some(data))
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Queues a value for writing and returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::error!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}
