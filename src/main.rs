use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_recs_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache},
    routes::{create_router, AppState},
    services::{
        providers::{MetadataProvider, TmdbProvider},
        recommendations::Recommender,
        store::{FavoriteStore, PgStore, RecommendationStore},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recs_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await?;

    let pg_store = Arc::new(PgStore::new(pool));
    let store: Arc<dyn RecommendationStore> = pg_store.clone();
    let favorites: Arc<dyn FavoriteStore> = pg_store;
    let recommender = Recommender::new(store.clone(), config.recommender_config())?;
    let metadata: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));

    let engine = recommender.config();
    tracing::info!(
        store = store.name(),
        metadata = metadata.name(),
        content_weight = engine.content_weight,
        collab_weight = engine.collab_weight,
        liked_threshold = engine.liked_threshold,
        max_similarity_candidates = engine.max_similarity_candidates,
        "Recommender initialized"
    );

    let app = create_router(Arc::new(AppState::new(
        store,
        recommender,
        favorites,
        metadata,
    )));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
