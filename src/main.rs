use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use likewise_api::{
    config::{CatalogProvider, Config},
    db::{self, PgLibraryOracle, PgSlotStore, PgTitleCatalog, SummaryCache},
    middleware::{make_request_span, request_context_middleware},
    routes::create_router,
    services::{CachedTitleCatalog, HttpTitleCatalog, RecommendationService, TitleCatalog},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("likewise_api=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let cache = SummaryCache::new(redis_client);

    let provider: Arc<dyn TitleCatalog> = match config.catalog_provider {
        CatalogProvider::Postgres => Arc::new(PgTitleCatalog::new(pool.clone())),
        CatalogProvider::Http => Arc::new(HttpTitleCatalog::new(
            config.catalog_api_url.clone(),
            config.catalog_api_key.clone(),
        )),
    };
    let catalog = Arc::new(CachedTitleCatalog::new(provider, cache));

    let recommendations = Arc::new(RecommendationService::new(
        Arc::new(PgSlotStore::new(pool.clone())),
        Arc::new(PgLibraryOracle::new(pool)),
        catalog,
    ));

    let app = create_router(AppState::new(recommendations)).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(request_context_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
