//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DummyJsonCatalogAdapter, FileStorage, MemoryStorage},
    config::{CartStorageConfig, Config},
    error::ApiError,
    web::{api_router, ApiDoc, AppState},
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::Router;
use pocket_shop_core::{CartStore, KeyValueStorage};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting storefront bridge...");

    // --- 2. Initialize Adapters ---
    let storage: Arc<dyn KeyValueStorage> = match &config.cart_storage {
        CartStorageConfig::Directory(dir) => {
            info!("Persisting the cart under {}", dir.display());
            Arc::new(FileStorage::new(dir.clone()))
        }
        CartStorageConfig::Memory => {
            warn!("Cart storage is in memory; the cart will not survive a restart.");
            Arc::new(MemoryStorage::new())
        }
    };
    let catalog_adapter = Arc::new(DummyJsonCatalogAdapter::new(
        config.catalog_base_url.clone(),
        config.catalog_limit,
    )?);

    // --- 3. Restore the Cart (must finish before anything can mutate it) ---
    let cart = CartStore::restore(storage).await;
    info!("Cart ready with {} items.", cart.total_items());

    // --- 4. Build the Shared AppState and Load the Catalog ---
    let app_state = Arc::new(AppState::new(catalog_adapter.clone(), cart, config.page_size));
    {
        let mut catalog = app_state.catalog.lock().await;
        if let Err(e) = catalog.load(catalog_adapter.as_ref()).await {
            warn!("Initial catalog load failed; the UI can retry via /catalog/reload: {}", e);
        }
    }

    // --- 5. Create the Web Router ---
    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(api_router(app_state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested.");
        })
        .await?;

    // --- 7. Drain Pending Cart Writes ---
    app_state.cart.lock().await.flush().await;
    info!("Cart writes flushed. Bye.");

    Ok(())
}
