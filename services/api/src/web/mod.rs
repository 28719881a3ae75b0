pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the JSON API router. CORS and Swagger UI are layered on by the binary.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/catalog", get(rest::get_catalog_handler))
        .route("/catalog/reload", post(rest::reload_catalog_handler))
        .route("/catalog/query", put(rest::set_query_handler))
        .route("/catalog/advance", post(rest::advance_catalog_handler))
        .route("/products/{id}", get(rest::product_detail_handler))
        .route(
            "/cart",
            get(rest::get_cart_handler).delete(rest::clear_cart_handler),
        )
        .route("/cart/items", post(rest::add_to_cart_handler))
        .route(
            "/cart/items/{id}",
            put(rest::set_quantity_handler).delete(rest::remove_from_cart_handler),
        )
        .with_state(app_state)
}
