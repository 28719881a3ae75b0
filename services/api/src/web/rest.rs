//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the catalog and cart endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    AddToCartRequest, CartLineView, CartResponse, CatalogPageResponse, ProductView, QueryRequest,
    SetQuantityRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use pocket_shop_core::{CatalogItem, LoadState, PortError, ProductId};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_catalog_handler,
        reload_catalog_handler,
        set_query_handler,
        advance_catalog_handler,
        product_detail_handler,
        get_cart_handler,
        add_to_cart_handler,
        set_quantity_handler,
        remove_from_cart_handler,
        clear_cart_handler,
    ),
    components(
        schemas(
            CatalogPageResponse,
            ProductView,
            QueryRequest,
            CartResponse,
            CartLineView,
            AddToCartRequest,
            SetQuantityRequest
        )
    ),
    tags(
        (name = "Pocket Shop API", description = "Local bridge between the storefront UI and the cart and catalog engines.")
    )
)]
pub struct ApiDoc;

/// Maps a port failure onto an HTTP status and message.
fn port_error_response(e: &PortError) -> (StatusCode, String) {
    let status = match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Network(_) | PortError::Decode(_) => StatusCode::BAD_GATEWAY,
        PortError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// Return the visible page of the catalog.
#[utoipa::path(
    get,
    path = "/catalog",
    responses((status = 200, description = "Current catalog page", body = CatalogPageResponse))
)]
pub async fn get_catalog_handler(State(app_state): State<Arc<AppState>>) -> Json<CatalogPageResponse> {
    let catalog = app_state.catalog.lock().await;
    Json(CatalogPageResponse::from_view(&catalog))
}

/// Fetch the catalog again, replacing the snapshot on success.
///
/// The view lock is released while the fetch is in flight; if another reload
/// starts meanwhile, this response is discarded in favour of the newer one.
#[utoipa::path(
    post,
    path = "/catalog/reload",
    responses(
        (status = 200, description = "Catalog loaded", body = CatalogPageResponse),
        (status = 502, description = "Catalog fetch failed; the page carries the error", body = CatalogPageResponse)
    )
)]
pub async fn reload_catalog_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let ticket = app_state.catalog.lock().await.begin_load();
    let result = app_state.catalog_service.fetch_catalog().await;

    let mut catalog = app_state.catalog.lock().await;
    if !catalog.finish_load(ticket, result) {
        info!("Catalog reload superseded by a newer request.");
    }

    let status = match catalog.load_state() {
        LoadState::Failed(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Json(CatalogPageResponse::from_view(&catalog)))
}

/// Replace the search text. Rewinds to the first page.
#[utoipa::path(
    put,
    path = "/catalog/query",
    request_body = QueryRequest,
    responses((status = 200, description = "Filtered first page", body = CatalogPageResponse))
)]
pub async fn set_query_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Json<CatalogPageResponse> {
    let mut catalog = app_state.catalog.lock().await;
    catalog.set_query(payload.text);
    Json(CatalogPageResponse::from_view(&catalog))
}

/// Show one more page. A no-op once every match is visible.
#[utoipa::path(
    post,
    path = "/catalog/advance",
    responses((status = 200, description = "Catalog page after advancing", body = CatalogPageResponse))
)]
pub async fn advance_catalog_handler(State(app_state): State<Arc<AppState>>) -> Json<CatalogPageResponse> {
    let mut catalog = app_state.catalog.lock().await;
    catalog.advance();
    Json(CatalogPageResponse::from_view(&catalog))
}

/// Fetch a single product for the detail screen.
#[utoipa::path(
    get,
    path = "/products/{id}",
    responses(
        (status = 200, description = "Product detail", body = ProductView),
        (status = 404, description = "No such product"),
        (status = 502, description = "Detail fetch failed")
    ),
    params(("id" = u64, Path, description = "The product id."))
)]
pub async fn product_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ProductView>, (StatusCode, String)> {
    match app_state.catalog_service.fetch_detail(ProductId(id)).await {
        Ok(item) => Ok(Json(ProductView::from(&item))),
        Err(e) => {
            warn!("Failed to load product {}: {}", id, e);
            Err(port_error_response(&e))
        }
    }
}

//=========================================================================================
// Cart Handlers
//=========================================================================================

/// Return the cart with its totals.
#[utoipa::path(
    get,
    path = "/cart",
    responses((status = 200, description = "The cart", body = CartResponse))
)]
pub async fn get_cart_handler(State(app_state): State<Arc<AppState>>) -> Json<CartResponse> {
    let cart = app_state.cart.lock().await;
    Json(CartResponse::from(&*cart))
}

/// Add one unit of a product.
///
/// The product is taken from the loaded catalog when present, otherwise it is
/// fetched from the detail endpoint.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "No such product"),
        (status = 502, description = "Product lookup failed")
    )
)]
pub async fn add_to_cart_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let id = ProductId(payload.product_id);
    let product = lookup_product(&app_state, id).await.map_err(|e| {
        error!("Cannot add product {} to the cart: {}", id, e);
        port_error_response(&e)
    })?;

    let mut cart = app_state.cart.lock().await;
    cart.add(&product);
    info!("Added product {} to the cart ({} items).", id, cart.total_items());
    Ok(Json(CartResponse::from(&*cart)))
}

async fn lookup_product(app_state: &AppState, id: ProductId) -> Result<CatalogItem, PortError> {
    if let Some(item) = app_state.catalog.lock().await.find(id).cloned() {
        return Ok(item);
    }
    app_state.catalog_service.fetch_detail(id).await
}

/// Set a line's quantity, clamped into 1..=99.
#[utoipa::path(
    put,
    path = "/cart/items/{id}",
    request_body = SetQuantityRequest,
    responses((status = 200, description = "Updated cart", body = CartResponse)),
    params(("id" = u64, Path, description = "The product id of the cart line."))
)]
pub async fn set_quantity_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<SetQuantityRequest>,
) -> Json<CartResponse> {
    let id = ProductId(id);
    let mut cart = app_state.cart.lock().await;
    match &payload.quantity {
        serde_json::Value::Number(n) => {
            let requested = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(1);
            cart.set_quantity(id, requested);
        }
        serde_json::Value::String(raw) => cart.set_quantity_lenient(id, Some(raw.as_str())),
        _ => cart.set_quantity_lenient(id, None),
    }
    Json(CartResponse::from(&*cart))
}

/// Remove a line from the cart. Removing an absent line is not an error.
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    responses((status = 200, description = "Updated cart", body = CartResponse)),
    params(("id" = u64, Path, description = "The product id of the cart line."))
)]
pub async fn remove_from_cart_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Json<CartResponse> {
    let mut cart = app_state.cart.lock().await;
    cart.remove(ProductId(id));
    Json(CartResponse::from(&*cart))
}

/// Empty the cart.
#[utoipa::path(
    delete,
    path = "/cart",
    responses((status = 200, description = "The emptied cart", body = CartResponse))
)]
pub async fn clear_cart_handler(State(app_state): State<Arc<AppState>>) -> Json<CartResponse> {
    let mut cart = app_state.cart.lock().await;
    cart.clear();
    Json(CartResponse::from(&*cart))
}
