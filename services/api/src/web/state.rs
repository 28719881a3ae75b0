//! services/api/src/web/state.rs
//!
//! Defines the shared application state handed to every handler.

use pocket_shop_core::{CartStore, CatalogService, CatalogView};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The cart is built by `CartStore::restore`, so a state value can only exist
/// after the saved cart has been loaded.
pub struct AppState {
    pub catalog_service: Arc<dyn CatalogService>,
    pub cart: Mutex<CartStore>,
    /// The list screen's view. Never hold this lock across a fetch.
    pub catalog: Mutex<CatalogView>,
}

impl AppState {
    pub fn new(catalog_service: Arc<dyn CatalogService>, cart: CartStore, page_size: usize) -> Self {
        Self {
            catalog_service,
            cart: Mutex::new(cart),
            catalog: Mutex::new(CatalogView::with_page_size(page_size)),
        }
    }
}
