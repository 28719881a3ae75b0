//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the UI and the bridge.
//! Prices travel as decimal strings with two places (e.g. `"19.99"`).

use pocket_shop_core::{CartStore, CatalogItem, CatalogView, LineItem, LoadState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

//=========================================================================================
// Requests FROM the UI
//=========================================================================================

/// Replaces the free-text catalog filter.
#[derive(Deserialize, Debug, ToSchema)]
pub struct QueryRequest {
    #[serde(default)]
    pub text: String,
}

/// Adds one unit of a product to the cart.
#[derive(Deserialize, Debug, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: u64,
}

/// Sets a line's quantity. Accepts a number, a numeric string, or nothing;
/// anything non-numeric is treated as 1.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SetQuantityRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantity: serde_json::Value,
}

//=========================================================================================
// Responses TO the UI
//=========================================================================================

/// A catalog entry as rendered by the list and detail screens.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ProductView {
    pub id: u64,
    pub title: String,
    pub price: Option<String>,
    pub description: String,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
    /// The detail screen's hero image.
    pub display_image: Option<String>,
}

impl From<&CatalogItem> for ProductView {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.0,
            title: item.title.clone(),
            price: item.price.map(format_money),
            description: item.description.clone(),
            thumbnail: item.thumbnail.clone(),
            images: item.images.clone(),
            display_image: item.display_image().map(str::to_owned),
        }
    }
}

/// The visible page of the catalog plus everything the list screen needs to
/// decide between spinner, error, empty-state, and footer loader.
#[derive(Serialize, Debug, ToSchema)]
pub struct CatalogPageResponse {
    pub items: Vec<ProductView>,
    pub query: String,
    pub page_count: usize,
    pub page_size: usize,
    pub total_matches: usize,
    pub has_more: bool,
    pub no_results: bool,
    /// Changes whenever the list should scroll back to the top.
    pub scroll_epoch: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub retryable: bool,
}

impl CatalogPageResponse {
    pub fn from_view(view: &CatalogView) -> Self {
        let (error, retryable) = match view.load_state() {
            LoadState::Failed(e) => (Some(e.to_string()), e.is_retryable()),
            _ => (None, false),
        };
        let matches = view.filtered_view();
        let limit = view.visible_limit();
        Self {
            items: matches.iter().take(limit).map(|item| ProductView::from(*item)).collect(),
            query: view.query().to_string(),
            page_count: view.page_count(),
            page_size: view.page_size(),
            total_matches: matches.len(),
            has_more: matches.len() > limit,
            no_results: matches.is_empty(),
            scroll_epoch: view.scroll_epoch(),
            loading: view.is_loading(),
            error,
            retryable,
        }
    }
}

/// One cart row.
#[derive(Serialize, Debug, ToSchema)]
pub struct CartLineView {
    pub id: u64,
    pub title: String,
    pub unit_price: Option<String>,
    pub thumbnail: Option<String>,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&LineItem> for CartLineView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.0,
            title: item.title.clone(),
            unit_price: item.unit_price.map(format_money),
            thumbnail: item.thumbnail.clone(),
            quantity: item.quantity.get(),
            line_total: format_money(item.line_total()),
        }
    }
}

/// The whole cart with its derived totals.
#[derive(Serialize, Debug, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLineView>,
    pub total_items: u32,
    pub total_price: String,
}

impl From<&CartStore> for CartResponse {
    fn from(cart: &CartStore) -> Self {
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            total_items: cart.total_items(),
            total_price: format_money(cart.total_price()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_shop_core::ProductId;

    fn loaded(titles: &[&str], page_size: usize) -> CatalogView {
        let items = titles
            .iter()
            .enumerate()
            .map(|(i, title)| CatalogItem {
                id: ProductId(i as u64 + 1),
                title: title.to_string(),
                price: Some(Decimal::new(1999, 2)),
                description: String::new(),
                images: Vec::new(),
                thumbnail: None,
            })
            .collect();
        let mut view = CatalogView::with_page_size(page_size);
        let ticket = view.begin_load();
        assert!(view.finish_load(ticket, Ok(items)));
        view
    }

    #[test]
    fn catalog_page_agrees_with_the_view() {
        let mut view = loaded(&["Red Hat", "Shoe", "Blue Hat", "Straw Hat", "Sock"], 2);
        view.set_query("hat");

        let page = CatalogPageResponse::from_view(&view);
        let titles: Vec<&str> = page.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, ["Red Hat", "Blue Hat"]);
        assert_eq!(page.total_matches, 3);
        assert_eq!(page.has_more, view.has_more());
        assert!(page.has_more);
        assert!(!page.no_results);
        assert_eq!(page.items[0].price.as_deref(), Some("19.99"));

        view.advance();
        let page = CatalogPageResponse::from_view(&view);
        assert_eq!(page.items.len(), 3);
        assert!(!page.has_more);

        view.set_query("umbrella");
        let page = CatalogPageResponse::from_view(&view);
        assert!(page.items.is_empty());
        assert!(page.no_results);
        assert_eq!(page.no_results, view.is_empty_result());
    }
}
