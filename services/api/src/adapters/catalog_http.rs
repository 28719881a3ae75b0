//! services/api/src/adapters/catalog_http.rs
//!
//! This module contains the adapter for the DummyJSON product API.
//! It implements the `CatalogService` port from the `core` crate.

use async_trait::async_trait;
use pocket_shop_core::domain::{CatalogItem, ProductId};
use pocket_shop_core::ports::{CatalogService, PortError, PortResult};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogService` port over HTTP.
#[derive(Clone)]
pub struct DummyJsonCatalogAdapter {
    client: Client,
    base_url: String,
    limit: u32,
}

impl DummyJsonCatalogAdapter {
    /// Creates a new `DummyJsonCatalogAdapter` with its own HTTP client.
    pub fn new(base_url: impl Into<String>, limit: u32) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self::with_client(client, base_url, limit))
    }

    /// Creates an adapter around an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>, limit: u32) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            limit,
        }
    }

    /// Issues a GET and decodes the body. A 404 maps to `NotFound`, any other
    /// non-success status or transport failure to `Network`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> PortResult<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(PortError::Network(format!("{} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| PortError::Decode(e.to_string()))
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct ProductsPageRecord {
    #[serde(default)]
    products: Vec<ProductRecord>,
}

/// One product as DummyJSON sends it. Only the fields the storefront reads.
#[derive(Deserialize)]
struct ProductRecord {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

impl ProductRecord {
    fn to_domain(self) -> CatalogItem {
        CatalogItem {
            id: ProductId(self.id),
            title: self.title,
            price: self.price.and_then(|p| Decimal::try_from(p).ok()),
            description: self.description,
            images: self.images,
            thumbnail: self.thumbnail,
        }
    }
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for DummyJsonCatalogAdapter {
    async fn fetch_catalog(&self) -> PortResult<Vec<CatalogItem>> {
        let url = format!("{}/products?limit={}", self.base_url, self.limit);
        let page: ProductsPageRecord = self.get_json(&url).await?;
        info!("Fetched {} products from the catalog.", page.products.len());
        Ok(page.products.into_iter().map(ProductRecord::to_domain).collect())
    }

    async fn fetch_detail(&self, id: ProductId) -> PortResult<CatalogItem> {
        let url = format!("{}/products/{}", self.base_url, id);
        let record: ProductRecord = self.get_json(&url).await.map_err(|e| match e {
            PortError::NotFound(_) => PortError::NotFound(format!("Product {} not found", id)),
            other => other,
        })?;
        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_products_page() {
        let body = r#"{
            "products": [
                {
                    "id": 1,
                    "title": "Essence Mascara Lash Princess",
                    "description": "A popular mascara.",
                    "category": "beauty",
                    "price": 9.99,
                    "rating": 4.94,
                    "images": ["https://cdn.example/1/1.png"],
                    "thumbnail": "https://cdn.example/1/thumbnail.png"
                },
                { "id": 2, "title": "No Price" }
            ],
            "total": 194,
            "skip": 0,
            "limit": 2
        }"#;
        let page: ProductsPageRecord = serde_json::from_str(body).unwrap();
        let items: Vec<CatalogItem> = page.products.into_iter().map(ProductRecord::to_domain).collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, ProductId(1));
        assert_eq!(items[0].price, Some(Decimal::new(999, 2)));
        assert_eq!(items[0].cart_image(), Some("https://cdn.example/1/thumbnail.png"));
        assert_eq!(items[1].price, None);
        assert!(items[1].images.is_empty());
    }

    #[test]
    fn missing_products_field_is_an_empty_catalog() {
        let page: ProductsPageRecord = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(page.products.is_empty());
    }

    #[test]
    fn record_without_id_fails_to_decode() {
        assert!(serde_json::from_str::<ProductRecord>(r#"{"title": "x"}"#).is_err());
    }
}
