//! crates/pocket_shop_core/src/ports.rs
//!
//! Defines the collaborator contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the cart
//! and catalog engines independent of HTTP clients and storage backends.

use crate::domain::{CatalogItem, ProductId};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Abstracts away the specific errors from external services (network, disk).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PortError {
    /// Transient failures the caller may retry by re-invoking the fetch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortError::Network(_) | PortError::Decode(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns the complete catalog in one call.
    async fn fetch_catalog(&self) -> PortResult<Vec<CatalogItem>>;

    /// Fetches a single product, including its description and images.
    async fn fetch_detail(&self, id: ProductId) -> PortResult<CatalogItem>;
}

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if the slot is empty.
    async fn read(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites the slot under `key`.
    async fn write(&self, key: &str, blob: &str) -> PortResult<()>;
}
