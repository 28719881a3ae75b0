//! crates/pocket_shop_core/src/cart.rs
//!
//! The cart state engine: merge and mutation rules over line items, derived
//! totals, and durable persistence through the `KeyValueStorage` port.
//!
//! Every mutation is applied in memory first and then handed to a spawned write
//! task. Writes are fire-and-forget: failures are logged and never reach the
//! caller, so the cart degrades to session-only instead of failing.

use crate::domain::{CatalogItem, LineItem, ProductId, Quantity};
use crate::ports::KeyValueStorage;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// The single storage slot holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "CART_V1";

//=========================================================================================
// Snapshot Codec
//=========================================================================================

/// The persisted shape of one line item: `{id, title, price, thumbnail, qty}`.
/// Kept stable so carts written by earlier builds keep loading.
#[derive(Serialize, Deserialize)]
struct LineItemRecord {
    id: ProductId,
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(default)]
    qty: Option<i64>,
}

impl LineItemRecord {
    fn from_domain(item: &LineItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            price: item.unit_price.and_then(|p| p.to_f64()),
            thumbnail: item.thumbnail.clone(),
            qty: Some(i64::from(item.quantity.get())),
        }
    }

    /// `None` for records that would not survive in a live cart (no positive quantity).
    fn to_domain(self) -> Option<LineItem> {
        let qty = self.qty.filter(|q| *q > 0)?;
        Some(LineItem {
            id: self.id,
            title: self.title,
            unit_price: self.price.and_then(|p| Decimal::try_from(p).ok()),
            thumbnail: self.thumbnail,
            quantity: Quantity::clamped(qty),
        })
    }
}

/// Serializes the cart as an ordered JSON array.
pub fn encode(items: &[LineItem]) -> serde_json::Result<String> {
    let records: Vec<LineItemRecord> = items.iter().map(LineItemRecord::from_domain).collect();
    serde_json::to_string(&records)
}

/// Parses a persisted cart, preserving order.
///
/// Records with a non-positive quantity are dropped, oversized quantities are
/// clamped, and a repeated id keeps its first occurrence.
pub fn decode(blob: &str) -> serde_json::Result<Vec<LineItem>> {
    let records: Vec<LineItemRecord> = serde_json::from_str(blob)?;
    let mut seen = HashSet::with_capacity(records.len());
    Ok(records
        .into_iter()
        .filter_map(LineItemRecord::to_domain)
        .filter(|item| seen.insert(item.id))
        .collect())
}

//=========================================================================================
// CartStore
//=========================================================================================

/// Owns the canonical list of cart line items.
///
/// The only way to obtain a store is [`CartStore::restore`], which performs the
/// startup read, so no mutation can race the initial load. Write tasks run on
/// the runtime that restored the store, so mutations are safe from any thread.
pub struct CartStore {
    items: Vec<LineItem>,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    revision: u64,
    /// Newest revision handed to a write task.
    issued: Arc<AtomicU64>,
    /// Held for the duration of each storage write.
    write_gate: Arc<Mutex<()>>,
    writes: TaskTracker,
    runtime: Handle,
}

impl CartStore {
    /// Loads the cart from the default slot.
    pub async fn restore(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::restore_with_key(storage, CART_STORAGE_KEY).await
    }

    /// Loads the cart from `key`. An absent, unreadable, or unparseable slot
    /// yields an empty cart.
    pub async fn restore_with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let items = match storage.read(&key).await {
            Ok(Some(blob)) if !blob.trim().is_empty() => match decode(&blob) {
                Ok(items) => {
                    info!("Restored cart with {} line items.", items.len());
                    items
                }
                Err(e) => {
                    warn!("Discarding unparseable cart snapshot under '{}': {}", key, e);
                    Vec::new()
                }
            },
            Ok(_) => {
                debug!("No saved cart under '{}'; starting empty.", key);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read saved cart under '{}': {}", key, e);
                Vec::new()
            }
        };

        Self {
            items,
            storage,
            key,
            revision: 0,
            issued: Arc::new(AtomicU64::new(0)),
            write_gate: Arc::new(Mutex::new(())),
            writes: TaskTracker::new(),
            runtime: Handle::current(),
        }
    }

    // --- Mutations ---

    /// Adds one unit of `product`. An existing line is incremented (holding at 99);
    /// a new line is appended with a quantity of one.
    pub fn add(&mut self, product: &CatalogItem) {
        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_inc(),
            None => {
                if product.price.is_none() {
                    warn!("Adding product {} to the cart without a price.", product.id);
                }
                self.items.push(LineItem::from_product(product));
            }
        }
        self.persist();
    }

    /// Removes the line for `id`, if any.
    pub fn remove(&mut self, id: ProductId) {
        self.items.retain(|item| item.id != id);
        self.persist();
    }

    /// Sets the quantity of the line for `id`, clamped into `1..=99`.
    pub fn set_quantity(&mut self, id: ProductId, requested: i64) {
        self.apply_quantity(id, Quantity::clamped(requested));
    }

    /// Like [`set_quantity`](Self::set_quantity) but for raw user input, which is
    /// parsed permissively (non-numeric or absent input becomes 1).
    pub fn set_quantity_lenient(&mut self, id: ProductId, raw: Option<&str>) {
        self.apply_quantity(id, Quantity::parse_lenient(raw));
    }

    /// The cart row's +/- buttons: sets the quantity to `current + delta`.
    /// Stepping below one leaves the line at one.
    pub fn step_quantity(&mut self, id: ProductId, delta: i64) {
        let Some(current) = self.get(id).map(|item| item.quantity.get()) else {
            return;
        };
        self.set_quantity(id, i64::from(current).saturating_add(delta));
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn apply_quantity(&mut self, id: ProductId, quantity: Quantity) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
        self.persist();
    }

    // --- Reads ---

    /// Line items in the order they were first added.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.get()).sum()
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    // --- Persistence ---

    /// Waits for every spawned write to finish.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Spawns a write of the current state. A task that finds a newer revision
    /// already issued skips its write, leaving the slot to the newer task.
    fn persist(&mut self) {
        self.revision += 1;
        let revision = self.revision;
        self.issued.store(revision, Ordering::Release);

        let blob = match encode(&self.items) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to serialize cart revision {}: {}", revision, e);
                return;
            }
        };

        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();
        let issued = Arc::clone(&self.issued);
        let write_gate = Arc::clone(&self.write_gate);
        let write = async move {
            let _gate = write_gate.lock().await;
            let newest = issued.load(Ordering::Acquire);
            if newest > revision {
                debug!("Skipping stale cart write (revision {} < {}).", revision, newest);
                return;
            }
            if let Err(e) = storage.write(&key, &blob).await {
                warn!("Failed to persist cart revision {}: {}", revision, e);
            }
        };
        self.writes.spawn_on(write, &self.runtime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u64, price: Option<Decimal>, qty: u32) -> LineItem {
        LineItem {
            id: ProductId(id),
            title: format!("Product {id}"),
            unit_price: price,
            thumbnail: Some(format!("https://img.example/{id}.png")),
            quantity: Quantity::clamped(i64::from(qty)),
        }
    }

    #[test]
    fn encode_uses_the_persisted_field_names() {
        let blob = encode(&[line(1, Some(Decimal::new(125, 1)), 2)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": 1,
                "title": "Product 1",
                "price": 12.5,
                "thumbnail": "https://img.example/1.png",
                "qty": 2
            }])
        );
    }

    #[test]
    fn snapshot_round_trip_preserves_order_and_fields() {
        let items = vec![
            line(3, Some(Decimal::new(10, 0)), 1),
            line(1, Some(Decimal::new(125, 1)), 99),
            line(2, None, 4),
        ];
        let decoded = decode(&encode(&items).unwrap()).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn decode_sanitizes_records() {
        let blob = r#"[
            {"id": 1, "title": "Kept", "price": 5, "qty": 150},
            {"id": 2, "title": "Zero", "price": 5, "qty": 0},
            {"id": 3, "title": "Null qty", "qty": null},
            {"id": 1, "title": "Duplicate", "price": 9, "qty": 1},
            {"id": 4, "qty": 2}
        ]"#;
        let items = decode(blob).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Kept");
        assert_eq!(items[0].quantity.get(), 99);
        assert_eq!(items[1].id, ProductId(4));
        assert_eq!(items[1].title, "");
        assert_eq!(items[1].unit_price, None);
        assert_eq!(items[1].thumbnail, None);
    }

    #[test]
    fn decode_rejects_structural_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"id": 1}"#).is_err());
        assert!(decode(r#"[{"title": "no id", "qty": 1}]"#).is_err());
    }
}
