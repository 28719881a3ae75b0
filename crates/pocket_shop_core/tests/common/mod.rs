#![allow(dead_code)]

use async_trait::async_trait;
use pocket_shop_core::{
    CatalogItem, CatalogService, KeyValueStorage, PortError, PortResult, ProductId,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// In-memory storage that records every write and can be told to fail.
#[derive(Default)]
pub struct RecordingStorage {
    slots: Mutex<HashMap<String, String>>,
    pub writes: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl RecordingStorage {
    pub fn with_slot(key: &str, blob: &str) -> Self {
        let storage = Self::default();
        storage
            .slots
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_string());
        storage
    }

    pub fn slot(&self, key: &str) -> Option<String> {
        self.slots.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for RecordingStorage {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Storage("disk unavailable".to_string()));
        }
        Ok(self.slot(key))
    }

    async fn write(&self, key: &str, blob: &str) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("disk full".to_string()));
        }
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Storage whose first write parks until `release` is notified, so later
/// writes can be queued behind it. Reads always find nothing.
pub struct GatedStorage {
    written: Mutex<Vec<String>>,
    hold_next: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStorage {
    pub fn holding_first_write() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            hold_next: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Every completed write, in completion order.
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStorage for GatedStorage {
    async fn read(&self, _key: &str) -> PortResult<Option<String>> {
        Ok(None)
    }

    async fn write(&self, _key: &str, blob: &str) -> PortResult<()> {
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.written.lock().unwrap().push(blob.to_string());
        Ok(())
    }
}

/// Catalog fetcher returning a fixed answer and counting calls.
pub struct FixedCatalog {
    pub result: PortResult<Vec<CatalogItem>>,
    pub calls: AtomicUsize,
}

impl FixedCatalog {
    pub fn ok(items: Vec<CatalogItem>) -> Self {
        Self {
            result: Ok(items),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: PortError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CatalogService for FixedCatalog {
    async fn fetch_catalog(&self) -> PortResult<Vec<CatalogItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }

    async fn fetch_detail(&self, id: ProductId) -> PortResult<CatalogItem> {
        match &self.result {
            Ok(items) => items
                .iter()
                .find(|item| item.id == id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("Product {} not found", id))),
            Err(e) => Err(e.clone()),
        }
    }
}

pub fn product(id: u64, title: &str, price: i64) -> CatalogItem {
    CatalogItem {
        id: ProductId(id),
        title: title.to_string(),
        price: Some(Decimal::from(price)),
        description: format!("About {title}"),
        images: vec![format!("https://img.example/{id}/1.jpg")],
        thumbnail: Some(format!("https://img.example/{id}/thumb.jpg")),
    }
}

/// The two-product catalog used throughout the scenario tests.
pub fn shoe_and_hat() -> Vec<CatalogItem> {
    vec![product(1, "Red Shoe", 10), product(2, "Blue Hat", 5)]
}

/// `count` products titled "Item N".
pub fn numbered(count: u64) -> Vec<CatalogItem> {
    (1..=count)
        .map(|n| product(n, &format!("Item {n}"), n as i64))
        .collect()
}
