//! crates/pocket_shop_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storefront client.
//! The persisted cart format lives in `cart.rs`; these types carry no storage concerns.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a catalog entry. Serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

//=========================================================================================
// Quantity
//=========================================================================================

/// A line-item quantity, always within `Quantity::MIN..=Quantity::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 99;

    pub const ONE: Quantity = Quantity(Self::MIN);

    /// Clamps any integer into the allowed range.
    pub fn clamped(requested: i64) -> Self {
        let q = requested.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        // In range after the clamp, so the narrowing cannot truncate.
        Self(q as u32)
    }

    /// Permissive integer parse for raw user input.
    ///
    /// Reads an optional sign followed by the leading run of digits and ignores
    /// whatever trails it (`"12abc"` is 12). Absent, empty, zero, or digit-less
    /// input all become 1.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::ONE;
        };

        let (negative, rest) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        let digits: &str = {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };
        if digits.is_empty() {
            return Self::ONE;
        }

        // Anything too long for i64 is far outside the range anyway.
        let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
        match (negative, magnitude) {
            (_, 0) => Self::ONE,
            (true, m) => Self::clamped(-m),
            (false, m) => Self::clamped(m),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// One more, holding at the ceiling.
    pub fn saturating_inc(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=========================================================================================
// Cart and Catalog Entities
//=========================================================================================

/// One product + quantity entry in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    /// Absent when the product was added without a price.
    pub unit_price: Option<Decimal>,
    pub thumbnail: Option<String>,
    pub quantity: Quantity,
}

impl LineItem {
    /// Creates a fresh line item with a quantity of one.
    pub fn from_product(product: &CatalogItem) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            unit_price: product.price,
            thumbnail: product.cart_image().map(str::to_owned),
            quantity: Quantity::ONE,
        }
    }

    /// `unit_price × quantity`; a missing price counts as zero.
    pub fn line_total(&self) -> Decimal {
        self.unit_price.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity.get())
    }
}

/// A fetched product. Immutable once fetched; the whole catalog is replaced on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: ProductId,
    pub title: String,
    pub price: Option<Decimal>,
    pub description: String,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
}

impl CatalogItem {
    /// The image stored on a cart line: the thumbnail, else the first image.
    pub fn cart_image(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// The hero image on the detail screen: the first image, else the thumbnail.
    pub fn display_image(&self) -> Option<&str> {
        self.images
            .first()
            .map(String::as_str)
            .filter(|i| !i.is_empty())
            .or(self.thumbnail.as_deref())
    }
}
