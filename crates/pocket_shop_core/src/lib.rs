pub mod cart;
pub mod catalog;
pub mod domain;
pub mod ports;

pub use cart::{CartStore, CART_STORAGE_KEY};
pub use catalog::{CatalogView, LoadState, LoadTicket, PAGE_SIZE};
pub use domain::{CatalogItem, LineItem, ProductId, Quantity};
pub use ports::{CatalogService, KeyValueStorage, PortError, PortResult};
