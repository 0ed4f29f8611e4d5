//! Catalog domain: types, REST client, filters and the cache-aware service.

pub mod api;
pub mod api_types;
mod cache;
pub mod client;
pub mod confirm;
pub mod drafts;
pub mod filter;
pub mod service;
pub mod stats;
pub mod types;

pub use client::HttpCatalogClient;
pub use service::{Catalog, OrderPage, ProductPage, ResourceSnapshot, VirusPage};
