//! Cache types for backend responses.

use std::sync::Arc;

use printloom_core::ProductId;

use crate::types::{Product, Settings};

/// Cache key for catalog and settings reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Settings,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Settings(Settings),
}
