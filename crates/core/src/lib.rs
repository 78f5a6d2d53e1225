//! Printloom Core - Shared types library.
//!
//! This crate provides common types used across all Printloom components:
//! - `api` - REST client for the store backend
//! - `storefront` - Public-facing print-on-demand shop
//! - `admin` - Back office for products, orders and change requests
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`pricing`] - Tax, discount and order total arithmetic
//! - [`pagination`] - Page slicing for client-side lists
//! - [`filter`] - Search and status filters for lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod filter;
pub mod pagination;
pub mod pricing;
pub mod types;

pub use filter::{StatusFilter, matches_search};
pub use pagination::{Page, page_count};
pub use pricing::{Discount, LineAmount, OrderTotals, PricingError, TaxRate};
pub use types::*;
