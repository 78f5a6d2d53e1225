//! `/api/products` endpoints.
//!
//! Reads are public and cached; admin writes invalidate the cache.

use std::sync::Arc;

use printloom_core::ProductId;
use reqwest::Method;
use tracing::{debug, instrument};

use crate::Result;
use crate::cache::{CacheKey, CacheValue};
use crate::client::{ApiClient, BackendSession};
use crate::types::{Product, ProductInput};

impl ApiClient {
    /// The whole catalog.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> =
            Arc::new(self.get::<Vec<Product>>("/api/products", None).await?);
        self.store(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::NotFound`] for unknown ids.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get(&format!("/api/products/{id}"), None).await?;
        self.store(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Create a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend rejects the input.
    #[instrument(skip(self, session, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        session: &BackendSession,
        input: &ProductInput,
    ) -> Result<Product> {
        let product: Product = self
            .request(Method::POST, "/api/products", Some(input), Some(session))
            .await?;
        self.invalidate(&[CacheKey::Products]).await;
        Ok(product)
    }

    /// Update a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Status`] when the backend rejects the input.
    #[instrument(skip(self, session, input))]
    pub async fn update_product(
        &self,
        session: &BackendSession,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product> {
        let product: Product = self
            .request(
                Method::PUT,
                &format!("/api/products/{id}"),
                Some(input),
                Some(session),
            )
            .await?;
        self.invalidate(&[CacheKey::Products, CacheKey::Product(id)])
            .await;
        Ok(product)
    }

    /// Delete a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns an [`crate::ApiError`] if the backend call fails.
    #[instrument(skip(self, session))]
    pub async fn delete_product(&self, session: &BackendSession, id: ProductId) -> Result<()> {
        self.request_empty::<()>(
            Method::DELETE,
            &format!("/api/products/{id}"),
            None,
            Some(session),
        )
        .await?;
        self.invalidate(&[CacheKey::Products, CacheKey::Product(id)])
            .await;
        Ok(())
    }
}
