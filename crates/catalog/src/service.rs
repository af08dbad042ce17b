//! Catalog workflow: list, create and update products against the inventory
//! authority, keeping the balance cache in step.

use std::sync::Arc;

use korp_core::{ApiError, ProductId};

use crate::authority::InventoryAuthority;
use crate::cache::BalanceCache;
use crate::product::{Product, ProductInput};

/// Product catalog facade over the inventory authority.
///
/// Mutations never patch the cache locally: the client cannot compute
/// print-driven decrements, so after every successful create/update the
/// full set is reloaded from the authority.
pub struct CatalogService {
    authority: Arc<dyn InventoryAuthority>,
    cache: BalanceCache,
}

impl CatalogService {
    pub fn new(authority: Arc<dyn InventoryAuthority>) -> Self {
        let cache = BalanceCache::new(Arc::clone(&authority));
        Self { authority, cache }
    }

    /// Shared cache handle; clones observe the same snapshot.
    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }

    /// Refresh and return the product list.
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.cache.refresh().await
    }

    /// Fetch a single product straight from the authority.
    pub async fn get(&self, id: ProductId) -> Result<Product, ApiError> {
        self.authority.get_product(id).await
    }

    /// Create a product, then reload the cache.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self.authority.create_product(input).await?;
        tracing::info!(product = %product.id, code = %product.code, "product created");
        self.reload_after_mutation().await;
        Ok(product)
    }

    /// Update a product, then reload the cache.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self.authority.update_product(id, input).await?;
        tracing::info!(product = %product.id, code = %product.code, "product updated");
        self.reload_after_mutation().await;
        Ok(product)
    }

    /// The mutation itself committed, so a failed reload only leaves the
    /// snapshot stale; it does not fail the operation.
    async fn reload_after_mutation(&self) {
        if let Err(err) = self.cache.refresh().await {
            tracing::warn!(%err, "post-mutation cache refresh failed; snapshot is stale");
        }
    }
}
