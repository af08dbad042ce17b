//! Seam to the inventory authority (the service owning products).

use async_trait::async_trait;
use korp_core::{ApiError, ProductId};

use crate::product::{Product, ProductInput};

/// REST collaborator owning the product catalog.
///
/// Implemented over HTTP in `korp-client`; tests substitute in-memory stubs.
/// Every failure arrives already classified.
#[async_trait]
pub trait InventoryAuthority: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError>;

    async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError>;

    async fn update_product(&self, id: ProductId, input: &ProductInput)
    -> Result<Product, ApiError>;
}
