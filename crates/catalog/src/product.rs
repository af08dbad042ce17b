//! Product read model as served by the inventory authority.

use chrono::{DateTime, Utc};
use korp_core::ProductId;
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// Owned exclusively by the inventory authority; the client only ever holds
/// the copy the authority last served. `balance` is decremented server-side
/// as a side effect of a successful print, never patched locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique business key, assigned by the catalog owner.
    pub code: String,
    pub description: String,
    /// Available unit count.
    pub balance: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a product. The authority rejects a duplicate
/// `code` with 409.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub code: String,
    pub description: String,
    pub balance: u32,
}
