//! Last-known product snapshot, shared across flows.

use std::sync::{Arc, RwLock};

use korp_core::{ApiError, ProductId};

use crate::authority::InventoryAuthority;
use crate::product::Product;

/// Read-through cache of the authoritative product set.
///
/// `current()` is synchronous and cheap; `refresh()` replaces the snapshot
/// wholesale, so readers never observe a partial replacement. There is no
/// TTL: staleness is resolved by the explicit refreshes the mutating flows
/// trigger. The handle is cheap to clone and every clone shares the same
/// snapshot.
#[derive(Clone)]
pub struct BalanceCache {
    authority: Arc<dyn InventoryAuthority>,
    snapshot: Arc<RwLock<Arc<Vec<Product>>>>,
}

impl BalanceCache {
    /// Create an empty cache over the given authority.
    pub fn new(authority: Arc<dyn InventoryAuthority>) -> Self {
        Self {
            authority,
            snapshot: Arc::new(RwLock::new(Arc::new(Vec::new()))),
        }
    }

    /// Latest snapshot. Never touches the network.
    pub fn current(&self) -> Arc<Vec<Product>> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Fetch the authoritative product set and swap it in atomically.
    ///
    /// On failure the previous snapshot stays in place and the classified
    /// error is returned to the caller; nothing is broadcast to passive
    /// readers. Two refreshes racing is last-write-wins, no merging.
    pub async fn refresh(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        let products = self.authority.list_products().await?;
        tracing::debug!(count = products.len(), "balance cache refreshed");

        let fresh = Arc::new(products);
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::clone(&fresh);
        Ok(fresh)
    }

    /// Look up a product in the current snapshot.
    pub fn find(&self, id: ProductId) -> Option<Product> {
        self.current().iter().find(|p| p.id == id).cloned()
    }

    /// Cached balance for a product, if the snapshot knows it.
    pub fn balance_of(&self, id: ProductId) -> Option<u32> {
        self.current().iter().find(|p| p.id == id).map(|p| p.balance)
    }
}

impl core::fmt::Debug for BalanceCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BalanceCache")
            .field("products", &self.current().len())
            .finish()
    }
}
