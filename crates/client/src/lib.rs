//! HTTP implementations of the authority seams, plus wiring helpers.
//!
//! Everything here is transport plumbing: requests go out via `reqwest`,
//! failures come back classified through `korp_core::Classifier`. Retry
//! policy, if any, belongs to the caller.

use std::sync::Arc;

use korp_catalog::CatalogService;
use korp_invoicing::InvoiceLifecycle;

pub mod config;
mod http;
pub mod inventory;
pub mod invoicing;

pub use config::ClientConfig;
pub use inventory::HttpInventoryAuthority;
pub use invoicing::HttpInvoicingAuthority;

/// Wire the full client core from a config: one catalog service and one
/// invoice lifecycle sharing a single balance cache.
pub fn bootstrap(config: &ClientConfig) -> (CatalogService, InvoiceLifecycle) {
    let inventory = Arc::new(HttpInventoryAuthority::new(config.inventory_url.clone()));
    let invoicing = Arc::new(HttpInvoicingAuthority::new(config.invoicing_url.clone()));

    let catalog = CatalogService::new(inventory);
    let lifecycle = InvoiceLifecycle::new(invoicing, catalog.cache().clone());
    (catalog, lifecycle)
}
