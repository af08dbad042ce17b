//! Product catalog: the wire model, the inventory-authority seam, and the
//! balance cache every invoice flow validates against.

pub mod authority;
pub mod cache;
pub mod product;
pub mod service;

pub use authority::InventoryAuthority;
pub use cache::BalanceCache;
pub use product::{Product, ProductInput};
pub use service::CatalogService;
