//! `korp-core` — shared building blocks of the client core.
//!
//! Strongly-typed identifiers and the error taxonomy both the product and
//! invoice flows report through. No IO, no HTTP.

pub mod error;
pub mod id;

pub use error::{ApiError, Classifier, ErrorKind};
pub use id::{InvoiceId, ProductId};
