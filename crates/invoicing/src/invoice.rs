//! Invoice wire model as served by the invoicing authority.

use chrono::{DateTime, Utc};
use korp_core::{InvoiceId, ProductId};
use serde::{Deserialize, Serialize};

/// Invoice lifecycle status.
///
/// The serialized tokens are the authority's wire representation and must
/// round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "ABERTA")]
    Open,
    #[serde(rename = "FECHADA")]
    Closed,
}

/// An invoice line, carrying the product snapshot the authority denormalized
/// into it at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub product_id: ProductId,
    pub product_code: String,
    pub description: String,
    pub quantity: u32,
}

/// A persisted invoice. Once `Closed`, the items, quantities and `closed_at`
/// never change again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Monotonic sequence assigned by the invoicing authority.
    pub number: u64,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on the transition to `Closed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn is_closed(&self) -> bool {
        self.status == InvoiceStatus::Closed
    }
}

/// Creation payload: bare product references and quantities. Display fields
/// are filled in server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub items: Vec<CreateInvoiceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoiceItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of a print response. Any 2xx means the stock decrement and the close
/// both committed; `success`/`message` are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
}
