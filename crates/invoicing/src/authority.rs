//! Seam to the invoicing authority (the service owning invoices).

use async_trait::async_trait;
use korp_core::{ApiError, InvoiceId};

use crate::invoice::{CreateInvoice, Invoice, PrintResponse};

/// REST collaborator owning invoices.
///
/// `print_invoice` covers two coordinated steps inside the authority (stock
/// decrement and close) that this client never sees individually; the
/// observable contract is the status code alone. Implemented over HTTP in
/// `korp-client`; tests substitute in-memory stubs.
#[async_trait]
pub trait InvoicingAuthority: Send + Sync {
    async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError>;

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, ApiError>;

    async fn create_invoice(&self, submission: &CreateInvoice) -> Result<Invoice, ApiError>;

    async fn print_invoice(&self, id: InvoiceId) -> Result<PrintResponse, ApiError>;
}
