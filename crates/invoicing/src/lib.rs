//! Invoicing workflow: draft construction, the invoicing-authority seam, and
//! the OPEN → CLOSED lifecycle that consumes stock.

pub mod authority;
pub mod draft;
pub mod invoice;
pub mod lifecycle;

pub use authority::InvoicingAuthority;
pub use draft::{Draft, DraftError, DraftLine, LineCheck};
pub use invoice::{
    CreateInvoice, CreateInvoiceItem, Invoice, InvoiceItem, InvoiceStatus, PrintResponse,
};
pub use lifecycle::{InvoiceFlowError, InvoiceLifecycle};
