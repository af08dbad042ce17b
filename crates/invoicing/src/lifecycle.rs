//! Invoice state machine: OPEN on creation, CLOSED exactly once via print.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use korp_catalog::BalanceCache;
use korp_core::{ApiError, InvoiceId};
use thiserror::Error;

use crate::authority::InvoicingAuthority;
use crate::invoice::{CreateInvoice, Invoice, InvoiceStatus};

/// Failure of an invoice flow operation.
///
/// The first two variants are local guards raised before any network call;
/// `Api` wraps whatever the classifier made of a server response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvoiceFlowError {
    /// Print refused: this invoice was already observed CLOSED.
    #[error("invoice {0} is already closed")]
    AlreadyClosed(InvoiceId),
    /// Print refused: another print for the same invoice is still in flight.
    #[error("a print for invoice {0} is already in progress")]
    PrintPending(InvoiceId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Controller owning the OPEN → CLOSED transition.
///
/// Print is the only stock-consuming operation, and the authority performs
/// its two halves (decrement stock, close the invoice) all-or-nothing; the
/// client's job is the guards around issuing it and the interpretation of
/// the result. Locks here are bookkeeping only and are never held across an
/// await.
pub struct InvoiceLifecycle {
    authority: Arc<dyn InvoicingAuthority>,
    cache: BalanceCache,
    /// Last invoice observed from the authority, per id.
    observed: Mutex<HashMap<InvoiceId, Invoice>>,
    /// Ids with a print currently in flight. At most one per invoice.
    printing: Mutex<HashSet<InvoiceId>>,
}

/// Releases the in-flight mark on every exit path, including drops of an
/// abandoned print future.
struct PrintMark<'a> {
    printing: &'a Mutex<HashSet<InvoiceId>>,
    id: InvoiceId,
}

impl Drop for PrintMark<'_> {
    fn drop(&mut self) {
        self.printing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}

impl InvoiceLifecycle {
    pub fn new(authority: Arc<dyn InvoicingAuthority>, cache: BalanceCache) -> Self {
        Self {
            authority,
            cache,
            observed: Mutex::new(HashMap::new()),
            printing: Mutex::new(HashSet::new()),
        }
    }

    fn observed(&self) -> MutexGuard<'_, HashMap<InvoiceId, Invoice>> {
        self.observed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn printing(&self) -> MutexGuard<'_, HashSet<InvoiceId>> {
        self.printing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, invoice: Invoice) -> Invoice {
        self.observed().insert(invoice.id, invoice.clone());
        invoice
    }

    /// Last state this controller saw for an invoice, if any.
    pub fn last_observed(&self, id: InvoiceId) -> Option<Invoice> {
        self.observed().get(&id).cloned()
    }

    /// Submit a validated draft.
    ///
    /// Success yields the new OPEN invoice with authority-assigned id,
    /// number and timestamps. The cache is left alone: creation moves no
    /// stock. On failure nothing is recorded.
    pub async fn create(&self, submission: &CreateInvoice) -> Result<Invoice, InvoiceFlowError> {
        let invoice = self.authority.create_invoice(submission).await?;
        tracing::info!(invoice = %invoice.id, number = invoice.number, "invoice created");
        Ok(self.record(invoice))
    }

    /// Fetch one invoice, updating the last-observed state.
    pub async fn fetch(&self, id: InvoiceId) -> Result<Invoice, InvoiceFlowError> {
        let invoice = self.authority.get_invoice(id).await?;
        Ok(self.record(invoice))
    }

    /// List all invoices, updating the last-observed state for each.
    pub async fn list(&self) -> Result<Vec<Invoice>, InvoiceFlowError> {
        let invoices = self.authority.list_invoices().await?;
        let mut observed = self.observed();
        for invoice in &invoices {
            observed.insert(invoice.id, invoice.clone());
        }
        drop(observed);
        Ok(invoices)
    }

    /// Close the invoice and consume its stock.
    ///
    /// Two local guards run before any network call: an invoice already
    /// observed CLOSED is never re-sent, and a second print for an id with
    /// one in flight is refused — two prints racing could double-decrement
    /// stock if the authority does not serialize them. The guards are not a
    /// substitute for the authority's own checks; the client's view may be
    /// stale and the authority stays the final arbiter.
    pub async fn print(&self, id: InvoiceId) -> Result<Invoice, InvoiceFlowError> {
        if let Some(invoice) = self.observed().get(&id) {
            if invoice.is_closed() {
                return Err(InvoiceFlowError::AlreadyClosed(id));
            }
        }
        if !self.printing().insert(id) {
            return Err(InvoiceFlowError::PrintPending(id));
        }
        let _mark = PrintMark {
            printing: &self.printing,
            id,
        };

        let outcome = self.print_inner(id).await;
        match &outcome {
            Ok(invoice) => {
                tracing::info!(invoice = %id, closed_at = ?invoice.closed_at, "invoice printed");
            }
            Err(err) => {
                tracing::warn!(invoice = %id, %err, "print failed; invoice remains open");
            }
        }
        outcome
    }

    async fn print_inner(&self, id: InvoiceId) -> Result<Invoice, InvoiceFlowError> {
        let response = self.authority.print_invoice(id).await?;

        // Any 2xx means both authority-side steps committed, so stock moved
        // and the snapshot is stale from here on. A failed refresh only
        // leaves it stale; the print itself stands.
        if let Err(err) = self.cache.refresh().await {
            tracing::warn!(%err, "balance refresh after print failed; snapshot is stale");
        }

        let closed = match response.invoice {
            Some(invoice) => invoice,
            None => self.adopt_closed(id).await?,
        };
        Ok(self.record(closed))
    }

    /// 2xx with no invoice in the body: re-fetch, falling back to flipping
    /// the last-observed copy to CLOSED with its fields kept as-is.
    async fn adopt_closed(&self, id: InvoiceId) -> Result<Invoice, InvoiceFlowError> {
        match self.authority.get_invoice(id).await {
            Ok(invoice) => Ok(invoice),
            Err(err) => {
                tracing::warn!(invoice = %id, %err, "could not re-fetch printed invoice");
                match self.observed().get(&id).cloned() {
                    Some(mut invoice) => {
                        invoice.status = InvoiceStatus::Closed;
                        Ok(invoice)
                    }
                    None => Err(err.into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use korp_catalog::{InventoryAuthority, Product, ProductInput};
    use korp_core::{ErrorKind, ProductId};
    use tokio::sync::Notify;

    use super::*;
    use crate::draft::Draft;
    use crate::invoice::{InvoiceItem, PrintResponse};

    /// Inventory stub that only counts refreshes.
    struct RefreshCounter {
        products: Vec<Product>,
        list_calls: AtomicUsize,
    }

    impl RefreshCounter {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products,
                list_calls: AtomicUsize::new(0),
            }
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InventoryAuthority for RefreshCounter {
        async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.products.clone())
        }

        async fn get_product(&self, _id: ProductId) -> Result<Product, ApiError> {
            unimplemented!("not exercised by lifecycle tests")
        }

        async fn create_product(&self, _input: &ProductInput) -> Result<Product, ApiError> {
            unimplemented!("not exercised by lifecycle tests")
        }

        async fn update_product(
            &self,
            _id: ProductId,
            _input: &ProductInput,
        ) -> Result<Product, ApiError> {
            unimplemented!("not exercised by lifecycle tests")
        }
    }

    /// Invoicing stub with scripted print outcomes and an optional gate that
    /// holds a print open until the test releases it.
    struct StubInvoicing {
        invoices: Mutex<Vec<Invoice>>,
        print_outcomes: Mutex<VecDeque<Result<PrintResponse, ApiError>>>,
        print_calls: AtomicUsize,
        gate: Option<PrintGate>,
    }

    struct PrintGate {
        entered: Notify,
        release: Notify,
    }

    impl StubInvoicing {
        fn new() -> Self {
            Self {
                invoices: Mutex::new(Vec::new()),
                print_outcomes: Mutex::new(VecDeque::new()),
                print_calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated() -> Self {
            let mut stub = Self::new();
            stub.gate = Some(PrintGate {
                entered: Notify::new(),
                release: Notify::new(),
            });
            stub
        }

        fn push_print_outcome(&self, outcome: Result<PrintResponse, ApiError>) {
            self.print_outcomes.lock().unwrap().push_back(outcome);
        }

        fn seed_invoice(&self, invoice: Invoice) {
            self.invoices.lock().unwrap().push(invoice);
        }

        fn print_calls(&self) -> usize {
            self.print_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InvoicingAuthority for StubInvoicing {
        async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
            Ok(self.invoices.lock().unwrap().clone())
        }

        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, ApiError> {
            self.invoices
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| ApiError::from_kind(ErrorKind::NotFound))
        }

        async fn create_invoice(&self, submission: &CreateInvoice) -> Result<Invoice, ApiError> {
            let now = Utc::now();
            let invoice = Invoice {
                id: InvoiceId::new(),
                number: self.invoices.lock().unwrap().len() as u64 + 1,
                status: InvoiceStatus::Open,
                items: submission
                    .items
                    .iter()
                    .map(|item| InvoiceItem {
                        product_id: item.product_id,
                        product_code: "SKU".to_string(),
                        description: "stub".to_string(),
                        quantity: item.quantity,
                    })
                    .collect(),
                created_at: now,
                updated_at: now,
                closed_at: None,
            };
            self.seed_invoice(invoice.clone());
            Ok(invoice)
        }

        async fn print_invoice(&self, _id: InvoiceId) -> Result<PrintResponse, ApiError> {
            self.print_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            self.print_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::from_kind(ErrorKind::Unknown)))
        }
    }

    fn product(balance: u32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            code: "P1".to_string(),
            description: "test product".to_string(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    fn open_invoice(product_id: ProductId, quantity: u32) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: InvoiceId::new(),
            number: 1,
            status: InvoiceStatus::Open,
            items: vec![InvoiceItem {
                product_id,
                product_code: "P1".to_string(),
                description: "test product".to_string(),
                quantity,
            }],
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    fn closed(mut invoice: Invoice) -> Invoice {
        invoice.status = InvoiceStatus::Closed;
        invoice.closed_at = Some(Utc::now());
        invoice
    }

    fn lifecycle_with(
        inventory: Arc<RefreshCounter>,
        invoicing: Arc<StubInvoicing>,
    ) -> InvoiceLifecycle {
        InvoiceLifecycle::new(invoicing, BalanceCache::new(inventory))
    }

    #[tokio::test]
    async fn validated_draft_creates_an_open_invoice() {
        let stock = product(5);
        let inventory = Arc::new(RefreshCounter::new(vec![stock.clone()]));
        let invoicing = Arc::new(StubInvoicing::new());
        let cache = BalanceCache::new(inventory.clone());
        cache.refresh().await.unwrap();
        let lifecycle = InvoiceLifecycle::new(invoicing.clone(), cache.clone());

        let mut draft = Draft::new();
        let index = draft.add_line();
        draft.set_product(index, stock.id);
        draft.set_quantity(index, 3);

        let submission = draft.build_submission(&cache.current()).unwrap();
        let invoice = lifecycle.create(&submission).await.unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Open);
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].quantity, 3);
        // Creation moves no stock, so no refresh beyond the initial one.
        assert_eq!(inventory.list_calls(), 1);
        assert_eq!(
            lifecycle.last_observed(invoice.id).unwrap().status,
            InvoiceStatus::Open
        );
    }

    #[tokio::test]
    async fn successful_print_closes_and_refreshes() {
        let inventory = Arc::new(RefreshCounter::new(vec![product(2)]));
        let invoicing = Arc::new(StubInvoicing::new());
        let lifecycle = lifecycle_with(inventory.clone(), invoicing.clone());

        let invoice = open_invoice(ProductId::new(), 3);
        let id = invoice.id;
        invoicing.seed_invoice(invoice.clone());
        lifecycle.fetch(id).await.unwrap();

        invoicing.push_print_outcome(Ok(PrintResponse {
            success: true,
            message: "printed".to_string(),
            invoice: Some(closed(invoice)),
        }));

        let printed = lifecycle.print(id).await.unwrap();
        assert!(printed.is_closed());
        assert!(printed.closed_at.is_some());
        assert_eq!(inventory.list_calls(), 1);
        assert!(lifecycle.last_observed(id).unwrap().is_closed());
    }

    #[tokio::test]
    async fn dependency_failure_leaves_invoice_open() {
        let inventory = Arc::new(RefreshCounter::new(Vec::new()));
        let invoicing = Arc::new(StubInvoicing::new());
        let lifecycle = lifecycle_with(inventory.clone(), invoicing.clone());

        let invoice = open_invoice(ProductId::new(), 3);
        let id = invoice.id;
        invoicing.seed_invoice(invoice);
        lifecycle.fetch(id).await.unwrap();

        invoicing.push_print_outcome(Err(ApiError::from_kind(ErrorKind::DependencyUnavailable)));

        let err = lifecycle.print(id).await.unwrap_err();
        match err {
            InvoiceFlowError::Api(api) => {
                assert_eq!(api.kind, ErrorKind::DependencyUnavailable);
                assert!(api.is_retryable());
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(
            lifecycle.last_observed(id).unwrap().status,
            InvoiceStatus::Open
        );
        // No stock moved, no refresh.
        assert_eq!(inventory.list_calls(), 0);

        // The in-flight mark was released; a retry goes out again.
        invoicing.push_print_outcome(Err(ApiError::from_kind(ErrorKind::Unknown)));
        let _ = lifecycle.print(id).await;
        assert_eq!(invoicing.print_calls(), 2);
    }

    #[tokio::test]
    async fn print_on_observed_closed_invoice_never_hits_the_wire() {
        let inventory = Arc::new(RefreshCounter::new(Vec::new()));
        let invoicing = Arc::new(StubInvoicing::new());
        let lifecycle = lifecycle_with(inventory, invoicing.clone());

        let invoice = closed(open_invoice(ProductId::new(), 1));
        let id = invoice.id;
        invoicing.seed_invoice(invoice);
        lifecycle.fetch(id).await.unwrap();

        let err = lifecycle.print(id).await.unwrap_err();
        assert_eq!(err, InvoiceFlowError::AlreadyClosed(id));
        assert_eq!(invoicing.print_calls(), 0);
    }

    #[tokio::test]
    async fn second_print_while_pending_is_rejected_locally() {
        let inventory = Arc::new(RefreshCounter::new(Vec::new()));
        let invoicing = Arc::new(StubInvoicing::gated());
        let lifecycle = Arc::new(lifecycle_with(inventory, invoicing.clone()));

        let invoice = open_invoice(ProductId::new(), 1);
        let id = invoice.id;
        invoicing.seed_invoice(invoice.clone());
        lifecycle.fetch(id).await.unwrap();

        invoicing.push_print_outcome(Ok(PrintResponse {
            success: true,
            message: "printed".to_string(),
            invoice: Some(closed(invoice)),
        }));

        let first = {
            let lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.print(id).await })
        };
        // Wait until the first print is parked inside the authority.
        invoicing.gate.as_ref().unwrap().entered.notified().await;

        let err = lifecycle.print(id).await.unwrap_err();
        assert_eq!(err, InvoiceFlowError::PrintPending(id));
        assert_eq!(invoicing.print_calls(), 1);

        invoicing.gate.as_ref().unwrap().release.notify_one();
        let printed = first.await.unwrap().unwrap();
        assert!(printed.is_closed());

        // After completion the guard is the already-closed check.
        let err = lifecycle.print(id).await.unwrap_err();
        assert_eq!(err, InvoiceFlowError::AlreadyClosed(id));
        assert_eq!(invoicing.print_calls(), 1);
    }

    #[tokio::test]
    async fn print_without_body_invoice_refetches_from_authority() {
        let inventory = Arc::new(RefreshCounter::new(Vec::new()));
        let invoicing = Arc::new(StubInvoicing::new());
        let lifecycle = lifecycle_with(inventory, invoicing.clone());

        let invoice = open_invoice(ProductId::new(), 1);
        let id = invoice.id;
        invoicing.seed_invoice(closed(invoice));

        invoicing.push_print_outcome(Ok(PrintResponse {
            success: true,
            message: "printed".to_string(),
            invoice: None,
        }));

        let printed = lifecycle.print(id).await.unwrap();
        assert!(printed.is_closed());
    }

    #[tokio::test]
    async fn print_without_body_falls_back_to_local_close() {
        let inventory = Arc::new(RefreshCounter::new(Vec::new()));
        let invoicing = Arc::new(StubInvoicing::new());
        let lifecycle = lifecycle_with(inventory, invoicing.clone());

        // Observed once, then the authority forgets it (re-fetch will 404).
        let invoice = open_invoice(ProductId::new(), 1);
        let id = invoice.id;
        invoicing.seed_invoice(invoice.clone());
        lifecycle.fetch(id).await.unwrap();
        invoicing.invoices.lock().unwrap().clear();

        invoicing.push_print_outcome(Ok(PrintResponse {
            success: true,
            message: "printed".to_string(),
            invoice: None,
        }));

        let printed = lifecycle.print(id).await.unwrap();
        assert!(printed.is_closed());
        // Fields were kept; only the status flipped.
        assert_eq!(printed.number, invoice.number);
        assert_eq!(printed.closed_at, None);
        assert!(lifecycle.last_observed(id).unwrap().is_closed());
    }
}
