//! HTTP implementation of the invoicing authority seam.

use async_trait::async_trait;
use korp_core::{ApiError, Classifier, InvoiceId};
use korp_invoicing::{CreateInvoice, Invoice, InvoicingAuthority, PrintResponse};

use crate::http::{decode, transport_error};

/// `reqwest` client for the invoicing authority (`/api/invoices`).
#[derive(Debug, Clone)]
pub struct HttpInvoicingAuthority {
    base_url: String,
    http: reqwest::Client,
    classifier: Classifier,
}

impl HttpInvoicingAuthority {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_classifier(base_url, Classifier::new())
    }

    /// Override the status mapping, e.g. when the deployment signals a
    /// dependency outage with something other than 503.
    pub fn with_classifier(base_url: impl Into<String>, classifier: Classifier) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            classifier,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/invoices{}", self.base_url, path)
    }
}

#[async_trait]
impl InvoicingAuthority for HttpInvoicingAuthority {
    async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError> {
        let resp = self
            .http
            .get(self.url(""))
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/{id}")))
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn create_invoice(&self, submission: &CreateInvoice) -> Result<Invoice, ApiError> {
        let resp = self
            .http
            .post(self.url(""))
            .json(submission)
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn print_invoice(&self, id: InvoiceId) -> Result<PrintResponse, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/{id}/print")))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }
}
