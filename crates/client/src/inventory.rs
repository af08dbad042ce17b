//! HTTP implementation of the inventory authority seam.

use async_trait::async_trait;
use korp_catalog::{InventoryAuthority, Product, ProductInput};
use korp_core::{ApiError, Classifier, ProductId};

use crate::http::{decode, transport_error};

/// `reqwest` client for the inventory authority (`/api/products`).
#[derive(Debug, Clone)]
pub struct HttpInventoryAuthority {
    base_url: String,
    http: reqwest::Client,
    classifier: Classifier,
}

impl HttpInventoryAuthority {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_classifier(base_url, Classifier::new())
    }

    pub fn with_classifier(base_url: impl Into<String>, classifier: Classifier) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            classifier,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/products{}", self.base_url, path)
    }
}

#[async_trait]
impl InventoryAuthority for HttpInventoryAuthority {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let resp = self
            .http
            .get(self.url(""))
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/{id}")))
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let resp = self
            .http
            .post(self.url(""))
            .json(input)
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let resp = self
            .http
            .put(self.url(&format!("/{id}")))
            .json(input)
            .send()
            .await
            .map_err(transport_error)?;
        decode(resp, &self.classifier).await
    }
}
