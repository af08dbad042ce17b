//! Client-local invoice draft with optimistic quantity checks.
//!
//! A draft is never persisted; it only exists to be converted into a
//! [`CreateInvoice`] submission. Validation here is a best-effort UX check
//! against a cache that can be stale — the authority re-verifies everything
//! at create/print time, so a local pass is not a promise of acceptance.

use korp_catalog::Product;
use korp_core::ProductId;
use thiserror::Error;

use crate::invoice::{CreateInvoice, CreateInvoiceItem};

/// One line under construction. Fields stay optional until the user picks a
/// product and a quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: Option<ProductId>,
    pub quantity: Option<u32>,
}

/// Outcome of checking one line against the cached balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCheck {
    /// `0 < quantity <= cached balance`.
    Valid,
    /// Quantity is zero, exceeds the cached balance, or references a product
    /// the snapshot does not contain.
    Invalid,
    /// Product or quantity not chosen yet. Required-field validation owns
    /// this case; the quantity check treats it as passing.
    Incomplete,
}

/// Local rejection raised before any network round trip. Distinct from a
/// server-reported `ValidationFailed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("draft has no lines")]
    Empty,
    #[error("line {0} is missing a product or quantity")]
    IncompleteLine(usize),
    #[error("line {0}: quantity must be at least 1")]
    ZeroQuantity(usize),
    #[error("line {index}: product is not in the current snapshot")]
    UnknownProduct { index: usize },
    #[error("line {index}: requested {requested} but only {available} available")]
    InsufficientBalance {
        index: usize,
        requested: u32,
        available: u32,
    },
}

/// An invoice under construction: an ordered sequence of line entries.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    lines: Vec<DraftLine>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a fresh line with the default quantity of 1. Returns its index.
    pub fn add_line(&mut self) -> usize {
        self.lines.push(DraftLine {
            product_id: None,
            quantity: Some(1),
        });
        self.lines.len() - 1
    }

    /// Remove a line by position; later lines shift down.
    pub fn remove_line(&mut self, index: usize) -> Option<DraftLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn set_product(&mut self, index: usize, id: ProductId) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.product_id = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.quantity = Some(quantity);
                true
            }
            None => false,
        }
    }

    /// Check one line against the cached snapshot.
    pub fn validate_line(&self, index: usize, snapshot: &[Product]) -> LineCheck {
        let Some(line) = self.lines.get(index) else {
            return LineCheck::Incomplete;
        };
        let (Some(product_id), Some(quantity)) = (line.product_id, line.quantity) else {
            return LineCheck::Incomplete;
        };

        match snapshot.iter().find(|p| p.id == product_id) {
            Some(product) if quantity > 0 && quantity <= product.balance => LineCheck::Valid,
            _ => LineCheck::Invalid,
        }
    }

    /// Convert to the creation DTO, rejecting locally anything the cache can
    /// already see is wrong. Only `{product_id, quantity}` pairs cross the
    /// boundary; display fields are discarded.
    pub fn build_submission(&self, snapshot: &[Product]) -> Result<CreateInvoice, DraftError> {
        if self.lines.is_empty() {
            return Err(DraftError::Empty);
        }

        let mut items = Vec::with_capacity(self.lines.len());
        for (index, line) in self.lines.iter().enumerate() {
            let (Some(product_id), Some(quantity)) = (line.product_id, line.quantity) else {
                return Err(DraftError::IncompleteLine(index));
            };
            if quantity == 0 {
                return Err(DraftError::ZeroQuantity(index));
            }
            let Some(product) = snapshot.iter().find(|p| p.id == product_id) else {
                return Err(DraftError::UnknownProduct { index });
            };
            if quantity > product.balance {
                return Err(DraftError::InsufficientBalance {
                    index,
                    requested: quantity,
                    available: product.balance,
                });
            }
            items.push(CreateInvoiceItem {
                product_id,
                quantity,
            });
        }

        Ok(CreateInvoice { items })
    }
}
