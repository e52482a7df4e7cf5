//! In-memory payment store.
//!
//! Backs the ledger with a `RwLock`ed map plus the same uniqueness and
//! versioning guarantees a relational store provides: unique
//! `reference_id`, unique non-null `hash`, and compare-and-swap on the
//! version counter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use framepay_types::Payment;

use crate::store::{LedgerError, PaymentStore};

/// The default [`PaymentStore`].
#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    rows: RwLock<HashMap<String, Payment>>,
    next_id: AtomicU64,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored rows, for tests and health reporting.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn hash_taken_by_other(rows: &HashMap<String, Payment>, payment: &Payment) -> bool {
    let Some(hash) = payment.hash.as_deref() else {
        return false;
    };
    rows.values()
        .any(|row| row.reference_id != payment.reference_id && row.hash.as_deref() == Some(hash))
}

#[async_trait::async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, mut payment: Payment) -> Result<Payment, LedgerError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&payment.reference_id) {
            return Err(LedgerError::DuplicateReferenceId(payment.reference_id));
        }
        if hash_taken_by_other(&rows, &payment) {
            return Err(LedgerError::DuplicateHash(
                payment.hash.clone().unwrap_or_default(),
            ));
        }
        payment.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        payment.version = 0;
        rows.insert(payment.reference_id.clone(), payment.clone());
        Ok(payment)
    }

    async fn find_by_reference_id(&self, reference_id: &str) -> Option<Payment> {
        self.rows.read().await.get(reference_id).cloned()
    }

    async fn update(&self, mut payment: Payment) -> Result<Payment, LedgerError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&payment.reference_id)
            .ok_or_else(|| LedgerError::NotFound(payment.reference_id.clone()))?;
        if current.version != payment.version {
            return Err(LedgerError::VersionConflict(payment.reference_id));
        }
        if hash_taken_by_other(&rows, &payment) {
            return Err(LedgerError::DuplicateHash(
                payment.hash.clone().unwrap_or_default(),
            ));
        }
        payment.version += 1;
        rows.insert(payment.reference_id.clone(), payment.clone());
        Ok(payment)
    }
}
