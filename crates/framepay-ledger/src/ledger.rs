//! Domain rules of the payment ledger.
//!
//! [`PaymentLedger`] wraps a [`PaymentStore`] and owns every status
//! transition the frame flow performs. Handlers never mutate rows
//! directly; they ask the ledger, and the ledger decides based on the
//! stored row, not on anything client-supplied.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use uuid::Uuid;

use framepay_types::{
    MAX_COMMENT_LENGTH, Network, Payment, PaymentKind, PaymentStatus, Profile, UnixTimestamp,
};

use crate::store::{LedgerError, PaymentStore};

/// Length of the external reference id.
pub const REFERENCE_ID_LENGTH: usize = 8;
/// Bound on reference-id regeneration before a hard failure.
pub const MAX_REFERENCE_ID_ATTEMPTS: usize = 8;

/// Inputs for creating a payment row.
#[derive(Debug, Clone, Default)]
pub struct NewPayment {
    pub receiver: Option<Profile>,
    pub receiver_address: Option<String>,
    pub receiver_flow: Option<Uuid>,
    pub sender: Option<Profile>,
    pub sender_address: Option<String>,
    pub usd_amount: Option<Decimal>,
    pub token_amount: Option<Decimal>,
    pub source_app: Option<String>,
    pub source_ref: Option<String>,
    pub source_hash: Option<String>,
    /// Overrides the default 7-day expiry when set.
    pub expires_at: Option<UnixTimestamp>,
}

/// Post-hoc provenance for payments whose originating cast only
/// becomes known at confirmation time.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceBackfill {
    pub source_app: Option<String>,
    pub source_ref: Option<String>,
    pub source_hash: Option<String>,
}

/// The payment ledger.
#[derive(Clone)]
pub struct PaymentLedger {
    store: Arc<dyn PaymentStore>,
}

/// A fresh 8-char alphanumeric reference id.
pub fn generate_reference_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(REFERENCE_ID_LENGTH)
        .map(char::from)
        .collect()
}

impl PaymentLedger {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    /// Creates a payment with a fresh unique reference id.
    ///
    /// Collisions on the id are vanishingly rare but handled: the
    /// insert is retried with a regenerated id up to
    /// [`MAX_REFERENCE_ID_ATTEMPTS`] times before surfacing
    /// [`LedgerError::ReferenceIdExhausted`].
    pub async fn create(
        &self,
        kind: PaymentKind,
        network: Network,
        token: &str,
        new: NewPayment,
    ) -> Result<Payment, LedgerError> {
        for _ in 0..MAX_REFERENCE_ID_ATTEMPTS {
            let mut payment = Payment::new(
                kind,
                generate_reference_id(),
                new.receiver.clone(),
                network,
                token,
            );
            payment.receiver_address = new.receiver_address.clone();
            payment.receiver_flow = new.receiver_flow;
            payment.sender = new.sender.clone();
            payment.sender_address = new.sender_address.clone();
            payment.usd_amount = new.usd_amount;
            payment.token_amount = new.token_amount;
            payment.source_app = new.source_app.clone();
            payment.source_ref = new.source_ref.clone();
            payment.source_hash = new.source_hash.clone();
            if let Some(expires_at) = new.expires_at {
                payment.expires_at = expires_at;
            }
            match self.store.insert(payment).await {
                Ok(stored) => return Ok(stored),
                Err(LedgerError::DuplicateReferenceId(taken)) => {
                    tracing::warn!(reference_id = %taken, "Reference id collision, regenerating");
                }
                Err(other) => return Err(other),
            }
        }
        Err(LedgerError::ReferenceIdExhausted(MAX_REFERENCE_ID_ATTEMPTS))
    }

    pub async fn find_by_reference_id(&self, reference_id: &str) -> Option<Payment> {
        self.store.find_by_reference_id(reference_id).await
    }

    /// Records an executed transaction and completes the payment.
    ///
    /// Requires a pre-execution status. A lost optimistic race is
    /// reported as [`LedgerError::AlreadyCompleted`] so the caller
    /// renders "already completed" and does not notify twice.
    pub async fn mark_executed(
        &self,
        reference_id: &str,
        tx_hash: &str,
        sender_address: Option<&str>,
        backfill: Option<ProvenanceBackfill>,
    ) -> Result<Payment, LedgerError> {
        let mut payment = self
            .store
            .find_by_reference_id(reference_id)
            .await
            .ok_or_else(|| LedgerError::NotFound(reference_id.to_string()))?;
        if !payment.status.is_pre_execution() {
            return Err(LedgerError::AlreadyCompleted(reference_id.to_string()));
        }
        payment.hash = Some(tx_hash.to_string());
        payment.status = PaymentStatus::Completed;
        payment.completed_at = Some(UnixTimestamp::now());
        if let Some(address) = sender_address {
            if !address.trim().is_empty() {
                payment.sender_address = Some(address.to_string());
            }
        }
        if payment.source_hash.is_none() {
            if let Some(backfill) = backfill {
                payment.source_app = backfill.source_app.or(payment.source_app);
                payment.source_ref = backfill.source_ref.or(payment.source_ref);
                payment.source_hash = backfill.source_hash;
            }
        }
        match self.store.update(payment).await {
            Ok(stored) => Ok(stored),
            Err(LedgerError::VersionConflict(_)) => {
                Err(LedgerError::AlreadyCompleted(reference_id.to_string()))
            }
            Err(other) => Err(other),
        }
    }

    /// Sets the post-completion comment, at most once.
    pub async fn set_comment_once(
        &self,
        reference_id: &str,
        text: &str,
    ) -> Result<Payment, LedgerError> {
        let mut payment = self
            .store
            .find_by_reference_id(reference_id)
            .await
            .ok_or_else(|| LedgerError::NotFound(reference_id.to_string()))?;
        if payment.status != PaymentStatus::Completed {
            return Err(LedgerError::InvalidComment(
                "payment is not completed".to_string(),
            ));
        }
        if payment.comment.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            return Err(LedgerError::CommentAlreadySet(reference_id.to_string()));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(LedgerError::InvalidComment("comment is blank".to_string()));
        }
        if text.chars().count() > MAX_COMMENT_LENGTH {
            return Err(LedgerError::InvalidComment(format!(
                "comment exceeds {MAX_COMMENT_LENGTH} characters"
            )));
        }
        payment.comment = Some(text.to_string());
        match self.store.update(payment).await {
            Ok(stored) => Ok(stored),
            // The concurrent writer already set it.
            Err(LedgerError::VersionConflict(_)) => {
                Err(LedgerError::CommentAlreadySet(reference_id.to_string()))
            }
            Err(other) => Err(other),
        }
    }

    /// Reassigns a pending payment to in-app execution.
    pub async fn defer_to_intent(
        &self,
        reference_id: &str,
        sender: Profile,
    ) -> Result<Payment, LedgerError> {
        let mut payment = self
            .store
            .find_by_reference_id(reference_id)
            .await
            .ok_or_else(|| LedgerError::NotFound(reference_id.to_string()))?;
        if !payment.status.is_pre_execution() {
            return Err(LedgerError::AlreadyCompleted(reference_id.to_string()));
        }
        payment.kind = PaymentKind::Intent;
        payment.sender = Some(sender);
        match self.store.update(payment).await {
            Ok(stored) => Ok(stored),
            Err(LedgerError::VersionConflict(_)) => {
                Err(LedgerError::AlreadyCompleted(reference_id.to_string()))
            }
            Err(other) => Err(other),
        }
    }

    /// Marks a lapsed row as expired. Races are ignored: if another
    /// writer got there first, the stored outcome stands.
    pub async fn mark_expired(&self, reference_id: &str) {
        let Some(mut payment) = self.store.find_by_reference_id(reference_id).await else {
            return;
        };
        if payment.status.is_terminal() {
            return;
        }
        payment.status = PaymentStatus::Expired;
        if let Err(error) = self.store.update(payment).await {
            tracing::debug!(%reference_id, %error, "Expiry update skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::memory::InMemoryPaymentStore;

    fn ledger() -> PaymentLedger {
        PaymentLedger::new(Arc::new(InMemoryPaymentStore::new()))
    }

    /// Rejects the first `failures` inserts as reference-id
    /// collisions, then delegates to an in-memory store.
    struct CollidingStore {
        inner: InMemoryPaymentStore,
        failures: AtomicUsize,
        rejected: Mutex<Vec<String>>,
    }

    impl CollidingStore {
        fn new(failures: usize) -> Self {
            Self {
                inner: InMemoryPaymentStore::new(),
                failures: AtomicUsize::new(failures),
                rejected: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl PaymentStore for CollidingStore {
        async fn insert(&self, payment: Payment) -> Result<Payment, LedgerError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                self.rejected.lock().unwrap().push(payment.reference_id.clone());
                return Err(LedgerError::DuplicateReferenceId(payment.reference_id));
            }
            self.inner.insert(payment).await
        }

        async fn find_by_reference_id(&self, reference_id: &str) -> Option<Payment> {
            self.inner.find_by_reference_id(reference_id).await
        }

        async fn update(&self, payment: Payment) -> Result<Payment, LedgerError> {
            self.inner.update(payment).await
        }
    }

    fn usd(amount: u64) -> Decimal {
        Decimal::from(amount)
    }

    #[test]
    fn test_reference_id_shape() {
        let id = generate_reference_id();
        assert_eq!(id.len(), REFERENCE_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_create_assigns_unique_reference_ids() {
        let ledger = ledger();
        let first = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        let second = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        assert_ne!(first.reference_id, second.reference_id);
        assert_eq!(first.status, PaymentStatus::Created);
    }

    #[tokio::test]
    async fn test_create_regenerates_on_reference_id_collision() {
        let store = Arc::new(CollidingStore::new(2));
        let ledger = PaymentLedger::new(store.clone());
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        assert_eq!(payment.reference_id.len(), REFERENCE_ID_LENGTH);
        assert_eq!(payment.status, PaymentStatus::Created);

        // The stored id is a fresh draw, not one of the colliding ones.
        let rejected = store.rejected.lock().unwrap();
        assert_eq!(rejected.len(), 2);
        assert!(!rejected.contains(&payment.reference_id));
    }

    #[tokio::test]
    async fn test_create_gives_up_after_exhausting_attempts() {
        let store = Arc::new(CollidingStore::new(MAX_REFERENCE_ID_ATTEMPTS));
        let ledger = PaymentLedger::new(store);
        let err = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ReferenceIdExhausted(_)));
    }

    #[tokio::test]
    async fn test_create_honors_expiry_override() {
        let ledger = ledger();
        let expires_at = UnixTimestamp::now().plus_minutes(5);
        let payment = ledger
            .create(
                PaymentKind::Frame,
                Network::BASE,
                "usdc",
                NewPayment {
                    usd_amount: Some(usd(5)),
                    expires_at: Some(expires_at),
                    ..NewPayment::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(payment.expires_at, expires_at);
    }

    #[tokio::test]
    async fn test_mark_executed_completes_once() {
        let ledger = ledger();
        let payment = ledger
            .create(
                PaymentKind::Frame,
                Network::BASE,
                "usdc",
                NewPayment {
                    usd_amount: Some(usd(5)),
                    ..NewPayment::default()
                },
            )
            .await
            .unwrap();

        let completed = ledger
            .mark_executed(&payment.reference_id, "0xdead", Some("0xSender"), None)
            .await
            .unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
        assert_eq!(completed.hash.as_deref(), Some("0xdead"));
        assert_eq!(completed.sender_address.as_deref(), Some("0xSender"));
        assert!(completed.completed_at.is_some());

        let err = ledger
            .mark_executed(&payment.reference_id, "0xdead", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyCompleted(_)));
    }

    #[tokio::test]
    async fn test_mark_executed_rejects_duplicate_hash() {
        let ledger = ledger();
        let first = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        let second = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();

        ledger
            .mark_executed(&first.reference_id, "0xdead", None, None)
            .await
            .unwrap();
        let err = ledger
            .mark_executed(&second.reference_id, "0xdead", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateHash(_)));
    }

    #[tokio::test]
    async fn test_mark_executed_backfills_missing_provenance() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        let completed = ledger
            .mark_executed(
                &payment.reference_id,
                "0xdead",
                None,
                Some(ProvenanceBackfill {
                    source_app: Some("Warpcast".to_string()),
                    source_ref: Some("https://warpcast.com/bob/0xcast".to_string()),
                    source_hash: Some("0xcast".to_string()),
                }),
            )
            .await
            .unwrap();
        assert_eq!(completed.source_hash.as_deref(), Some("0xcast"));
        assert_eq!(completed.source_app.as_deref(), Some("Warpcast"));
    }

    #[tokio::test]
    async fn test_backfill_does_not_overwrite_existing_provenance() {
        let ledger = ledger();
        let payment = ledger
            .create(
                PaymentKind::Frame,
                Network::BASE,
                "usdc",
                NewPayment {
                    source_hash: Some("0xoriginal".to_string()),
                    source_app: Some("Original".to_string()),
                    ..NewPayment::default()
                },
            )
            .await
            .unwrap();
        let completed = ledger
            .mark_executed(
                &payment.reference_id,
                "0xdead",
                None,
                Some(ProvenanceBackfill {
                    source_app: Some("Other".to_string()),
                    source_ref: None,
                    source_hash: Some("0xother".to_string()),
                }),
            )
            .await
            .unwrap();
        assert_eq!(completed.source_hash.as_deref(), Some("0xoriginal"));
        assert_eq!(completed.source_app.as_deref(), Some("Original"));
    }

    #[tokio::test]
    async fn test_comment_set_once() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        ledger
            .mark_executed(&payment.reference_id, "0xdead", None, None)
            .await
            .unwrap();

        let commented = ledger
            .set_comment_once(&payment.reference_id, "thanks!")
            .await
            .unwrap();
        assert_eq!(commented.comment.as_deref(), Some("thanks!"));

        let err = ledger
            .set_comment_once(&payment.reference_id, "thanks again!")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CommentAlreadySet(_)));
    }

    #[tokio::test]
    async fn test_comment_rejected_before_completion() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        let err = ledger
            .set_comment_once(&payment.reference_id, "too early")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidComment(_)));
    }

    #[tokio::test]
    async fn test_comment_length_bound() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        ledger
            .mark_executed(&payment.reference_id, "0xdead", None, None)
            .await
            .unwrap();

        let overlong = "x".repeat(MAX_COMMENT_LENGTH + 1);
        let err = ledger
            .set_comment_once(&payment.reference_id, &overlong)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidComment(_)));

        // Comment remains unset after the rejection.
        let row = ledger.find_by_reference_id(&payment.reference_id).await.unwrap();
        assert!(row.comment.is_none());
    }

    #[tokio::test]
    async fn test_defer_to_intent() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        let sender = Profile {
            identity: "0xSender".to_string(),
            username: Some("alice".to_string()),
            fid: Some(42),
            wallets: vec![],
            default_receiving_address: None,
            allowed: true,
        };
        let deferred = ledger
            .defer_to_intent(&payment.reference_id, sender)
            .await
            .unwrap();
        assert_eq!(deferred.kind, PaymentKind::Intent);
        assert_eq!(deferred.sender.unwrap().identity, "0xSender");
        // Deferral does not complete the payment.
        assert!(deferred.status.is_pre_execution());
    }

    #[tokio::test]
    async fn test_mark_expired() {
        let ledger = ledger();
        let payment = ledger
            .create(PaymentKind::Frame, Network::BASE, "usdc", NewPayment::default())
            .await
            .unwrap();
        ledger.mark_expired(&payment.reference_id).await;
        let row = ledger.find_by_reference_id(&payment.reference_id).await.unwrap();
        assert_eq!(row.status, PaymentStatus::Expired);

        // Terminal rows are left alone.
        ledger.mark_expired(&payment.reference_id).await;
        let row = ledger.find_by_reference_id(&payment.reference_id).await.unwrap();
        assert_eq!(row.status, PaymentStatus::Expired);
    }
}
