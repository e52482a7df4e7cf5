//! The persistence seam and ledger error taxonomy.

use framepay_types::Payment;

/// Errors raised by ledger operations.
///
/// `AlreadyCompleted` doubles as the surfaced form of a lost
/// optimistic race: the loser of two concurrent completions observes
/// it and renders "already completed" instead of retrying blindly.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Payment not found for reference id {0}")]
    NotFound(String),
    #[error("Payment {0} was completed already")]
    AlreadyCompleted(String),
    #[error("Transaction hash {0} is already recorded for another payment")]
    DuplicateHash(String),
    #[error("Reference id {0} is already taken")]
    DuplicateReferenceId(String),
    #[error("Comment was already set for payment {0}")]
    CommentAlreadySet(String),
    #[error("Invalid comment: {0}")]
    InvalidComment(String),
    #[error("Stale version for payment {0}")]
    VersionConflict(String),
    #[error("Could not assign a unique reference id after {0} attempts")]
    ReferenceIdExhausted(usize),
}

/// A store of payment rows.
///
/// Implementations guarantee:
/// - `insert` assigns the surrogate id and rejects a taken
///   `reference_id` ([`LedgerError::DuplicateReferenceId`]) or `hash`
///   ([`LedgerError::DuplicateHash`]);
/// - `update` applies only when the caller's `version` matches the
///   stored row ([`LedgerError::VersionConflict`] otherwise), bumps
///   the version, and re-checks hash uniqueness. Absent hashes do not
///   collide with each other.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<Payment, LedgerError>;

    async fn find_by_reference_id(&self, reference_id: &str) -> Option<Payment>;

    async fn update(&self, payment: Payment) -> Result<Payment, LedgerError>;
}
