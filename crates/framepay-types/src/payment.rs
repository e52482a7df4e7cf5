//! The payment ledger row and its status machine.
//!
//! A [`Payment`] is the single persisted record of a payment intent
//! moving through the frame flow. The external correlation key is the
//! short random `reference_id`; the surrogate `id` never leaves the
//! store. Statuses progress forward only, except the administrative
//! cancel/refund/expire arms.
//!
//! # Amount semantics
//!
//! Exactly one of `usd_amount` / `token_amount` is user-entered at
//! creation. The other is always derived through the pricing oracle at
//! the moment call-data is built, never persisted back as if entered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::Network;
use crate::profile::Profile;
use crate::timestamp::UnixTimestamp;

/// Default lifetime of a payment created through a frame.
pub const DEFAULT_EXPIRY_DAYS: u64 = 7;
/// Lifetime of ephemeral per-command payments.
pub const COMMAND_EXPIRY_MINUTES: u64 = 5;
/// Maximum accepted comment length.
pub const MAX_COMMENT_LENGTH: usize = 64;

/// How a payment was originated and is expected to be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    /// Created and executed inside the app.
    App,
    /// Created as an intent, executed later in the app.
    Intent,
    /// Created via a frame interaction, executed through one.
    Frame,
}

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Inprogress,
    /// Legacy alias of [`PaymentStatus::Inprogress`], kept for rows
    /// written by older deployments.
    Pending,
    Completed,
    PendingRefund,
    Refunded,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    /// True for statuses from which execution may still proceed.
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Created | PaymentStatus::Inprogress | PaymentStatus::Pending
        )
    }

    /// True for terminal statuses.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Refunded
                | PaymentStatus::Cancelled
                | PaymentStatus::Expired
        )
    }
}

/// A persisted payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Surrogate key assigned by the store; 0 until inserted.
    pub id: u64,
    pub kind: PaymentKind,
    /// 8-char alphanumeric external correlation key, globally unique.
    pub reference_id: String,
    pub status: PaymentStatus,
    pub network: Network,
    /// Lowercase token id (see [`crate::token`]).
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_address: Option<String>,
    /// Receiving wallet collection, when paying into a jar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_flow: Option<Uuid>,
    /// Executed transaction hash, globally unique once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    pub created_at: UnixTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<UnixTimestamp>,
    pub expires_at: UnixTimestamp,
    /// Optimistic concurrency counter, bumped by the store on update.
    pub version: u64,
}

impl Payment {
    /// Starts a new payment row with a caller-supplied reference id.
    ///
    /// Status starts at [`PaymentStatus::Created`] and expiry defaults
    /// to [`DEFAULT_EXPIRY_DAYS`] from now.
    pub fn new(
        kind: PaymentKind,
        reference_id: String,
        receiver: Option<Profile>,
        network: Network,
        token: impl Into<String>,
    ) -> Self {
        let now = UnixTimestamp::now();
        Self {
            id: 0,
            kind,
            reference_id,
            status: PaymentStatus::Created,
            network,
            token: token.into(),
            usd_amount: None,
            token_amount: None,
            sender: None,
            sender_address: None,
            receiver,
            receiver_address: None,
            receiver_flow: None,
            hash: None,
            comment: None,
            source_app: None,
            source_ref: None,
            source_hash: None,
            created_at: now,
            completed_at: None,
            expires_at: now.plus_days(DEFAULT_EXPIRY_DAYS),
            version: 0,
        }
    }

    /// Resolved receiving address: the receiver profile's wallet for
    /// the payment network when known, else the raw receiver address.
    pub fn resolved_receiver_address(&self) -> Option<&str> {
        if let Some(receiver) = &self.receiver {
            if let Some(address) = receiver.receiving_address(self.network) {
                return Some(address);
            }
        }
        self.receiver_address.as_deref()
    }

    /// True once the row's expiry instant has passed `now`.
    pub fn is_expired_at(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_before(&now)
    }

    /// Display identity of the receiving side, for images and receipts.
    pub fn receiver_identity(&self) -> Option<&str> {
        self.receiver
            .as_ref()
            .map(|r| r.identity.as_str())
            .or(self.receiver_address.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Wallet;

    #[test]
    fn test_new_payment_defaults() {
        let payment = Payment::new(
            PaymentKind::Frame,
            "a1B2c3D4".to_string(),
            None,
            Network::BASE,
            "usdc",
        );
        assert_eq!(payment.status, PaymentStatus::Created);
        assert_eq!(
            payment.expires_at.as_secs() - payment.created_at.as_secs(),
            DEFAULT_EXPIRY_DAYS * 86_400
        );
        assert_eq!(payment.version, 0);
        assert!(payment.hash.is_none());
    }

    #[test]
    fn test_status_classification() {
        assert!(PaymentStatus::Created.is_pre_execution());
        assert!(PaymentStatus::Pending.is_pre_execution());
        assert!(PaymentStatus::Inprogress.is_pre_execution());
        assert!(!PaymentStatus::Completed.is_pre_execution());
        assert!(PaymentStatus::Expired.is_terminal());
        assert!(!PaymentStatus::PendingRefund.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming() {
        let json = serde_json::to_string(&PaymentStatus::PendingRefund).unwrap();
        assert_eq!(json, "\"PENDING_REFUND\"");
    }

    #[test]
    fn test_resolved_receiver_prefers_profile_wallet() {
        let mut payment = Payment::new(
            PaymentKind::Frame,
            "ref00001".to_string(),
            Some(Profile {
                identity: "0xReceiver".to_string(),
                username: None,
                fid: None,
                wallets: vec![Wallet {
                    network: Network::BASE,
                    address: "0xFlowWallet".to_string(),
                }],
                default_receiving_address: None,
                allowed: true,
            }),
            Network::BASE,
            "usdc",
        );
        payment.receiver_address = Some("0xRaw".to_string());
        assert_eq!(payment.resolved_receiver_address(), Some("0xFlowWallet"));

        payment.receiver = None;
        assert_eq!(payment.resolved_receiver_address(), Some("0xRaw"));
    }

    #[test]
    fn test_expiry_check() {
        let payment = Payment::new(
            PaymentKind::Frame,
            "ref00002".to_string(),
            None,
            Network::BASE,
            "usdc",
        );
        let beyond = payment.expires_at.plus_minutes(1);
        assert!(payment.is_expired_at(beyond));
        assert!(!payment.is_expired_at(payment.created_at));
    }
}
