//! Seams to the external services the flow depends on.
//!
//! The step controller only ever talks to these traits; the server
//! binary wires reqwest-backed implementations, tests wire fixtures.
//! All of them are best-effort from the flow's point of view: a
//! failed lookup degrades to the inert response and a failed
//! notification is logged and swallowed, never surfaced to the frame.

use rust_decimal::Decimal;
use uuid::Uuid;

use framepay_types::{Jar, Payment, Profile};

/// Resolves social identities to payment profiles.
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Looks up a profile by its identity handle or primary address.
    async fn resolve_identity(&self, identity: &str) -> Option<Profile>;

    /// Looks up the profile owning any of the given verified
    /// addresses. Returns the first match in address order.
    async fn resolve_addresses(&self, addresses: &[String]) -> Option<Profile>;
}

/// Resolves contribution jars.
#[async_trait::async_trait]
pub trait FlowResolver: Send + Sync {
    async fn find_jar_by_uuid(&self, uuid: Uuid) -> Option<Jar>;
}

/// Error returned when a token price cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Price for {0} unavailable")]
    Unavailable(String),
    #[error("Price for {token} is not positive: {price}")]
    NonPositive { token: String, price: Decimal },
}

/// Supplies USD prices for supported tokens.
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current USD price of one unit of `token`.
    ///
    /// Implementations reject zero and negative quotes with
    /// [`PricingError::NonPositive`] rather than letting them reach
    /// amount math.
    async fn usd_price(&self, token: &str) -> Result<Decimal, PricingError>;
}

/// Error returned when a notification cannot be delivered.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Delivers completion notifications and direct messages.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Announces a completed payment to interested parties.
    async fn payment_completed(&self, payment: &Payment) -> Result<(), NotificationError>;

    /// Sends a direct message to a profile.
    async fn direct_message(
        &self,
        recipient: &Profile,
        text: &str,
    ) -> Result<(), NotificationError>;
}
