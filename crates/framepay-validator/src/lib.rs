//! Signed frame message verification for the framepay protocol.
//!
//! Every frame submission arrives as a [`FrameSignaturePacket`]: a
//! signed blob plus an optional client protocol discriminator. This
//! crate normalizes two transports into one
//! [`ValidatedAction`](framepay_types::ValidatedAction):
//!
//! - the default hub-backed protocol, verified by [`HubVerifier`]
//! - the alternate xmtp protocol, verified by [`XmtpVerifier`]
//!
//! [`ProtocolVerifier`] dispatches once on the protocol prefix, so
//! step handlers never see transport details.
//!
//! # Fail closed
//!
//! Verification never returns an error to callers: any signature
//! failure, missing verified address, transport timeout, or verifier
//! outage collapses into `ValidatedAction::invalid()`. Validity is
//! re-checked on every submission; nothing is cached.

pub mod dispatch;
pub mod envelope;
pub mod hub;
pub mod xmtp;

pub use dispatch::*;
pub use envelope::*;
pub use hub::*;
pub use xmtp::*;
