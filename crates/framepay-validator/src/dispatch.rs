//! Transport dispatch: one verifier trait, two concrete transports.
//!
//! The protocol check happens exactly once here, per the boundary
//! rule: step handlers receive a [`ValidatedAction`] and never inspect
//! the envelope themselves.

use std::sync::Arc;

use framepay_types::ValidatedAction;

use crate::envelope::FrameSignaturePacket;

/// Verifies a signed frame submission.
///
/// Implementations fail closed: all failure modes return
/// [`ValidatedAction::invalid`], never an error.
#[async_trait::async_trait]
pub trait FrameMessageVerifier: Send + Sync {
    async fn verify(&self, packet: &FrameSignaturePacket) -> ValidatedAction;
}

/// Dispatches each packet to the verifier matching its transport.
#[derive(Clone)]
pub struct ProtocolVerifier {
    hub: Arc<dyn FrameMessageVerifier>,
    xmtp: Arc<dyn FrameMessageVerifier>,
}

impl ProtocolVerifier {
    pub fn new(hub: Arc<dyn FrameMessageVerifier>, xmtp: Arc<dyn FrameMessageVerifier>) -> Self {
        Self { hub, xmtp }
    }
}

#[async_trait::async_trait]
impl FrameMessageVerifier for ProtocolVerifier {
    async fn verify(&self, packet: &FrameSignaturePacket) -> ValidatedAction {
        if packet.is_xmtp() {
            self.xmtp.verify(packet).await
        } else {
            self.hub.verify(packet).await
        }
    }
}
