//! The inbound signed frame envelope.

use serde::{Deserialize, Serialize};

/// Marker prefix identifying the xmtp transport in
/// [`FrameSignaturePacket::client_protocol`].
pub const XMTP_PROTOCOL_PREFIX: &str = "xmtp";

/// Signed message bytes as submitted by the frame host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedData {
    /// Hex-encoded signed message.
    pub message_bytes: String,
}

/// The raw inbound frame submission body.
///
/// `untrusted_data` is host-supplied and never used for decisions; the
/// signed `trusted_data` bytes are handed to the external verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSignaturePacket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untrusted_data: Option<serde_json::Value>,
    pub trusted_data: TrustedData,
    /// Transport discriminator, e.g. `xmtp@2024-02-09`. Absent for the
    /// default protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_protocol: Option<String>,
}

impl FrameSignaturePacket {
    /// True when the envelope declares the xmtp transport.
    pub fn is_xmtp(&self) -> bool {
        self.client_protocol
            .as_deref()
            .is_some_and(|p| p.starts_with(XMTP_PROTOCOL_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_packet() {
        let packet: FrameSignaturePacket = serde_json::from_str(
            r#"{"trustedData":{"messageBytes":"0a0b0c"}}"#,
        )
        .unwrap();
        assert_eq!(packet.trusted_data.message_bytes, "0a0b0c");
        assert!(!packet.is_xmtp());
    }

    #[test]
    fn test_xmtp_prefix_detection() {
        let packet: FrameSignaturePacket = serde_json::from_str(
            r#"{"clientProtocol":"xmtp@2024-02-09","trustedData":{"messageBytes":"ff"}}"#,
        )
        .unwrap();
        assert!(packet.is_xmtp());

        let other: FrameSignaturePacket = serde_json::from_str(
            r#"{"clientProtocol":"farcaster@vNext","trustedData":{"messageBytes":"ff"}}"#,
        )
        .unwrap();
        assert!(!other.is_xmtp());
    }
}
