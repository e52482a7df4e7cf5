//! The opaque client-echoed frame state and its codec.
//!
//! Frames are stateless between submissions: the only continuity a
//! flow has besides the ledger row is a small state record the host
//! echoes back on every interaction. The record is serialized to JSON
//! and carried as base64 - opaque to the host, readable by us.
//!
//! The state is UI continuity only. It is never trusted for
//! authorization: anything that gates money movement is re-derived
//! from the ledger by `ref_id` and re-checked against the jar's
//! registered wallet.
//!
//! # Round-trip
//!
//! ```
//! use framepay_types::state::PaymentFrameState;
//! use framepay_types::network::Network;
//!
//! let state = PaymentFrameState::seed("0xA".to_string(), Network::BASE);
//! let token = state.encode();
//! assert_eq!(PaymentFrameState::decode(&token).unwrap(), state);
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Payment-intent state carried across frame round-trips.
///
/// Serialized field names match the wire form echoed by frame hosts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFrameState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<Network>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

/// Error returned when a carried state token cannot be decoded.
///
/// Callers treat this identically to "no prior state".
#[derive(Debug, thiserror::Error)]
#[error("Malformed frame state: {0}")]
pub struct MalformedStateError(String);

impl PaymentFrameState {
    /// Initial state at flow entry: receiving address plus the default
    /// chain, everything else unset.
    pub fn seed(address: String, chain_id: Network) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
            ..Self::default()
        }
    }

    /// Encodes the state into its transport-safe base64 token.
    pub fn encode(&self) -> String {
        // Serialization of a plain struct of options cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        BASE64.encode(json.as_bytes())
    }

    /// Decodes a base64 token back into state.
    pub fn decode(token: &str) -> Result<Self, MalformedStateError> {
        let bytes = BASE64
            .decode(token.trim())
            .map_err(|e| MalformedStateError(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| MalformedStateError(e.to_string()))
    }

    /// Decodes an optional token, mapping absence and malformed input
    /// both to `None`.
    pub fn decode_lenient(token: Option<&str>) -> Option<Self> {
        Self::decode(token?).ok()
    }

    /// True when the state describes a persisted, payable intent:
    /// address, chain, token, an amount, and a reference id.
    pub fn is_complete(&self) -> bool {
        self.address.is_some()
            && self.chain_id.is_some()
            && self.token.is_some()
            && (self.usd_amount.is_some() || self.token_amount.is_some())
            && self.ref_id.is_some()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_usd_amount(mut self, amount: Option<Decimal>) -> Self {
        self.usd_amount = amount;
        self
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_full_state() {
        let state = PaymentFrameState {
            address: Some("0xA".to_string()),
            chain_id: Some(Network::BASE),
            token: Some("degen".to_string()),
            usd_amount: Some(Decimal::from(5)),
            token_amount: None,
            ref_id: Some("a1B2c3D4".to_string()),
        };
        let decoded = PaymentFrameState::decode(&state.encode()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_round_trip_seed_state() {
        let state = PaymentFrameState::seed("0xA".to_string(), Network::BASE);
        let decoded = PaymentFrameState::decode(&state.encode()).unwrap();
        assert_eq!(decoded, state);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(PaymentFrameState::decode("!!! not base64 !!!").is_err());
        // valid base64, invalid JSON inside
        let garbage = BASE64.encode(b"{ not json");
        assert!(PaymentFrameState::decode(&garbage).is_err());
    }

    #[test]
    fn test_decode_truncated_token() {
        let token = PaymentFrameState::seed("0xA".to_string(), Network::BASE).encode();
        let truncated = &token[..token.len() / 2];
        assert!(
            PaymentFrameState::decode(truncated).is_err()
                || PaymentFrameState::decode_lenient(Some(truncated)).is_none()
        );
    }

    #[test]
    fn test_decode_lenient_maps_failures_to_none() {
        assert!(PaymentFrameState::decode_lenient(None).is_none());
        assert!(PaymentFrameState::decode_lenient(Some("^^^^")).is_none());
    }

    #[test]
    fn test_completeness_requires_amount_and_ref() {
        let mut state = PaymentFrameState::seed("0xA".to_string(), Network::BASE)
            .with_token("usdc")
            .with_ref_id("a1B2c3D4");
        assert!(!state.is_complete());
        state.usd_amount = Some(Decimal::from(3));
        assert!(state.is_complete());
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let state = PaymentFrameState::seed("0xA".to_string(), Network::BASE).with_ref_id("r");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"chainId\":8453"));
        assert!(json.contains("\"refId\":\"r\""));
    }
}
