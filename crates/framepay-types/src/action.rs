//! The normalized result of verifying a signed frame submission.
//!
//! Both supported transports (the hub-backed default protocol and
//! xmtp) are mapped into one [`ValidatedAction`] shape at the
//! validator boundary, so step handlers never branch on transport.
//!
//! A failed verification is not an error: it is a `ValidatedAction`
//! with `valid == false`, which every step renders as the inert
//! default response.

use serde::{Deserialize, Serialize};

/// The verified identity behind a frame submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// A hub-verified social identity.
    Farcaster {
        fid: u64,
        /// Verified addresses attached to the fid, highest-score first.
        addresses: Vec<String>,
        username: Option<String>,
    },
    /// An xmtp-verified wallet.
    Wallet { address: String },
}

impl Actor {
    /// Addresses usable for profile resolution.
    pub fn addresses(&self) -> Vec<String> {
        match self {
            Actor::Farcaster { addresses, .. } => addresses.clone(),
            Actor::Wallet { address } => vec![address.clone()],
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Actor::Farcaster { username, .. } => username.as_deref(),
            Actor::Wallet { .. } => None,
        }
    }
}

/// Provenance of the post the frame was embedded in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CastRef {
    pub hash: Option<String>,
    pub parent_hash: Option<String>,
    pub parent_url: Option<String>,
    pub author_username: Option<String>,
    pub author_fid: Option<u64>,
}

/// A verified, transport-normalized frame action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAction {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Actor>,
    /// 1-based index of the tapped button, when a button was tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
    /// Hash of a transaction the client wallet already executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// Executing wallet address reported alongside the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executing_address: Option<String>,
    /// Opaque prior-state payload, base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Display name of the client app the submission came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<CastRef>,
}

impl ValidatedAction {
    /// The fixed fail-closed result: not valid, nothing extracted.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            actor: None,
            button_index: None,
            input_text: None,
            transaction_hash: None,
            executing_address: None,
            state: None,
            source_app: None,
            cast: None,
        }
    }

    /// Input text, trimmed, `None` when blank.
    pub fn input(&self) -> Option<&str> {
        self.input_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_is_empty() {
        let action = ValidatedAction::invalid();
        assert!(!action.valid);
        assert!(action.actor.is_none());
        assert!(action.state.is_none());
    }

    #[test]
    fn test_blank_input_is_none() {
        let mut action = ValidatedAction::invalid();
        action.input_text = Some("   ".to_string());
        assert!(action.input().is_none());
        action.input_text = Some(" 5 ".to_string());
        assert_eq!(action.input(), Some("5"));
    }

    #[test]
    fn test_actor_addresses() {
        let farcaster = Actor::Farcaster {
            fid: 7,
            addresses: vec!["0xA".to_string(), "0xB".to_string()],
            username: Some("alice".to_string()),
        };
        assert_eq!(farcaster.addresses().len(), 2);

        let wallet = Actor::Wallet {
            address: "0xC".to_string(),
        };
        assert_eq!(wallet.addresses(), vec!["0xC".to_string()]);
        assert!(wallet.username().is_none());
    }
}
