//! Hub-backed verification for the default frame transport.
//!
//! The hub exposes a validation endpoint that checks the signature of
//! the submitted message bytes and, when valid, returns the decoded
//! action: who interacted, which button, any input text, any attached
//! transaction, and the echoed state.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use framepay_types::{Actor, CastRef, ValidatedAction};

use crate::dispatch::FrameMessageVerifier;
use crate::envelope::FrameSignaturePacket;

/// Default bound on a single hub validation round-trip.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_millis(2_500);

/// Verifier backed by a hub validation endpoint.
#[derive(Debug, Clone)]
pub struct HubVerifier {
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
}

impl HubVerifier {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            api_key,
            timeout: DEFAULT_VALIDATION_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn validate(&self, message_bytes: &str) -> Result<HubValidationResponse, reqwest::Error> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "message_bytes_in_hex": message_bytes,
                "cast_reaction_context": false,
                "follow_context": false,
                "signer_context": true,
            }))
            .timeout(self.timeout);
        if let Some(api_key) = &self.api_key {
            request = request.header("api_key", api_key.as_str());
        }
        request.send().await?.error_for_status()?.json().await
    }
}

#[async_trait::async_trait]
impl FrameMessageVerifier for HubVerifier {
    async fn verify(&self, packet: &FrameSignaturePacket) -> ValidatedAction {
        let response = match self.validate(&packet.trusted_data.message_bytes).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "Hub validation request failed");
                return ValidatedAction::invalid();
            }
        };
        if !response.valid {
            tracing::warn!("Frame message failed hub validation");
            return ValidatedAction::invalid();
        }
        let Some(action) = response.action else {
            tracing::warn!("Hub validation response is valid but carries no action");
            return ValidatedAction::invalid();
        };
        ValidatedAction::from(action)
    }
}

// Wire shape of the hub validation response. Unknown fields ignored.

#[derive(Debug, Deserialize)]
struct HubValidationResponse {
    valid: bool,
    action: Option<HubAction>,
}

#[derive(Debug, Deserialize)]
struct HubAction {
    interactor: HubInteractor,
    #[serde(default)]
    tapped_button: Option<HubTappedButton>,
    #[serde(default)]
    input: Option<HubInput>,
    #[serde(default)]
    state: Option<HubState>,
    #[serde(default)]
    transaction: Option<HubTransaction>,
    /// Wallet address that executed the attached transaction.
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    cast: Option<HubCast>,
    #[serde(default)]
    signer: Option<HubSigner>,
}

#[derive(Debug, Deserialize)]
struct HubInteractor {
    fid: u64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    verified_addresses: Option<HubVerifiedAddresses>,
}

#[derive(Debug, Deserialize)]
struct HubVerifiedAddresses {
    #[serde(default)]
    eth_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HubTappedButton {
    index: u32,
}

#[derive(Debug, Deserialize)]
struct HubInput {
    text: String,
}

#[derive(Debug, Deserialize)]
struct HubState {
    serialized: String,
}

#[derive(Debug, Deserialize)]
struct HubTransaction {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct HubCast {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    parent_hash: Option<String>,
    #[serde(default)]
    parent_url: Option<String>,
    #[serde(default)]
    author: Option<HubCastAuthor>,
}

#[derive(Debug, Deserialize)]
struct HubCastAuthor {
    #[serde(default)]
    fid: Option<u64>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HubSigner {
    #[serde(default)]
    client: Option<HubClient>,
}

#[derive(Debug, Deserialize)]
struct HubClient {
    #[serde(default)]
    display_name: Option<String>,
}

impl From<HubAction> for ValidatedAction {
    fn from(action: HubAction) -> Self {
        let addresses = action
            .interactor
            .verified_addresses
            .map(|a| a.eth_addresses)
            .unwrap_or_default();
        ValidatedAction {
            valid: true,
            actor: Some(Actor::Farcaster {
                fid: action.interactor.fid,
                addresses,
                username: action.interactor.username,
            }),
            button_index: action.tapped_button.map(|b| b.index),
            input_text: action.input.map(|i| i.text),
            transaction_hash: action.transaction.map(|t| t.hash),
            executing_address: action.address,
            state: action.state.map(|s| s.serialized),
            source_app: action.signer.and_then(|s| s.client).and_then(|c| c.display_name),
            cast: action.cast.map(|cast| CastRef {
                hash: cast.hash,
                parent_hash: cast.parent_hash,
                parent_url: cast.parent_url,
                author_username: cast.author.as_ref().and_then(|a| a.username.clone()),
                author_fid: cast.author.as_ref().and_then(|a| a.fid),
            }),
        }
    }
}
