//! Verification for the alternate xmtp frame transport.
//!
//! Xmtp submissions are verified by a separate validation service.
//! The verified wallet address is the only identity the transport
//! offers; a response without one fails closed.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use framepay_types::{Actor, ValidatedAction};

use crate::dispatch::FrameMessageVerifier;
use crate::envelope::FrameSignaturePacket;
use crate::hub::DEFAULT_VALIDATION_TIMEOUT;

/// Verifier backed by an xmtp frame validation service.
#[derive(Debug, Clone)]
pub struct XmtpVerifier {
    endpoint: Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl XmtpVerifier {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_VALIDATION_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn validate(
        &self,
        packet: &FrameSignaturePacket,
    ) -> Result<XmtpValidationResponse, reqwest::Error> {
        self.http
            .post(self.endpoint.clone())
            .json(packet)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait::async_trait]
impl FrameMessageVerifier for XmtpVerifier {
    async fn verify(&self, packet: &FrameSignaturePacket) -> ValidatedAction {
        let response = match self.validate(packet).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "Xmtp validation request failed");
                return ValidatedAction::invalid();
            }
        };
        // The verified wallet address is mandatory on this transport.
        let address = response
            .verified_wallet_address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        let Some(address) = address else {
            tracing::warn!("Xmtp frame message failed validation (missing verifiedWalletAddress)");
            return ValidatedAction::invalid();
        };
        let body = response.action_body.unwrap_or_default();
        ValidatedAction {
            valid: true,
            actor: Some(Actor::Wallet { address }),
            button_index: body.button_index,
            input_text: body.input_text,
            transaction_hash: None,
            executing_address: None,
            state: body.state,
            source_app: Some("Xmtp".to_string()),
            cast: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct XmtpValidationResponse {
    #[serde(default)]
    verified_wallet_address: Option<String>,
    #[serde(default)]
    action_body: Option<XmtpActionBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct XmtpActionBody {
    #[serde(default)]
    button_index: Option<u32>,
    #[serde(default)]
    input_text: Option<String>,
    #[serde(default)]
    state: Option<String>,
}
