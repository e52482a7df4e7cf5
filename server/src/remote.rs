//! Reqwest-backed collaborator implementations.
//!
//! One client per concern, all pointed at the backend API with the
//! same bounded timeout. Lookups degrade to `None` on any transport
//! or decode failure; the flow renders inert rather than erroring.

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use framepay_flow::{
    FlowResolver, IdentityResolver, NotificationError, NotificationSink, PriceOracle, PricingError,
};
use framepay_types::{Jar, Payment, Profile};

#[derive(Clone)]
struct BackendClient {
    base: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl BackendClient {
    fn new(base: Url, timeout: Duration) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base.as_str().trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| tracing::warn!(%url, %error, "Backend request failed"))
            .ok()?;
        if response.status() == StatusCode::NOT_FOUND {
            return None;
        }
        if !response.status().is_success() {
            tracing::warn!(%url, status = %response.status(), "Backend returned an error");
            return None;
        }
        response
            .json()
            .await
            .map_err(|error| tracing::warn!(%url, %error, "Backend response decode failed"))
            .ok()
    }

    async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(), String> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|error| format!("request to {url} failed: {error}"))?;
        if !response.status().is_success() {
            return Err(format!("{url} returned status {}", response.status()));
        }
        Ok(())
    }
}

/// Identity and jar lookups against the backend API.
#[derive(Clone)]
pub struct BackendDirectory {
    client: BackendClient,
}

impl BackendDirectory {
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self {
            client: BackendClient::new(base, timeout),
        }
    }
}

#[async_trait::async_trait]
impl IdentityResolver for BackendDirectory {
    async fn resolve_identity(&self, identity: &str) -> Option<Profile> {
        self.client.get_json(&format!("api/user/{identity}")).await
    }

    async fn resolve_addresses(&self, addresses: &[String]) -> Option<Profile> {
        for address in addresses {
            if let Some(profile) = self
                .client
                .get_json::<Profile>(&format!("api/user/{address}"))
                .await
            {
                return Some(profile);
            }
        }
        None
    }
}

#[async_trait::async_trait]
impl FlowResolver for BackendDirectory {
    async fn find_jar_by_uuid(&self, uuid: Uuid) -> Option<Jar> {
        self.client.get_json(&format!("api/flows/jar/{uuid}")).await
    }
}

#[derive(Debug, Deserialize)]
struct PriceQuote {
    price: Decimal,
}

/// Token price lookups against the backend API.
#[derive(Clone)]
pub struct BackendPriceOracle {
    client: BackendClient,
}

impl BackendPriceOracle {
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self {
            client: BackendClient::new(base, timeout),
        }
    }
}

#[async_trait::async_trait]
impl PriceOracle for BackendPriceOracle {
    async fn usd_price(&self, token: &str) -> Result<Decimal, PricingError> {
        let quote: PriceQuote = self
            .client
            .get_json(&format!("api/tokens/{token}/price"))
            .await
            .ok_or_else(|| PricingError::Unavailable(token.to_string()))?;
        if quote.price <= Decimal::ZERO {
            return Err(PricingError::NonPositive {
                token: token.to_string(),
                price: quote.price,
            });
        }
        Ok(quote.price)
    }
}

#[derive(serde::Serialize)]
struct DirectMessageRequest<'a> {
    identity: &'a str,
    text: &'a str,
}

/// Notification delivery through the backend API.
#[derive(Clone)]
pub struct BackendNotifier {
    client: BackendClient,
}

impl BackendNotifier {
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self {
            client: BackendClient::new(base, timeout),
        }
    }
}

#[async_trait::async_trait]
impl NotificationSink for BackendNotifier {
    async fn payment_completed(&self, payment: &Payment) -> Result<(), NotificationError> {
        self.client
            .post_json("api/notifications/payments", payment)
            .await
            .map_err(NotificationError)
    }

    async fn direct_message(
        &self,
        recipient: &Profile,
        text: &str,
    ) -> Result<(), NotificationError> {
        let body = DirectMessageRequest {
            identity: &recipient.identity,
            text,
        };
        self.client
            .post_json("api/notifications/messages", &body)
            .await
            .map_err(NotificationError)
    }
}
