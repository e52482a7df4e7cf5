//! Profiles, wallet collections, and contribution jars.
//!
//! These are the shapes returned by the external identity and flow
//! resolvers. The payment core never manages accounts; it only needs
//! enough of a profile to resolve a receiving wallet and address a
//! notification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::Network;

/// A chain-specific receiving wallet inside a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub network: Network,
    pub address: String,
}

/// A resolved user profile.
///
/// `identity` is the profile's primary address and the stable key used
/// to correlate senders and receivers across collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<u64>,
    /// Wallets of the profile's default receiving flow.
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    /// Fallback receiving address when no flow wallet matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_receiving_address: Option<String>,
    /// Whether the profile has been admitted to receive payments.
    #[serde(default)]
    pub allowed: bool,
}

impl Profile {
    /// Receiving address for `network`: the default-flow wallet on that
    /// chain if any, else the profile's fallback receiving address.
    pub fn receiving_address(&self, network: Network) -> Option<&str> {
        self.wallets
            .iter()
            .find(|w| w.network == network)
            .map(|w| w.address.as_str())
            .or(self.default_receiving_address.as_deref())
    }
}

/// A shared contribution target: a flow of receiving wallets owned by
/// a profile, addressed by a public UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jar {
    pub uuid: Uuid,
    pub profile: Profile,
    pub wallets: Vec<Wallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Jar {
    /// The jar's receiving wallet address on `network`, if configured.
    pub fn wallet_address(&self, network: Network) -> Option<&str> {
        self.wallets
            .iter()
            .find(|w| w.network == network)
            .map(|w| w.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_wallets() -> Profile {
        Profile {
            identity: "0xAaAa".to_string(),
            username: Some("alice".to_string()),
            fid: Some(42),
            wallets: vec![Wallet {
                network: Network::BASE,
                address: "0xBaseWallet".to_string(),
            }],
            default_receiving_address: Some("0xFallback".to_string()),
            allowed: true,
        }
    }

    #[test]
    fn test_receiving_address_prefers_flow_wallet() {
        let profile = profile_with_wallets();
        assert_eq!(profile.receiving_address(Network::BASE), Some("0xBaseWallet"));
    }

    #[test]
    fn test_receiving_address_falls_back() {
        let profile = profile_with_wallets();
        assert_eq!(profile.receiving_address(Network::DEGEN), Some("0xFallback"));
    }

    #[test]
    fn test_jar_wallet_by_network() {
        let jar = Jar {
            uuid: Uuid::new_v4(),
            profile: profile_with_wallets(),
            wallets: vec![Wallet {
                network: Network::BASE,
                address: "0xJar".to_string(),
            }],
            title: None,
        };
        assert_eq!(jar.wallet_address(Network::BASE), Some("0xJar"));
        assert_eq!(jar.wallet_address(Network::OPTIMISM), None);
    }
}
