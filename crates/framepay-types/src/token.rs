//! Token registry for frame payments.
//!
//! Tokens are identified by a lowercase id (`"usdc"`, `"degen"`,
//! `"eth"`) scoped to a network. A [`TokenDeployment`] carries the
//! erc20 contract address and decimals needed to build transfer
//! call-data; the native token has no contract address.
//!
//! The registry is a fixed table. Looking up an id on a chain where it
//! is not deployed yields [`UnsupportedTokenError`], which step
//! handlers surface as a generic failure message rather than a crash.

use crate::network::Network;

/// Token id for USD Coin.
pub const USDC_TOKEN: &str = "usdc";
/// Token id for Degen.
pub const DEGEN_TOKEN: &str = "degen";
/// Token id for the native chain token.
pub const ETH_TOKEN: &str = "eth";

/// The all-zero address, used by hubs as a "no hash" sentinel.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A token deployment on a specific network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    /// Lowercase token id as carried in frame state.
    pub id: &'static str,
    /// Network the deployment lives on.
    pub network: Network,
    /// Erc20 contract address, `None` for the native token.
    pub address: Option<&'static str>,
    /// Number of decimals of the token.
    pub decimals: u8,
}

impl TokenDeployment {
    /// True for the chain-native token (plain value transfer).
    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }
}

/// Error returned when a token id is not deployed on the given chain.
#[derive(Debug, thiserror::Error)]
#[error("Token {id} not supported on chain {network}")]
pub struct UnsupportedTokenError {
    pub id: String,
    pub network: Network,
}

const REGISTRY: &[TokenDeployment] = &[
    TokenDeployment {
        id: ETH_TOKEN,
        network: Network::BASE,
        address: None,
        decimals: 18,
    },
    TokenDeployment {
        id: USDC_TOKEN,
        network: Network::BASE,
        address: Some("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        decimals: 6,
    },
    TokenDeployment {
        id: DEGEN_TOKEN,
        network: Network::BASE,
        address: Some("0x4ed4E862860beD51a9570b96d89aF5E1B0Efefed"),
        decimals: 18,
    },
    TokenDeployment {
        id: ETH_TOKEN,
        network: Network::OPTIMISM,
        address: None,
        decimals: 18,
    },
    TokenDeployment {
        id: USDC_TOKEN,
        network: Network::OPTIMISM,
        address: Some("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
        decimals: 6,
    },
    TokenDeployment {
        id: DEGEN_TOKEN,
        network: Network::DEGEN,
        address: None,
        decimals: 18,
    },
];

/// All known token deployments.
pub fn tokens() -> &'static [TokenDeployment] {
    REGISTRY
}

/// Finds the deployment of `id` on `network`.
pub fn find_token(
    id: &str,
    network: Network,
) -> Result<&'static TokenDeployment, UnsupportedTokenError> {
    let wanted = id.to_lowercase();
    REGISTRY
        .iter()
        .find(|t| t.id == wanted && t.network == network)
        .ok_or(UnsupportedTokenError {
            id: wanted,
            network,
        })
}

/// All deployments of a token id across networks.
pub fn deployments_of(id: &str) -> Vec<&'static TokenDeployment> {
    let wanted = id.to_lowercase();
    REGISTRY.iter().filter(|t| t.id == wanted).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_usdc_on_base() {
        let usdc = find_token("usdc", Network::BASE).unwrap();
        assert_eq!(usdc.decimals, 6);
        assert!(!usdc.is_native());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let degen = find_token("DEGEN", Network::BASE).unwrap();
        assert_eq!(degen.id, DEGEN_TOKEN);
    }

    #[test]
    fn test_native_degen_on_degen_chain() {
        let degen = find_token("degen", Network::DEGEN).unwrap();
        assert!(degen.is_native());
    }

    #[test]
    fn test_unknown_combination_rejected() {
        let err = find_token("degen", Network::OPTIMISM).unwrap_err();
        assert_eq!(err.to_string(), "Token degen not supported on chain 10");
    }

    #[test]
    fn test_deployments_of_spans_networks() {
        let usdc = deployments_of("usdc");
        assert!(usdc.len() >= 2);
        assert!(usdc.iter().all(|t| t.id == USDC_TOKEN));
    }
}
