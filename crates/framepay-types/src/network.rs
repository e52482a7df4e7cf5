//! Chain identifiers for supported payment networks.
//!
//! Frame payments run on EVM networks identified by their numeric
//! EIP-155 chain id. A [`Network`] is a plain newtype over that id,
//! with constants for the networks the protocol knows how to render
//! receipts for.
//!
//! # Example
//!
//! ```
//! use framepay_types::network::Network;
//!
//! let base = Network::BASE;
//! assert_eq!(base.id(), 8453);
//! assert_eq!(base.explorer_url().unwrap(), "https://basescan.org");
//! assert_eq!(base.to_string(), "8453");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An EIP-155 chain id.
///
/// Serializes to/from a bare number, matching the `chainId` field the
/// frame state carries across round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network(u64);

impl Network {
    pub const BASE: Network = Network(8453);
    pub const OPTIMISM: Network = Network(10);
    pub const ZORA: Network = Network(7777777);
    pub const DEGEN: Network = Network(666666666);
    pub const ARBITRUM: Network = Network(42161);
    pub const MODE: Network = Network(34443);
    pub const WORLD: Network = Network(480);
    pub const HAM: Network = Network(5112);

    /// The default network for frame-initiated payments.
    pub const DEFAULT_FRAME_PAYMENTS: Network = Network::BASE;

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u64 {
        self.0
    }

    /// CAIP-2 form of the chain id, used in frame transaction payloads.
    pub fn caip2(&self) -> String {
        format!("eip155:{}", self.0)
    }

    /// Base URL of the block explorer for this network.
    ///
    /// Returns [`UnsupportedChainError`] for networks the protocol does
    /// not issue receipts on.
    pub fn explorer_url(&self) -> Result<&'static str, UnsupportedChainError> {
        match self.0 {
            8453 => Ok("https://basescan.org"),
            10 => Ok("https://optimistic.etherscan.io"),
            7777777 => Ok("https://explorer.zora.energy"),
            666666666 => Ok("https://explorer.degen.tips"),
            42161 => Ok("https://arbiscan.io"),
            34443 => Ok("https://modescan.io"),
            480 => Ok("https://worldscan.org"),
            5112 => Ok("https://explorer.ham.fun"),
            _ => Err(UnsupportedChainError(self.0)),
        }
    }

    /// True when the protocol can settle payments on this network.
    pub fn is_supported(&self) -> bool {
        self.explorer_url().is_ok()
    }
}

/// Error returned for a chain id outside the supported set.
#[derive(Debug, thiserror::Error)]
#[error("Chain {0} not supported")]
pub struct UnsupportedChainError(pub u64);

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Network {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for Network {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Network)
    }
}
