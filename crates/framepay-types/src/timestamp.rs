//! Unix timestamps for ledger bookkeeping.
//!
//! A thin wrapper over seconds-since-epoch. Payments carry creation,
//! completion, and expiry instants; all comparisons happen in whole
//! seconds, which is as much resolution as the protocol needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time expressed as whole seconds since the Unix epoch.
///
/// Serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        Self(secs)
    }

    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_secs()))
    }

    pub fn plus_days(&self, days: u64) -> Self {
        self.plus(Duration::from_secs(days * 24 * 60 * 60))
    }

    pub fn plus_minutes(&self, minutes: u64) -> Self {
        self.plus(Duration::from_secs(minutes * 60))
    }

    /// True when this instant is strictly before `other`.
    pub fn is_before(&self, other: &UnixTimestamp) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UnixTimestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_days() {
        let start = UnixTimestamp::from_secs(1_000);
        assert_eq!(start.plus_days(7).as_secs(), 1_000 + 7 * 86_400);
    }

    #[test]
    fn test_ordering() {
        let earlier = UnixTimestamp::from_secs(10);
        let later = UnixTimestamp::from_secs(20);
        assert!(earlier.is_before(&later));
        assert!(!later.is_before(&earlier));
    }

    #[test]
    fn test_serde_as_integer() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "1700000000");
        let back: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
