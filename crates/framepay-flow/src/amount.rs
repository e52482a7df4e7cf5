//! Amount selection and free-text amount parsing.
//!
//! Two entry points feed amounts into the flow: the jar contribution
//! step with its preset buttons plus a strict (0, 10] dollar input,
//! and the one-shot pay command whose text accepts a token or dollar
//! amount with optional multiplier suffixes.

use rust_decimal::Decimal;

use framepay_types::Network;

/// Preset dollar amounts offered on the amount step, button order.
pub const PRESET_USD_AMOUNTS: [u64; 3] = [1, 3, 5];

/// Upper bound of the free-text dollar amount on the jar flow.
pub const MAX_CUSTOM_USD: u64 = 10;

/// Input prompt of the amount step.
pub const AMOUNT_PROMPT: &str = "Enter amount, $ (1-10)";
/// Input prompt after a rejected custom amount.
pub const AMOUNT_PROMPT_AGAIN: &str = "Enter amount again, $ (1-10)";

/// Token id selected by a token-menu button, 1-based.
pub fn token_for_button(button_index: u32) -> Option<&'static str> {
    match button_index {
        1 => Some(framepay_types::USDC_TOKEN),
        2 => Some(framepay_types::DEGEN_TOKEN),
        _ => None,
    }
}

/// Preset dollar amount selected by an amount-step button, 1-based.
pub fn preset_for_button(button_index: u32) -> Option<Decimal> {
    PRESET_USD_AMOUNTS
        .get(button_index.checked_sub(1)? as usize)
        .copied()
        .map(Decimal::from)
}

/// Parses a free-text dollar amount from the jar flow.
///
/// Accepts an optional `$` prefix; the value must be a positive
/// decimal no greater than [`MAX_CUSTOM_USD`]. Anything else is
/// rejected as `None`.
pub fn parse_custom_usd(text: &str) -> Option<Decimal> {
    let raw = text.trim().strip_prefix('$').unwrap_or(text.trim());
    let amount: Decimal = raw.trim().parse().ok()?;
    if amount > Decimal::ZERO && amount <= Decimal::from(MAX_CUSTOM_USD) {
        Some(amount)
    } else {
        None
    }
}

/// A parsed pay command: `<amount> [token] [chain]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Set when the amount carried a `$` prefix.
    pub usd_amount: Option<Decimal>,
    /// Set for bare amounts, denominated in the token.
    pub token_amount: Option<Decimal>,
    /// Lowercase token id; defaults upstream when absent.
    pub token: Option<String>,
    /// Requested network; defaults upstream when absent.
    pub chain: Option<Network>,
}

/// Parses the free-text body of a pay command.
///
/// The leading word is the amount: `$`-prefixed values are dollar
/// amounts, bare values token amounts. A trailing `k` or `m`
/// multiplies by a thousand or a million, honored only when
/// `allow_suffixes` is set. Remaining words are matched as a token id
/// and a chain (numeric id or well-known name), in any order.
pub fn parse_command(text: &str, allow_suffixes: bool) -> Option<ParsedCommand> {
    let mut words = text.split_whitespace();
    let first = words.next()?;

    let (raw_amount, is_usd) = match first.strip_prefix('$') {
        Some(rest) => (rest, true),
        None => (first, false),
    };
    let amount = parse_suffixed_amount(raw_amount, allow_suffixes)?;
    if amount <= Decimal::ZERO {
        return None;
    }

    let mut token = None;
    let mut chain = None;
    for word in words {
        if let Some(network) = parse_chain(word) {
            chain = Some(network);
        } else if token.is_none() {
            token = Some(word.to_lowercase());
        } else {
            return None;
        }
    }

    Some(ParsedCommand {
        usd_amount: is_usd.then_some(amount),
        token_amount: (!is_usd).then_some(amount),
        token,
        chain,
    })
}

fn parse_suffixed_amount(raw: &str, allow_suffixes: bool) -> Option<Decimal> {
    let lowered = raw.to_lowercase();
    let (digits, multiplier) = match lowered.strip_suffix('k') {
        Some(rest) => (rest, 1_000u64),
        None => match lowered.strip_suffix('m') {
            Some(rest) => (rest, 1_000_000),
            None => (lowered.as_str(), 1),
        },
    };
    if multiplier > 1 && !allow_suffixes {
        return None;
    }
    let amount: Decimal = digits.parse().ok()?;
    Some(amount * Decimal::from(multiplier))
}

fn parse_chain(word: &str) -> Option<Network> {
    if let Ok(id) = word.parse::<u64>() {
        let network = Network::new(id);
        return network.is_supported().then_some(network);
    }
    match word.to_lowercase().as_str() {
        "base" => Some(Network::BASE),
        "optimism" | "op" => Some(Network::OPTIMISM),
        "zora" => Some(Network::ZORA),
        "degen" => Some(Network::DEGEN),
        "arbitrum" | "arb" => Some(Network::ARBITRUM),
        "mode" => Some(Network::MODE),
        "world" => Some(Network::WORLD),
        "ham" => Some(Network::HAM),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_buttons() {
        assert_eq!(token_for_button(1), Some("usdc"));
        assert_eq!(token_for_button(2), Some("degen"));
        assert_eq!(token_for_button(3), None);
        assert_eq!(token_for_button(0), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(preset_for_button(1), Some(Decimal::from(1)));
        assert_eq!(preset_for_button(3), Some(Decimal::from(5)));
        assert_eq!(preset_for_button(4), None);
    }

    #[test]
    fn test_custom_usd_bounds() {
        assert_eq!(parse_custom_usd("5"), Some(Decimal::from(5)));
        assert_eq!(parse_custom_usd(" $2.50 "), Some("2.50".parse().unwrap()));
        assert_eq!(parse_custom_usd("10"), Some(Decimal::from(10)));
        assert_eq!(parse_custom_usd("0"), None);
        assert_eq!(parse_custom_usd("-1"), None);
        assert_eq!(parse_custom_usd("10.01"), None);
        assert_eq!(parse_custom_usd("ten"), None);
        assert_eq!(parse_custom_usd(""), None);
    }

    #[test]
    fn test_command_usd_vs_token_amount() {
        let usd = parse_command("$5 usdc", false).unwrap();
        assert_eq!(usd.usd_amount, Some(Decimal::from(5)));
        assert_eq!(usd.token_amount, None);
        assert_eq!(usd.token.as_deref(), Some("usdc"));

        let tokens = parse_command("100 degen", false).unwrap();
        assert_eq!(tokens.usd_amount, None);
        assert_eq!(tokens.token_amount, Some(Decimal::from(100)));
        assert_eq!(tokens.token.as_deref(), Some("degen"));
    }

    #[test]
    fn test_command_suffixes_gated() {
        assert!(parse_command("5k degen", false).is_none());
        let parsed = parse_command("5k degen", true).unwrap();
        assert_eq!(parsed.token_amount, Some(Decimal::from(5_000)));
        let parsed = parse_command("1.5m degen", true).unwrap();
        assert_eq!(parsed.token_amount, Some(Decimal::from(1_500_000)));
    }

    #[test]
    fn test_command_chain_parsing() {
        let by_name = parse_command("$1 usdc base", false).unwrap();
        assert_eq!(by_name.chain, Some(Network::BASE));
        let by_id = parse_command("$1 usdc 10", false).unwrap();
        assert_eq!(by_id.chain, Some(Network::OPTIMISM));
        // Unsupported numeric chain is not a chain, and a second token
        // word is a parse failure.
        assert!(parse_command("$1 usdc 999999", false).is_none());
    }

    #[test]
    fn test_command_rejects_garbage() {
        assert!(parse_command("", false).is_none());
        assert!(parse_command("zero usdc", false).is_none());
        assert!(parse_command("-5 usdc", false).is_none());
        assert!(parse_command("5 usdc degen extra", false).is_none());
    }

    #[test]
    fn test_command_amount_only() {
        let parsed = parse_command("$3", false).unwrap();
        assert_eq!(parsed.usd_amount, Some(Decimal::from(3)));
        assert!(parsed.token.is_none());
        assert!(parsed.chain.is_none());
    }
}
