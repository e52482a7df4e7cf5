//! Receipt links and notification text.

use rust_decimal::Decimal;

use framepay_types::{Network, Payment, UnsupportedChainError};

/// Block explorer link for an executed transaction.
pub fn receipt_url(network: Network, tx_hash: &str) -> Result<String, UnsupportedChainError> {
    Ok(format!("{}/tx/{tx_hash}", network.explorer_url()?))
}

/// Receipt link of a completed payment, when one can be rendered.
pub fn payment_receipt_url(payment: &Payment) -> Option<String> {
    let hash = payment.hash.as_deref()?;
    receipt_url(payment.network, hash).ok()
}

/// Formats an amount compactly: `1.5k`, `2m`, else the plain number.
pub fn format_number_with_suffix(amount: Decimal) -> String {
    let million = Decimal::from(1_000_000);
    let thousand = Decimal::from(1_000);
    if amount >= million {
        format!("{}m", (amount / million).round_dp(1).normalize())
    } else if amount >= thousand {
        format!("{}k", (amount / thousand).round_dp(1).normalize())
    } else {
        amount.normalize().to_string()
    }
}

/// Display form of a payment's amount: the entered side, compacted.
pub fn format_amount(payment: &Payment) -> String {
    if let Some(usd) = payment.usd_amount {
        format!("${}", format_number_with_suffix(usd))
    } else if let Some(tokens) = payment.token_amount {
        format!(
            "{} {}",
            format_number_with_suffix(tokens),
            payment.token.to_uppercase()
        )
    } else {
        String::new()
    }
}

/// Direct-message body sent to the receiver once a payment completes
/// with a comment attached.
pub fn completion_message(payment: &Payment) -> String {
    let sender = payment
        .sender
        .as_ref()
        .and_then(|p| p.username.as_deref())
        .map(|u| format!("@{u}"))
        .or(payment.sender_address.clone())
        .unwrap_or_else(|| "Someone".to_string());

    let mut lines = vec![format!(
        "{sender} paid you {} 🎉",
        format_amount(payment)
    )];
    if let Some(comment) = payment.comment.as_deref() {
        lines.push(format!("💬 {comment}"));
    }
    if let Some(source) = payment.source_ref.as_deref() {
        lines.push(format!("🔗 Cast: {source}"));
    }
    if let Some(receipt) = payment_receipt_url(payment) {
        lines.push(format!("🧾 Receipt: {receipt}"));
    }
    lines.join("\n")
}

/// Link to the cast a frame interaction came from.
pub fn cast_link(author_username: &str, cast_hash: &str) -> String {
    let short = cast_hash.get(..10).unwrap_or(cast_hash);
    format!("https://warpcast.com/{author_username}/{short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepay_types::{PaymentKind, Profile};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_receipt_url() {
        assert_eq!(
            receipt_url(Network::BASE, "0xdead").unwrap(),
            "https://basescan.org/tx/0xdead"
        );
        assert!(receipt_url(Network::new(999_999), "0xdead").is_err());
    }

    #[test]
    fn test_number_suffixes() {
        assert_eq!(format_number_with_suffix(dec("5")), "5");
        assert_eq!(format_number_with_suffix(dec("2.50")), "2.5");
        assert_eq!(format_number_with_suffix(dec("1500")), "1.5k");
        assert_eq!(format_number_with_suffix(dec("2000000")), "2m");
    }

    #[test]
    fn test_cast_link_truncates_hash() {
        assert_eq!(
            cast_link("alice", "0x1234567890abcdef"),
            "https://warpcast.com/alice/0x12345678"
        );
    }

    #[test]
    fn test_completion_message() {
        let mut payment = Payment::new(
            PaymentKind::Frame,
            "a1B2c3D4".to_string(),
            None,
            Network::BASE,
            "usdc",
        );
        payment.usd_amount = Some(dec("5"));
        payment.hash = Some("0xdead".to_string());
        payment.comment = Some("thanks!".to_string());
        payment.sender = Some(Profile {
            identity: "0xSender".to_string(),
            username: Some("alice".to_string()),
            fid: Some(42),
            wallets: vec![],
            default_receiving_address: None,
            allowed: true,
        });

        let message = completion_message(&payment);
        assert!(message.starts_with("@alice paid you $5 🎉"));
        assert!(message.contains("💬 thanks!"));
        assert!(message.contains("🧾 Receipt: https://basescan.org/tx/0xdead"));
    }

    #[test]
    fn test_completion_message_anonymous_sender() {
        let mut payment = Payment::new(
            PaymentKind::Frame,
            "a1B2c3D4".to_string(),
            None,
            Network::BASE,
            "degen",
        );
        payment.token_amount = Some(dec("1500"));
        let message = completion_message(&payment);
        assert!(message.starts_with("Someone paid you 1.5k DEGEN 🎉"));
    }
}
