//! Transfer call construction for the confirm step's TX sub-path.
//!
//! Amounts resolve against the stored payment row only: an entered
//! token amount is used as-is, a dollar amount is converted through
//! the oracle price and rounded by the display rule before encoding.
//! Native tokens become plain value transfers, erc20 tokens a
//! `transfer(address,uint256)` call.

use alloy_primitives::{Address, U256, hex};
use alloy_sol_types::{SolCall, sol};
use rust_decimal::{Decimal, RoundingStrategy};

use framepay_types::{
    FrameTransaction, FrameTransactionParams, Payment, UnsupportedTokenError, find_token,
};

use crate::collaborators::PricingError;

sol! {
    function transfer(address to, uint256 value) returns (bool);
}

/// Error produced while building transfer calls.
#[derive(Debug, thiserror::Error)]
pub enum CallDataError {
    #[error(transparent)]
    UnsupportedToken(#[from] UnsupportedTokenError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("Payment has no amount")]
    MissingAmount,
    #[error("Usd amount given but no token price")]
    MissingPrice,
    #[error("Receiver {0} is not a valid address")]
    InvalidReceiver(String),
    #[error("Amount {0} does not fit the token's base units")]
    AmountOverflow(Decimal),
    #[error("Amount {0} is not positive")]
    NonPositiveAmount(Decimal),
}

/// Rounds a converted token amount for display and execution.
///
/// Amounts below one keep five decimal places, larger amounts one,
/// both rounding half away from zero. The asymmetry keeps dust-sized
/// conversions meaningful without rendering long tails on big ones.
pub fn round_token_amount(amount: Decimal) -> Decimal {
    let scale = if amount < Decimal::ONE { 5 } else { 1 };
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Resolves the token amount of a payment.
///
/// An entered token amount wins outright; otherwise the usd amount is
/// converted at `price` and rounded via [`round_token_amount`].
pub fn resolve_token_amount(
    payment: &Payment,
    price: Option<Decimal>,
) -> Result<Decimal, CallDataError> {
    if let Some(tokens) = payment.token_amount {
        return Ok(tokens);
    }
    let usd = payment.usd_amount.ok_or(CallDataError::MissingAmount)?;
    let price = price.ok_or(CallDataError::MissingPrice)?;
    if price <= Decimal::ZERO {
        return Err(PricingError::NonPositive {
            token: payment.token.clone(),
            price,
        }
        .into());
    }
    Ok(round_token_amount(usd / price))
}

/// Converts a token amount into integer base units.
fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, CallDataError> {
    if amount <= Decimal::ZERO {
        return Err(CallDataError::NonPositiveAmount(amount));
    }
    let mantissa = amount.mantissa();
    let scale = amount.scale();
    let decimals = u32::from(decimals);
    let units = if decimals >= scale {
        let factor = 10i128
            .checked_pow(decimals - scale)
            .ok_or(CallDataError::AmountOverflow(amount))?;
        mantissa
            .checked_mul(factor)
            .ok_or(CallDataError::AmountOverflow(amount))?
    } else {
        // Sub-base-unit dust is truncated.
        mantissa / 10i128.pow(scale - decimals)
    };
    Ok(U256::from(units as u128))
}

/// Builds the wallet calls that settle `payment` to `receiver`.
///
/// `price` is required only when the payment carries a usd amount.
pub fn build_transfer_calls(
    payment: &Payment,
    receiver: &str,
    price: Option<Decimal>,
) -> Result<Vec<FrameTransaction>, CallDataError> {
    let deployment = find_token(&payment.token, payment.network)?;
    let amount = resolve_token_amount(payment, price)?;
    let units = to_base_units(amount, deployment.decimals)?;

    let params = match deployment.address {
        None => FrameTransactionParams {
            abi: vec![],
            to: receiver.to_string(),
            data: None,
            value: Some(units.to_string()),
        },
        Some(contract) => {
            let to: Address = receiver
                .parse()
                .map_err(|_| CallDataError::InvalidReceiver(receiver.to_string()))?;
            let call = transferCall { to, value: units };
            FrameTransactionParams {
                abi: vec![],
                to: contract.to_string(),
                data: Some(format!("0x{}", hex::encode(call.abi_encode()))),
                value: None,
            }
        }
    };

    Ok(vec![FrameTransaction {
        chain_id: payment.network.caip2(),
        method: "eth_sendTransaction".to_string(),
        params,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepay_types::{Network, PaymentKind};

    fn payment(token: &str) -> Payment {
        Payment::new(
            PaymentKind::Frame,
            "a1B2c3D4".to_string(),
            None,
            Network::BASE,
            token,
        )
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_rounding_above_one_keeps_one_place() {
        // 3.0 usd at 0.45 usd/token
        assert_eq!(round_token_amount(dec("3.0") / dec("0.45")), dec("6.7"));
    }

    #[test]
    fn test_rounding_below_one_keeps_five_places() {
        // 0.5 usd at 2.0 usd/token
        assert_eq!(round_token_amount(dec("0.5") / dec("2.0")), dec("0.25000"));
    }

    #[test]
    fn test_rounding_half_goes_away_from_zero() {
        assert_eq!(round_token_amount(dec("1.25")), dec("1.3"));
        assert_eq!(round_token_amount(dec("0.000005")), dec("0.00001"));
    }

    #[test]
    fn test_token_amount_wins_over_usd() {
        let mut payment = payment("degen");
        payment.token_amount = Some(dec("100"));
        payment.usd_amount = Some(dec("5"));
        assert_eq!(resolve_token_amount(&payment, None).unwrap(), dec("100"));
    }

    #[test]
    fn test_usd_amount_requires_price() {
        let mut payment = payment("degen");
        payment.usd_amount = Some(dec("5"));
        assert!(matches!(
            resolve_token_amount(&payment, None),
            Err(CallDataError::MissingPrice)
        ));
        assert!(matches!(
            resolve_token_amount(&payment, Some(Decimal::ZERO)),
            Err(CallDataError::Pricing(_))
        ));
    }

    #[test]
    fn test_base_units() {
        assert_eq!(to_base_units(dec("5"), 6).unwrap(), U256::from(5_000_000u64));
        assert_eq!(
            to_base_units(dec("6.7"), 18).unwrap(),
            U256::from(6_700_000_000_000_000_000u128)
        );
        // Dust below the base unit truncates.
        assert_eq!(to_base_units(dec("0.0000001"), 6).unwrap(), U256::ZERO);
        assert!(to_base_units(Decimal::ZERO, 6).is_err());
    }

    #[test]
    fn test_erc20_transfer_call() {
        let mut row = payment("usdc");
        row.usd_amount = Some(dec("5"));
        let calls = build_transfer_calls(
            &row,
            "0x00000000000000000000000000000000000000A1",
            Some(Decimal::ONE),
        )
        .unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.chain_id, "eip155:8453");
        assert_eq!(call.method, "eth_sendTransaction");
        // Calls target the token contract, not the receiver.
        assert_eq!(
            call.params.to,
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
        );
        let data = call.params.data.as_deref().unwrap();
        assert!(data.starts_with("0xa9059cbb"));
        assert!(call.params.value.is_none());
    }

    #[test]
    fn test_native_value_transfer() {
        let mut row = payment("eth");
        row.token_amount = Some(dec("0.01"));
        let calls = build_transfer_calls(&row, "0xReceiver", None).unwrap();
        let call = &calls[0];
        assert_eq!(call.params.to, "0xReceiver");
        assert!(call.params.data.is_none());
        assert_eq!(
            call.params.value.as_deref(),
            Some("10000000000000000")
        );
    }

    #[test]
    fn test_unknown_token_rejected() {
        let mut row = payment("degen");
        row.network = Network::OPTIMISM;
        row.token_amount = Some(dec("1"));
        assert!(matches!(
            build_transfer_calls(&row, "0xReceiver", None),
            Err(CallDataError::UnsupportedToken(_))
        ));
    }

    #[test]
    fn test_bad_receiver_rejected_for_erc20() {
        let mut row = payment("usdc");
        row.token_amount = Some(dec("1"));
        assert!(matches!(
            build_transfer_calls(&row, "not-an-address", None),
            Err(CallDataError::InvalidReceiver(_))
        ));
    }
}
