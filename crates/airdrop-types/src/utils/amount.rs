//! Token amount parsing.
//!
//! Amounts are unsigned 256-bit integers on the wire. Operators usually think
//! in whole tokens, so [`scale_token_amount`] converts `"10"` at 18 decimals
//! into `10 * 10^18`.

use alloy_primitives::utils::{format_units, parse_units, Unit};
use alloy_primitives::U256;
use thiserror::Error;

/// Reasons an amount string is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("Amount is empty")]
	Empty,
	#[error("Amount cannot be negative: {0}")]
	Negative(String),
	#[error("Amount is not a decimal integer: {0}")]
	NotDecimal(String),
	#[error("Amount {value} has more than {decimals} fractional digits")]
	TooPrecise { value: String, decimals: u8 },
	#[error("Amount does not fit in 256 bits: {0}")]
	Overflow(String),
	#[error("Token decimals must be at most 77, got {0}")]
	InvalidDecimals(u8),
}

fn is_digits(part: &str) -> bool {
	part.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a canonical base-10 unsigned integer into a `U256`.
///
/// Signs, hex prefixes, separators and fractional parts are rejected.
pub fn parse_amount(value: &str) -> Result<U256, AmountError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(AmountError::Empty);
	}
	if trimmed.starts_with('-') {
		return Err(AmountError::Negative(trimmed.to_string()));
	}
	if !is_digits(trimmed) {
		return Err(AmountError::NotDecimal(trimmed.to_string()));
	}
	U256::from_str_radix(trimmed, 10).map_err(|_| AmountError::Overflow(trimmed.to_string()))
}

/// Scales a human readable token amount by `10^decimals`.
///
/// Accepts an optional fractional part as long as it has no more digits than
/// the token has decimals, so `"1.5"` at 6 decimals yields `1_500_000`.
/// Anything other than digits around a single `.` is rejected.
pub fn scale_token_amount(value: &str, decimals: u8) -> Result<U256, AmountError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(AmountError::Empty);
	}
	if trimmed.starts_with('-') {
		return Err(AmountError::Negative(trimmed.to_string()));
	}
	let unit = Unit::new(decimals).ok_or(AmountError::InvalidDecimals(decimals))?;

	let (integer_part, fraction_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
	if !is_digits(integer_part)
		|| !is_digits(fraction_part)
		|| (integer_part.is_empty() && fraction_part.is_empty())
	{
		return Err(AmountError::NotDecimal(trimmed.to_string()));
	}
	// parse_units truncates extra digits instead of failing.
	if fraction_part.len() > decimals as usize {
		return Err(AmountError::TooPrecise {
			value: trimmed.to_string(),
			decimals,
		});
	}

	let overflow = || AmountError::Overflow(trimmed.to_string());
	let scaled = parse_units(trimmed, decimals).map_err(|_| overflow())?.get_absolute();

	// parse_units multiplies with wrapping arithmetic. A wrapped result always
	// lands below the scaled integer part.
	let floor = if integer_part.is_empty() {
		U256::ZERO
	} else {
		parse_amount(integer_part)?
			.checked_mul(unit.wei())
			.ok_or_else(overflow)?
	};
	if scaled < floor {
		return Err(overflow());
	}
	Ok(scaled)
}

/// Formats a raw on-chain amount with its decimal point for display.
///
/// Inverse of [`scale_token_amount`]; trailing fractional zeros are dropped,
/// so `10000000000000000000` at 18 decimals renders as `10`.
pub fn format_token_amount(amount: U256, decimals: u8) -> Result<String, AmountError> {
	let formatted =
		format_units(amount, decimals).map_err(|_| AmountError::InvalidDecimals(decimals))?;
	let (integer_part, fraction_part) = formatted
		.split_once('.')
		.unwrap_or((formatted.as_str(), ""));
	let fraction_part = fraction_part.trim_end_matches('0');
	if fraction_part.is_empty() {
		Ok(integer_part.to_string())
	} else {
		Ok(format!("{}.{}", integer_part, fraction_part))
	}
}
