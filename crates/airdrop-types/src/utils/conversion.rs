//! Conversion helpers for user supplied values.

use super::formatting::without_0x_prefix;
use alloy_primitives::Address;

/// Parses a 20-byte hex address, with or without a `0x` prefix.
///
/// Mixed-case input is accepted without enforcing the EIP-55 checksum,
/// matching how wallet tooling treats addresses copied from explorers.
pub fn parse_address(value: &str) -> Result<Address, String> {
	let trimmed = without_0x_prefix(value.trim());
	if trimmed.len() != 40 {
		return Err(format!(
			"Expected 40 hex characters for address, got {}",
			trimmed.len()
		));
	}
	trimmed
		.parse::<Address>()
		.map_err(|e| format!("Invalid address '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_parse_address() {
		let expected = address!("7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91");
		assert_eq!(
			parse_address("0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91").unwrap(),
			expected
		);
		assert_eq!(
			parse_address("7d91e637589ec3bb54d8213a9e92dc6e8d12da91").unwrap(),
			expected
		);
	}

	#[test]
	fn test_parse_address_rejects_bad_input() {
		assert!(parse_address("0x1234").is_err());
		assert!(parse_address("0xzz91e637589EC3Bb54D8213a9e92Dc6E8D12da91").is_err());
	}
}
