//! String formatting helpers for identifiers and hex values.

/// Shortens an identifier for log output, keeping the first 10 characters.
///
/// Ten characters covers `0x` plus four address bytes, enough to tell
/// recipients apart in a batch log.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Strips a leading `0x` or `0X`.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
