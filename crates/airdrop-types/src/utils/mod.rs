//! Utility functions for amounts, hex strings and EIP-712 encoding.

pub mod amount;
pub mod conversion;
pub mod eip712;
pub mod formatting;

pub use amount::{format_token_amount, parse_amount, scale_token_amount, AmountError};
pub use conversion::parse_address;
pub use eip712::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE,
	LEGACY_RECIPIENT_TYPE, RECIPIENT_PRIMARY_TYPE, RECIPIENT_TYPE,
};
pub use formatting::{truncate_id, without_0x_prefix};
