//! Common types for the airdrop claim signer.
//!
//! This crate holds the value types shared by every other crate in the
//! workspace: claim tuples and their signing domain, the canonical signature
//! representation with its packed and split encodings, secret key handling,
//! configuration validation schemas and EIP-712 encoding helpers.

/// Claim tuples and typed-data signing domains.
pub mod claim;
/// Implementation registry used by pluggable key providers.
pub mod registry;
/// Secure string type for key material.
pub mod secret_string;
/// Canonical recoverable signature and its wire encodings.
pub mod signature;
/// Amount, hex and EIP-712 helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use alloy_primitives::{Address, B256, U256};
pub use claim::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use signature::*;
pub use utils::{
	format_token_amount, parse_address, parse_amount, scale_token_amount, truncate_id,
	without_0x_prefix, AmountError,
};
pub use validation::*;
