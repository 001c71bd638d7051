//! Claim tuples signed by the distribution authority.
//!
//! A [`ClaimRequest`] is the full set of values a signature may bind. The
//! plain scheme uses `(token, recipient, amount)`; the typed-data scheme uses
//! `(nonce, recipient, amount)` under a [`ClaimDomain`].

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Domain name used by the deployed claim contracts.
pub const DEFAULT_DOMAIN_NAME: &str = "Airdrop Signature";

/// Domain version used by the deployed claim contracts.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// EIP-712 domain scoping a typed claim to one contract on one chain.
///
/// `chain_id` and `verifying_contract` are optional so that a partially
/// configured domain can be represented and rejected at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDomain {
	/// Human readable signing domain name.
	pub name: String,
	/// Signing domain version.
	pub version: String,
	/// Chain the verifying contract is deployed on.
	pub chain_id: Option<u64>,
	/// Address of the verifying contract.
	pub verifying_contract: Option<Address>,
}

impl Default for ClaimDomain {
	fn default() -> Self {
		Self {
			name: DEFAULT_DOMAIN_NAME.to_string(),
			version: DEFAULT_DOMAIN_VERSION.to_string(),
			chain_id: None,
			verifying_contract: None,
		}
	}
}

impl ClaimDomain {
	/// Creates a domain with the given name and the default version.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Sets the chain id.
	pub fn with_chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = Some(chain_id);
		self
	}

	/// Sets the verifying contract address.
	pub fn with_verifying_contract(mut self, verifying_contract: Address) -> Self {
		self.verifying_contract = Some(verifying_contract);
		self
	}

	/// Sets the domain version.
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = version.into();
		self
	}
}

/// A claim authorization request.
///
/// Immutable once built. The typed-data digest does not bind `token`; the
/// verifying contract is configured with a single token instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
	/// Token the claim pays out in.
	pub token: Address,
	/// Wallet receiving the tokens.
	pub recipient: Address,
	/// Raw token amount, already scaled by the token decimals.
	pub amount: U256,
	/// Per-recipient nonce, required by the nonce-tracking typed schema.
	pub nonce: Option<U256>,
	/// Signing domain, required by both typed schemas.
	pub domain: Option<ClaimDomain>,
}

impl ClaimRequest {
	/// Creates a claim for the plain-hash scheme.
	pub fn new(token: Address, recipient: Address, amount: U256) -> Self {
		Self {
			token,
			recipient,
			amount,
			nonce: None,
			domain: None,
		}
	}

	/// Attaches a nonce.
	pub fn with_nonce(mut self, nonce: impl Into<U256>) -> Self {
		self.nonce = Some(nonce.into());
		self
	}

	/// Attaches a typed-data signing domain.
	pub fn with_domain(mut self, domain: ClaimDomain) -> Self {
		self.domain = Some(domain);
		self
	}
}
