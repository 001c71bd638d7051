//! Typed structured-data (EIP-712) claim scheme.
//!
//! A claim is hashed as a `Recipient` struct under the domain
//! `{name, version, chainId, verifyingContract}` and the resulting digest is
//! signed directly, with no personal-message envelope.
//!
//! Two incompatible `Recipient` layouts have been deployed and they are kept
//! apart on purpose: [`TypedSchema::Nonced`] binds a per-wallet nonce,
//! [`TypedSchema::Legacy`] does not.

use crate::ClaimError;
use airdrop_types::utils::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, LEGACY_RECIPIENT_TYPE,
	RECIPIENT_PRIMARY_TYPE, RECIPIENT_TYPE,
};
use airdrop_types::{ClaimDomain, ClaimRequest};
use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Versioned layout of the `Recipient` struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypedSchema {
	/// `Recipient(uint256 nonce,address wallet,uint256 amount)`.
	#[default]
	Nonced,
	/// `Recipient(address wallet,uint256 amount)`.
	Legacy,
}

impl TypedSchema {
	pub fn type_string(&self) -> &'static str {
		match self {
			TypedSchema::Nonced => RECIPIENT_TYPE,
			TypedSchema::Legacy => LEGACY_RECIPIENT_TYPE,
		}
	}

	pub fn type_hash(&self) -> B256 {
		keccak256(self.type_string().as_bytes())
	}
}

impl fmt::Display for TypedSchema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypedSchema::Nonced => f.write_str("nonced"),
			TypedSchema::Legacy => f.write_str("legacy"),
		}
	}
}

impl FromStr for TypedSchema {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"nonced" => Ok(TypedSchema::Nonced),
			"legacy" => Ok(TypedSchema::Legacy),
			other => Err(format!("Unknown typed schema '{}'", other)),
		}
	}
}

/// A domain with every field required for hashing present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
	pub name: String,
	pub version: String,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl ResolvedDomain {
	/// Checks that the domain carries a chain id and verifying contract.
	pub fn resolve(domain: Option<&ClaimDomain>) -> Result<Self, ClaimError> {
		let domain =
			domain.ok_or_else(|| ClaimError::InvalidDomain("signing domain is missing".into()))?;
		let chain_id = domain
			.chain_id
			.ok_or_else(|| ClaimError::InvalidDomain("chainId is required".into()))?;
		if chain_id == 0 {
			return Err(ClaimError::InvalidDomain("chainId cannot be zero".into()));
		}
		let verifying_contract = domain
			.verifying_contract
			.ok_or_else(|| ClaimError::InvalidDomain("verifyingContract is required".into()))?;
		if verifying_contract.is_zero() {
			return Err(ClaimError::InvalidDomain(
				"verifyingContract cannot be the zero address".into(),
			));
		}
		if domain.version.is_empty() {
			return Err(ClaimError::InvalidDomain("version cannot be empty".into()));
		}
		Ok(Self {
			name: domain.name.clone(),
			version: domain.version.clone(),
			chain_id,
			verifying_contract,
		})
	}

	pub fn separator(&self) -> B256 {
		compute_domain_hash(
			&self.name,
			&self.version,
			self.chain_id,
			&self.verifying_contract,
		)
	}
}

/// Hash of the `Recipient` struct for `request` under `schema`.
///
/// A nonce is mandatory for [`TypedSchema::Nonced`] and forbidden for
/// [`TypedSchema::Legacy`], so a nonce is never silently dropped.
pub fn typed_struct_hash(request: &ClaimRequest, schema: TypedSchema) -> Result<B256, ClaimError> {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&schema.type_hash());
	match (schema, request.nonce) {
		(TypedSchema::Nonced, Some(nonce)) => enc.push_u256(nonce),
		(TypedSchema::Nonced, None) => {
			return Err(ClaimError::InvalidNonce(
				"nonce is required by the nonced Recipient schema".into(),
			))
		},
		(TypedSchema::Legacy, Some(_)) => {
			return Err(ClaimError::InvalidNonce(
				"the legacy Recipient schema has no nonce field".into(),
			))
		},
		(TypedSchema::Legacy, None) => {},
	}
	enc.push_address(&request.recipient);
	enc.push_u256(request.amount);
	Ok(keccak256(enc.finish()))
}

/// Final EIP-712 digest signed for a typed claim.
pub fn typed_claim_digest(request: &ClaimRequest, schema: TypedSchema) -> Result<B256, ClaimError> {
	let domain = ResolvedDomain::resolve(request.domain.as_ref())?;
	let struct_hash = typed_struct_hash(request, schema)?;
	Ok(compute_final_digest(&domain.separator(), &struct_hash))
}

/// `eth_signTypedData_v4` payload for `request`, for signing with an
/// external wallet.
pub fn typed_data_payload(
	request: &ClaimRequest,
	schema: TypedSchema,
) -> Result<serde_json::Value, ClaimError> {
	let domain = ResolvedDomain::resolve(request.domain.as_ref())?;
	// Validates the nonce against the schema.
	typed_struct_hash(request, schema)?;

	let mut recipient_fields = Vec::with_capacity(3);
	let mut message = serde_json::Map::new();
	if let (TypedSchema::Nonced, Some(nonce)) = (schema, request.nonce) {
		recipient_fields.push(json!({ "name": "nonce", "type": "uint256" }));
		message.insert("nonce".into(), json!(nonce.to_string()));
	}
	recipient_fields.push(json!({ "name": "wallet", "type": "address" }));
	recipient_fields.push(json!({ "name": "amount", "type": "uint256" }));
	message.insert("wallet".into(), json!(request.recipient.to_checksum(None)));
	message.insert("amount".into(), json!(request.amount.to_string()));

	Ok(json!({
		"types": {
			"EIP712Domain": [
				{ "name": "name", "type": "string" },
				{ "name": "version", "type": "string" },
				{ "name": "chainId", "type": "uint256" },
				{ "name": "verifyingContract", "type": "address" },
			],
			RECIPIENT_PRIMARY_TYPE: recipient_fields,
		},
		"primaryType": RECIPIENT_PRIMARY_TYPE,
		"domain": {
			"name": domain.name,
			"version": domain.version,
			"chainId": domain.chain_id,
			"verifyingContract": domain.verifying_contract.to_checksum(None),
		},
		"message": message,
	}))
}
