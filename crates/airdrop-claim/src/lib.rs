//! Claim authorization signer.
//!
//! Produces the signatures that gate "pull" claims on the distribution
//! contracts. Given a claim tuple and a key provider it derives the digest the
//! verifying contract will recompute, signs it, and hands back a
//! [`ClaimSignature`] that encodes to either the packed 65-byte form or the
//! split `{r, s, v}` triple.
//!
//! Signing is a pure function of `(key, request, scheme)`: nothing is
//! persisted and no network I/O happens here. Replay protection is enforced by
//! the verifier, see [`verifier`] for models of its acceptance rules.

use airdrop_account::{AccountError, AccountService};
use airdrop_types::{
	truncate_id, AmountError, ClaimRequest, ClaimSignature, SignatureError,
};
use alloy_primitives::{Address, PrimitiveSignature, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub mod nonce;
pub mod pull;
pub mod typed;
pub mod verifier;

pub use nonce::NonceTracker;
pub use pull::{encode_pull_claim, personal_message_hash, pull_claim_digest};
pub use typed::{typed_claim_digest, typed_data_payload, typed_struct_hash, ResolvedDomain, TypedSchema};

/// Errors surfaced by the claim signer.
///
/// All failures are local and deterministic; retrying with the same input
/// yields the same error.
#[derive(Debug, Error)]
pub enum ClaimError {
	/// The signing key is missing or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The amount is negative, non-canonical or wider than 256 bits.
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	/// The typed-data domain lacks a chain id or verifying contract.
	#[error("Invalid domain: {0}")]
	InvalidDomain(String),
	/// The nonce does not fit the selected typed schema.
	#[error("Invalid nonce: {0}")]
	InvalidNonce(String),
	/// The key provider failed to produce a signature.
	#[error("Signing failure: {0}")]
	SigningFailure(String),
	/// A signature could not be decoded or recovered.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
}

impl From<AccountError> for ClaimError {
	fn from(err: AccountError) -> Self {
		match err {
			AccountError::InvalidKey(msg) => ClaimError::InvalidKey(msg),
			other => ClaimError::SigningFailure(other.to_string()),
		}
	}
}

impl From<AmountError> for ClaimError {
	fn from(err: AmountError) -> Self {
		ClaimError::InvalidAmount(err.to_string())
	}
}

impl From<SignatureError> for ClaimError {
	fn from(err: SignatureError) -> Self {
		ClaimError::InvalidSignature(err.to_string())
	}
}

/// Which signing convention a claim is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimScheme {
	/// Packed-triple hash wrapped in the personal-message envelope.
	Pull,
	/// EIP-712 typed data, signed as a raw digest.
	Typed(TypedSchema),
}

impl ClaimScheme {
	/// The 32-byte value the key actually signs.
	///
	/// For [`ClaimScheme::Pull`] this is the enveloped hash, not the packed
	/// digest the contract stores as consumed.
	pub fn signing_hash(&self, request: &ClaimRequest) -> Result<B256, ClaimError> {
		match self {
			ClaimScheme::Pull => Ok(personal_message_hash(&pull_claim_digest(request))),
			ClaimScheme::Typed(schema) => typed_claim_digest(request, *schema),
		}
	}
}

impl fmt::Display for ClaimScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClaimScheme::Pull => f.write_str("pull"),
			ClaimScheme::Typed(TypedSchema::Nonced) => f.write_str("typed"),
			ClaimScheme::Typed(TypedSchema::Legacy) => f.write_str("typed-legacy"),
		}
	}
}

impl FromStr for ClaimScheme {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pull" => Ok(ClaimScheme::Pull),
			"typed" => Ok(ClaimScheme::Typed(TypedSchema::Nonced)),
			"typed-legacy" => Ok(ClaimScheme::Typed(TypedSchema::Legacy)),
			other => Err(format!(
				"Unknown claim scheme '{}', expected pull, typed or typed-legacy",
				other
			)),
		}
	}
}

/// Recovers the address that produced `signature` over `hash`.
pub fn recover_signer(hash: &B256, signature: &ClaimSignature) -> Result<Address, ClaimError> {
	PrimitiveSignature::from(signature)
		.recover_address_from_prehash(hash)
		.map_err(|e| ClaimError::InvalidSignature(e.to_string()))
}

/// Recovers the signer of a claim issued under `scheme`.
pub fn recover_claim_signer(
	request: &ClaimRequest,
	scheme: ClaimScheme,
	signature: &ClaimSignature,
) -> Result<Address, ClaimError> {
	recover_signer(&scheme.signing_hash(request)?, signature)
}

/// Checks that `signature` authorizes `request` on behalf of `expected`.
///
/// A well-formed signature from a different key is not an error; it simply
/// does not verify.
pub fn verify_claim(
	request: &ClaimRequest,
	scheme: ClaimScheme,
	signature: &ClaimSignature,
	expected: Address,
) -> Result<bool, ClaimError> {
	Ok(recover_claim_signer(request, scheme, signature)? == expected)
}

/// Issues claim signatures with the key held by an [`AccountService`].
///
/// The signer has no notion of which key the verifier currently trusts; after
/// a rotation the caller must build a new signer around the new key.
#[derive(Clone)]
pub struct ClaimSigner {
	account: Arc<AccountService>,
}

impl ClaimSigner {
	pub fn new(account: Arc<AccountService>) -> Self {
		Self { account }
	}

	/// Address of the signing key.
	pub async fn address(&self) -> Result<Address, ClaimError> {
		Ok(self.account.get_address().await?)
	}

	/// Signs a claim under the given scheme.
	pub async fn sign(
		&self,
		request: &ClaimRequest,
		scheme: ClaimScheme,
	) -> Result<ClaimSignature, ClaimError> {
		match scheme {
			ClaimScheme::Pull => self.sign_pull_claim(request).await,
			ClaimScheme::Typed(schema) => self.sign_typed_claim(request, schema).await,
		}
	}

	/// Signs `(token, recipient, amount)` for the consumed-digest contract.
	pub async fn sign_pull_claim(&self, request: &ClaimRequest) -> Result<ClaimSignature, ClaimError> {
		let digest = pull_claim_digest(request);
		tracing::debug!(digest = %digest, "Computed pull claim digest");

		// The provider applies the personal-message envelope.
		let signature = self.account.sign_message(digest.as_slice()).await?;

		tracing::info!(
			recipient = %truncate_id(&request.recipient.to_string()),
			amount = %request.amount,
			"Signed pull claim"
		);
		Ok(signature)
	}

	/// Signs `(nonce?, wallet, amount)` as EIP-712 typed data.
	pub async fn sign_typed_claim(
		&self,
		request: &ClaimRequest,
		schema: TypedSchema,
	) -> Result<ClaimSignature, ClaimError> {
		let digest = typed_claim_digest(request, schema).inspect_err(|e| {
			tracing::warn!(error = %e, "Rejected typed claim request");
		})?;
		tracing::debug!(digest = %digest, schema = %schema, "Computed typed claim digest");

		let signature = self.account.sign_hash(&digest).await?;

		tracing::info!(
			recipient = %truncate_id(&request.recipient.to_string()),
			amount = %request.amount,
			nonce = ?request.nonce,
			"Signed typed claim"
		);
		Ok(signature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use airdrop_account::implementations::local::LocalWallet;
	use airdrop_types::{ClaimDomain, SecretString, U256};
	use alloy_primitives::{address, b256};

	pub(crate) const DEV_KEY: &str =
		"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	pub(crate) const DEV_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	pub(crate) const OTHER_KEY: &str =
		"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
	pub(crate) const OTHER_ADDRESS: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

	const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

	pub(crate) fn signer(key: &str) -> ClaimSigner {
		let wallet = LocalWallet::new(&SecretString::from(key)).unwrap();
		ClaimSigner::new(Arc::new(AccountService::new(Box::new(wallet))))
	}

	fn golden_pull_request() -> ClaimRequest {
		ClaimRequest::new(
			address!("7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"),
			address!("BA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"),
			U256::from(10_000_000_000_000_000_000u128),
		)
	}

	fn typed_request(nonce: u64) -> ClaimRequest {
		ClaimRequest::new(
			Address::ZERO,
			address!("BA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"),
			U256::from(10),
		)
		.with_nonce(U256::from(nonce))
		.with_domain(
			ClaimDomain::default()
				.with_chain_id(31337)
				.with_verifying_contract(CONTRACT),
		)
	}

	#[tokio::test]
	async fn test_golden_pull_signature() {
		let sig = signer(DEV_KEY)
			.sign_pull_claim(&golden_pull_request())
			.await
			.unwrap();

		assert_eq!(
			sig.to_hex(),
			"0x05e6a4964ba467ffa392661b4393b76079ca3c200aed689b7dca1f8999567017\
			 398c1987fa38a86962458147ddab803282ac9a35be574a61bb8fcc5ed5c728471b"
		);
		assert_eq!(
			recover_claim_signer(&golden_pull_request(), ClaimScheme::Pull, &sig).unwrap(),
			DEV_ADDRESS
		);
	}

	#[tokio::test]
	async fn test_pull_signature_is_deterministic() {
		let signer = signer(DEV_KEY);
		let first = signer.sign_pull_claim(&golden_pull_request()).await.unwrap();
		let second = signer.sign_pull_claim(&golden_pull_request()).await.unwrap();
		assert_eq!(first.to_bytes(), second.to_bytes());
	}

	#[tokio::test]
	async fn test_golden_typed_signature() {
		let sig = signer(DEV_KEY)
			.sign_typed_claim(&typed_request(0), TypedSchema::Nonced)
			.await
			.unwrap();
		let split = sig.split();

		assert_eq!(
			split.r,
			"0x04dafbf1e93bbdfe313115fbda4f9345146ce512c79efd21dc1f27fd80a79628"
		);
		assert_eq!(
			split.s,
			"0x79ba6f2d5fee758b0bdd45fbe97d124e04cbccbf3102196eb659367799ea03ca"
		);
		assert_eq!(split.v, 28);
	}

	#[tokio::test]
	async fn test_golden_legacy_signature() {
		let mut request = typed_request(0);
		request.nonce = None;
		let sig = signer(DEV_KEY)
			.sign_typed_claim(&request, TypedSchema::Legacy)
			.await
			.unwrap();

		assert_eq!(
			sig.r(),
			b256!("7ab027567bd7d9bda5960cb1043f9bfc4b553598d31c298fd1170577bcb6861b")
		);
		assert_eq!(
			sig.s(),
			b256!("48efae2799c9d0074d9df40306c859dfac0265d2762f0d9160608bf6dd347021")
		);
		assert_eq!(sig.v(), 28);
	}

	#[tokio::test]
	async fn test_typed_signature_depends_on_domain() {
		let signer = signer(DEV_KEY);
		let base = signer
			.sign_typed_claim(&typed_request(0), TypedSchema::Nonced)
			.await
			.unwrap();

		let other_chain = typed_request(0).with_domain(
			ClaimDomain::default()
				.with_chain_id(1)
				.with_verifying_contract(CONTRACT),
		);
		let other_contract = typed_request(0).with_domain(
			ClaimDomain::default()
				.with_chain_id(31337)
				.with_verifying_contract(Address::repeat_byte(0x42)),
		);

		for request in [other_chain, other_contract] {
			let sig = signer
				.sign_typed_claim(&request, TypedSchema::Nonced)
				.await
				.unwrap();
			assert_ne!(sig, base);
			// Still recoverable under its own domain.
			assert_eq!(
				recover_claim_signer(&request, ClaimScheme::Typed(TypedSchema::Nonced), &sig)
					.unwrap(),
				DEV_ADDRESS
			);
		}
	}

	#[tokio::test]
	async fn test_recoverability_across_schemes() {
		let signer = signer(OTHER_KEY);
		let cases = [
			(golden_pull_request(), ClaimScheme::Pull),
			(typed_request(5), ClaimScheme::Typed(TypedSchema::Nonced)),
			(
				ClaimRequest { nonce: None, ..typed_request(0) },
				ClaimScheme::Typed(TypedSchema::Legacy),
			),
		];

		for (request, scheme) in cases {
			let sig = signer.sign(&request, scheme).await.unwrap();
			assert_eq!(
				recover_claim_signer(&request, scheme, &sig).unwrap(),
				OTHER_ADDRESS,
				"{scheme}"
			);
		}
	}

	#[tokio::test]
	async fn test_key_mismatch_detected() {
		let sig = signer(OTHER_KEY)
			.sign_pull_claim(&golden_pull_request())
			.await
			.unwrap();

		assert!(!verify_claim(&golden_pull_request(), ClaimScheme::Pull, &sig, DEV_ADDRESS).unwrap());
		assert!(verify_claim(&golden_pull_request(), ClaimScheme::Pull, &sig, OTHER_ADDRESS).unwrap());
	}

	#[tokio::test]
	async fn test_pull_signature_does_not_verify_as_typed() {
		let request = typed_request(0);
		let sig = signer(DEV_KEY).sign_pull_claim(&request).await.unwrap();
		assert!(!verify_claim(
			&request,
			ClaimScheme::Typed(TypedSchema::Nonced),
			&sig,
			DEV_ADDRESS
		)
		.unwrap());
	}

	#[tokio::test]
	async fn test_invalid_domain_is_reported_before_signing() {
		let request = ClaimRequest::new(Address::ZERO, DEV_ADDRESS, U256::from(1)).with_nonce(U256::from(0));
		let result = signer(DEV_KEY)
			.sign_typed_claim(&request, TypedSchema::Nonced)
			.await;
		assert!(matches!(result, Err(ClaimError::InvalidDomain(_))));
	}

	#[tokio::test]
	async fn test_concurrent_signing_matches_sequential() {
		let signer = signer(DEV_KEY);
		let requests: Vec<_> = (0..8u64).map(typed_request).collect();

		let concurrent = futures::future::try_join_all(
			requests
				.iter()
				.map(|r| signer.sign_typed_claim(r, TypedSchema::Nonced)),
		)
		.await
		.unwrap();

		for (request, sig) in requests.iter().zip(concurrent) {
			let sequential = signer
				.sign_typed_claim(request, TypedSchema::Nonced)
				.await
				.unwrap();
			assert_eq!(sig, sequential);
		}
	}

	#[test]
	fn test_recover_rejects_invalid_signature() {
		let zero = ClaimSignature::new(B256::ZERO, B256::ZERO, false);
		assert!(matches!(
			recover_signer(&B256::repeat_byte(1), &zero),
			Err(ClaimError::InvalidSignature(_))
		));
	}

	#[test]
	fn test_scheme_parsing() {
		assert_eq!("pull".parse::<ClaimScheme>().unwrap(), ClaimScheme::Pull);
		assert_eq!(
			"typed".parse::<ClaimScheme>().unwrap(),
			ClaimScheme::Typed(TypedSchema::Nonced)
		);
		assert_eq!(
			"typed-legacy".parse::<ClaimScheme>().unwrap(),
			ClaimScheme::Typed(TypedSchema::Legacy)
		);
		assert!("push".parse::<ClaimScheme>().is_err());
		assert!("pull712".parse::<ClaimScheme>().is_err());
		assert!("Typed".parse::<ClaimScheme>().is_err());

		for scheme in [
			ClaimScheme::Pull,
			ClaimScheme::Typed(TypedSchema::Nonced),
			ClaimScheme::Typed(TypedSchema::Legacy),
		] {
			assert_eq!(scheme.to_string().parse::<ClaimScheme>().unwrap(), scheme);
		}
	}

	#[test]
	fn test_account_error_mapping() {
		assert!(matches!(
			ClaimError::from(AccountError::InvalidKey("x".into())),
			ClaimError::InvalidKey(_)
		));
		assert!(matches!(
			ClaimError::from(AccountError::SigningFailed("x".into())),
			ClaimError::SigningFailure(_)
		));
		assert!(matches!(
			ClaimError::from(AmountError::Negative("-1".into())),
			ClaimError::InvalidAmount(_)
		));
	}
}
