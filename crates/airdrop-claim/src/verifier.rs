//! In-process models of the distribution contracts' acceptance rules.
//!
//! Neither model moves tokens. They recompute the digest the contract would,
//! recover the signer and apply the same replay bookkeeping, which is enough
//! to check that issued signatures will be accepted exactly once.

use crate::typed::{typed_claim_digest, TypedSchema};
use crate::{personal_message_hash, pull_claim_digest, recover_signer, ClaimError};
use airdrop_types::{ClaimDomain, ClaimRequest, ClaimSignature, U256};
use alloy_primitives::{Address, B256};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Rejections raised by the verifier models.
#[derive(Debug, Error)]
pub enum VerifierError {
	/// Recovered signer differs from the authority, the signature is
	/// malformed, or the digest was already consumed.
	#[error("Invalid signature")]
	InvalidSignature,
	/// The claim's nonce is not the one expected for the wallet.
	#[error("Nonce Mismatch: expected {expected}, got {provided}")]
	NonceMismatch { expected: U256, provided: U256 },
	/// The authority address is zero.
	#[error("Invalid Signer Address")]
	InvalidSigner,
	/// The token address is zero.
	#[error("Invalid Token")]
	InvalidToken,
	/// A privileged setter was called by someone other than the owner.
	#[error("Caller is not the owner")]
	NotOwner,
	/// The verifier's own domain could not be hashed.
	#[error(transparent)]
	Claim(#[from] ClaimError),
}

/// Emitted on every accepted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claimed {
	pub token: Address,
	pub recipient: Address,
	pub amount: U256,
}

/// Plain-hash verifier: one fixed authority, each digest claimable once.
pub struct PullClaimVerifier {
	authority: Address,
	consumed: HashSet<B256>,
}

impl PullClaimVerifier {
	pub fn new(authority: Address) -> Result<Self, VerifierError> {
		if authority == Address::ZERO {
			return Err(VerifierError::InvalidSigner);
		}
		Ok(Self {
			authority,
			consumed: HashSet::new(),
		})
	}

	pub fn authority(&self) -> Address {
		self.authority
	}

	/// Whether the exact `(token, recipient, amount)` triple was claimed.
	pub fn is_consumed(&self, token: Address, recipient: Address, amount: U256) -> bool {
		self.consumed
			.contains(&pull_claim_digest(&ClaimRequest::new(token, recipient, amount)))
	}

	pub fn claim(
		&mut self,
		token: Address,
		recipient: Address,
		amount: U256,
		signature: &ClaimSignature,
	) -> Result<Claimed, VerifierError> {
		let digest = pull_claim_digest(&ClaimRequest::new(token, recipient, amount));
		if self.consumed.contains(&digest) {
			return Err(VerifierError::InvalidSignature);
		}

		let recovered = recover_signer(&personal_message_hash(&digest), signature)
			.map_err(|_| VerifierError::InvalidSignature)?;
		if recovered != self.authority {
			tracing::debug!(%recovered, authority = %self.authority, "Pull claim signer mismatch");
			return Err(VerifierError::InvalidSignature);
		}

		self.consumed.insert(digest);
		Ok(Claimed {
			token,
			recipient,
			amount,
		})
	}
}

/// Typed-data verifier with per-wallet nonces and a rotatable authority.
///
/// Anyone may submit a claim on behalf of a wallet; the funds always go to
/// the wallet named in the signed struct.
pub struct NoncedClaimVerifier {
	owner: Address,
	token: Address,
	signer: Address,
	domain: ClaimDomain,
	nonces: HashMap<Address, U256>,
}

impl NoncedClaimVerifier {
	/// Deploys a verifier at `verifying_contract` on `chain_id`.
	pub fn new(
		owner: Address,
		token: Address,
		signer: Address,
		chain_id: u64,
		verifying_contract: Address,
	) -> Result<Self, VerifierError> {
		if token == Address::ZERO {
			return Err(VerifierError::InvalidToken);
		}
		if signer == Address::ZERO {
			return Err(VerifierError::InvalidSigner);
		}
		Ok(Self {
			owner,
			token,
			signer,
			domain: ClaimDomain::default()
				.with_chain_id(chain_id)
				.with_verifying_contract(verifying_contract),
			nonces: HashMap::new(),
		})
	}

	pub fn signer(&self) -> Address {
		self.signer
	}

	pub fn domain(&self) -> &ClaimDomain {
		&self.domain
	}

	/// Nonce the next claim for `wallet` must carry.
	pub fn expected_nonce(&self, wallet: &Address) -> U256 {
		self.nonces.get(wallet).copied().unwrap_or(U256::ZERO)
	}

	/// Replaces the authority. Outstanding signatures from the old key stop
	/// verifying immediately.
	pub fn set_signer(&mut self, caller: Address, signer: Address) -> Result<(), VerifierError> {
		if caller != self.owner {
			return Err(VerifierError::NotOwner);
		}
		if signer == Address::ZERO {
			return Err(VerifierError::InvalidSigner);
		}
		tracing::info!(old = %self.signer, new = %signer, "Rotated claim signer");
		self.signer = signer;
		Ok(())
	}

	pub fn claim(
		&mut self,
		nonce: U256,
		wallet: Address,
		amount: U256,
		signature: &ClaimSignature,
	) -> Result<Claimed, VerifierError> {
		let expected = self.expected_nonce(&wallet);
		if nonce != expected {
			return Err(VerifierError::NonceMismatch {
				expected,
				provided: nonce,
			});
		}

		let request = ClaimRequest::new(self.token, wallet, amount)
			.with_nonce(nonce)
			.with_domain(self.domain.clone());
		let digest = typed_claim_digest(&request, TypedSchema::Nonced)?;
		let recovered =
			recover_signer(&digest, signature).map_err(|_| VerifierError::InvalidSignature)?;
		if recovered != self.signer {
			return Err(VerifierError::InvalidSignature);
		}

		self.nonces.insert(wallet, expected + U256::from(1));
		Ok(Claimed {
			token: self.token,
			recipient: wallet,
			amount,
		})
	}
}
