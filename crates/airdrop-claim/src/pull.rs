//! Plain-hash claim scheme.
//!
//! The verifying contract recomputes
//! `keccak256(abi.encodePacked(token, recipient, amount))`, wraps it in the
//! personal-message envelope and recovers the signer. Every exact
//! `(token, recipient, amount)` triple can be claimed once; the contract
//! remembers consumed digests, the signer keeps no state.

use airdrop_types::ClaimRequest;
use alloy_primitives::{eip191_hash_message, keccak256, B256};

/// Length of the packed pull claim encoding: two addresses and one word.
pub const PULL_CLAIM_ENCODED_LENGTH: usize = 20 + 20 + 32;

/// Packs `token (20) || recipient (20) || amount (32, big-endian)`.
pub fn encode_pull_claim(request: &ClaimRequest) -> Vec<u8> {
	let mut out = Vec::with_capacity(PULL_CLAIM_ENCODED_LENGTH);
	out.extend_from_slice(request.token.as_slice());
	out.extend_from_slice(request.recipient.as_slice());
	out.extend_from_slice(&request.amount.to_be_bytes::<32>());
	out
}

/// Digest bound by a pull claim signature, before the envelope is applied.
pub fn pull_claim_digest(request: &ClaimRequest) -> B256 {
	keccak256(encode_pull_claim(request))
}

/// Wraps a digest in the personal-message envelope,
/// `"\x19Ethereum Signed Message:\n32" || digest`.
pub fn personal_message_hash(digest: &B256) -> B256 {
	eip191_hash_message(digest)
}
