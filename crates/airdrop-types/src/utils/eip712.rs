//! EIP-712 encoding helpers.
//!
//! These helpers provide:
//! - Domain separator computation for `EIP712Domain(name, version, chainId, verifyingContract)`
//! - Final digest computation (0x1901 || domainHash || structHash)
//! - A minimal ABI encoder for the static field types used in claim structs

use alloy_primitives::{keccak256, Address, B256, U256};

pub const DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
pub const RECIPIENT_PRIMARY_TYPE: &str = "Recipient";
/// Claim struct tracked by a per-wallet nonce.
pub const RECIPIENT_TYPE: &str = "Recipient(uint256 nonce,address wallet,uint256 amount)";
/// Claim struct of the first typed-data contract, which had no nonce.
pub const LEGACY_RECIPIENT_TYPE: &str = "Recipient(address wallet,uint256 amount)";

/// Compute the EIP-712 domain separator.
pub fn compute_domain_hash(
	name: &str,
	version: &str,
	chain_id: u64,
	verifying_contract: &Address,
) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&keccak256(DOMAIN_TYPE.as_bytes()));
	enc.push_string(name);
	enc.push_string(version);
	enc.push_u256(U256::from(chain_id));
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for static types used in EIP-712 struct hashing.
///
/// Every value occupies one 32-byte word; dynamic `string` values are
/// replaced by their keccak256 hash as the standard requires.
#[derive(Debug, Default)]
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self {
			buf: Vec::with_capacity(32 * 5),
		}
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn push_string(&mut self, s: &str) {
		self.push_b256(&keccak256(s.as_bytes()));
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
