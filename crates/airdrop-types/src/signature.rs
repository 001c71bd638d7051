//! Recoverable secp256k1 signatures.
//!
//! [`ClaimSignature`] is the one canonical in-memory form. The packed 65-byte
//! `r || s || v` blob and the split `{r, s, v}` triple are both pure
//! encodings of it, so converting between them never loses information.

use crate::utils::without_0x_prefix;
use alloy_primitives::{hex, PrimitiveSignature, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a packed signature in bytes.
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors raised while decoding a signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
	/// Packed signature had the wrong number of bytes.
	#[error("Invalid signature length: expected 65 bytes, got {0}")]
	InvalidLength(usize),
	/// The recovery byte was neither 0/1 nor 27/28.
	#[error("Invalid recovery id: {0}")]
	InvalidRecoveryId(u8),
	/// A component was not valid hex.
	#[error("Invalid hex: {0}")]
	InvalidHex(String),
}

/// How the recovery byte `v` is written on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VConvention {
	/// `v` in {27, 28}, as produced by wallet `signMessage` and `signTypedData`.
	#[default]
	Electrum,
	/// `v` in {0, 1}, the raw y-parity.
	Parity,
}

impl VConvention {
	fn encode(self, y_parity: bool) -> u8 {
		match self {
			VConvention::Electrum => 27 + y_parity as u8,
			VConvention::Parity => y_parity as u8,
		}
	}
}

/// Decodes a recovery byte written in either convention.
fn decode_v(v: u8) -> Result<bool, SignatureError> {
	match v {
		0 | 27 => Ok(false),
		1 | 28 => Ok(true),
		other => Err(SignatureError::InvalidRecoveryId(other)),
	}
}

/// A recoverable ECDSA signature over a 32-byte digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimSignature {
	r: B256,
	s: B256,
	y_parity: bool,
}

impl ClaimSignature {
	/// Creates a signature from its components.
	pub fn new(r: B256, s: B256, y_parity: bool) -> Self {
		Self { r, s, y_parity }
	}

	pub fn r(&self) -> B256 {
		self.r
	}

	pub fn s(&self) -> B256 {
		self.s
	}

	pub fn y_parity(&self) -> bool {
		self.y_parity
	}

	/// Recovery byte under the default (27/28) convention.
	pub fn v(&self) -> u8 {
		VConvention::Electrum.encode(self.y_parity)
	}

	/// Packed `r || s || v` with `v` in {27, 28}.
	pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
		self.to_bytes_with(VConvention::Electrum)
	}

	/// Packed `r || s || v` with the requested recovery byte convention.
	pub fn to_bytes_with(&self, convention: VConvention) -> [u8; SIGNATURE_LENGTH] {
		let mut out = [0u8; SIGNATURE_LENGTH];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = convention.encode(self.y_parity);
		out
	}

	/// Decodes a packed signature. Both recovery byte conventions are accepted.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
		if bytes.len() != SIGNATURE_LENGTH {
			return Err(SignatureError::InvalidLength(bytes.len()));
		}
		Ok(Self {
			r: B256::from_slice(&bytes[..32]),
			s: B256::from_slice(&bytes[32..64]),
			y_parity: decode_v(bytes[64])?,
		})
	}

	/// 0x-prefixed hex of the packed form.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.to_bytes()))
	}

	/// Splits into hex `r`, hex `s` and integer `v` for contracts taking
	/// `(uint8 v, bytes32 r, bytes32 s)`.
	pub fn split(&self) -> SplitSignature {
		SplitSignature {
			r: format!("0x{:x}", self.r),
			s: format!("0x{:x}", self.s),
			v: self.v(),
		}
	}

	/// Rebuilds the canonical form from split components.
	pub fn from_split(split: &SplitSignature) -> Result<Self, SignatureError> {
		Ok(Self {
			r: parse_word(&split.r)?,
			s: parse_word(&split.s)?,
			y_parity: decode_v(split.v)?,
		})
	}
}

fn parse_word(value: &str) -> Result<B256, SignatureError> {
	let bytes =
		hex::decode(without_0x_prefix(value)).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
	if bytes.len() != 32 {
		return Err(SignatureError::InvalidHex(format!(
			"expected 32-byte word, got {} bytes",
			bytes.len()
		)));
	}
	Ok(B256::from_slice(&bytes))
}

impl fmt::Display for ClaimSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl FromStr for ClaimSignature {
	type Err = SignatureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes =
			hex::decode(without_0x_prefix(s)).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
		Self::from_bytes(&bytes)
	}
}

impl From<PrimitiveSignature> for ClaimSignature {
	fn from(sig: PrimitiveSignature) -> Self {
		Self {
			r: B256::from(sig.r().to_be_bytes::<32>()),
			s: B256::from(sig.s().to_be_bytes::<32>()),
			y_parity: sig.v(),
		}
	}
}

impl From<&ClaimSignature> for PrimitiveSignature {
	fn from(sig: &ClaimSignature) -> Self {
		PrimitiveSignature::new(
			U256::from_be_bytes(sig.r.0),
			U256::from_be_bytes(sig.s.0),
			sig.y_parity,
		)
	}
}

/// Signature split into the components a verifier takes as separate arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSignature {
	/// 0x-prefixed 32-byte hex.
	pub r: String,
	/// 0x-prefixed 32-byte hex.
	pub s: String,
	/// Recovery byte, 27 or 28.
	pub v: u8,
}
