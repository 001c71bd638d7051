//! Local private-key account.
//!
//! Holds a secp256k1 key in process memory and signs with alloy's
//! `PrivateKeySigner`. Signatures are deterministic (RFC 6979) and low-s
//! normalized, matching what ethers-style wallets produce for the same input.

use crate::{AccountError, AccountInterface};
use airdrop_types::{without_0x_prefix, Address, ClaimSignature, Field, Schema, SecretString, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

/// Account backed by a private key held in memory.
#[derive(Clone)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Parses a hex private key, with or without `0x`.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		if private_key.is_empty() {
			return Err(AccountError::InvalidKey("private key is missing".to_string()));
		}
		let signer = private_key.with_exposed(|key| {
			let hex = without_0x_prefix(key.trim());
			if hex.len() != 64 {
				return Err(AccountError::InvalidKey(format!(
					"expected 64 hex characters, got {}",
					hex.len()
				)));
			}
			hex.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("not a valid secp256k1 scalar".to_string()))
		})?;
		tracing::debug!(address = %signer.address(), "Loaded local signing key");
		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_message(&self, message: &[u8]) -> Result<ClaimSignature, AccountError> {
		self.signer
			.sign_message_sync(message)
			.map(ClaimSignature::from)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}

	async fn sign_hash(&self, hash: &B256) -> Result<ClaimSignature, AccountError> {
		self.signer
			.sign_hash_sync(hash)
			.map(ClaimSignature::from)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

/// Shape of `[account.implementations.local]`.
pub fn config_schema() -> Schema {
	Schema::new(vec![Field::new("private_key").with_validator(|key| {
		let hex = without_0x_prefix(key.trim());
		if hex.len() != 64 {
			return Err("Private key must be 64 hex characters".to_string());
		}
		if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err("Private key must be hex encoded".to_string());
		}
		Ok(())
	})])
}

/// Builds a [`LocalWallet`] from `{ private_key = "0x..." }`.
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	config_schema()
		.validate(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;

	Ok(Box::new(LocalWallet::new(&private_key)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl airdrop_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::PrimitiveSignature;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	fn wallet() -> LocalWallet {
		LocalWallet::new(&SecretString::from(DEV_KEY)).unwrap()
	}

	#[tokio::test]
	async fn test_address_from_key() {
		let address = wallet().address().await.unwrap();
		assert_eq!(address, DEV_ADDRESS.parse::<Address>().unwrap());
	}

	#[tokio::test]
	async fn test_key_without_prefix() {
		let wallet = LocalWallet::new(&SecretString::from(&DEV_KEY[2..])).unwrap();
		let address = wallet.address().await.unwrap();
		assert_eq!(address, DEV_ADDRESS.parse::<Address>().unwrap());
	}

	#[test]
	fn test_invalid_keys() {
		for key in ["", "0x1234", "0xzz0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"] {
			let result = LocalWallet::new(&SecretString::from(key));
			assert!(matches!(result, Err(AccountError::InvalidKey(_))), "{key}");
		}

		// Zero is not a valid secp256k1 scalar.
		let zero = format!("0x{}", "00".repeat(32));
		assert!(matches!(
			LocalWallet::new(&SecretString::from(zero.as_str())),
			Err(AccountError::InvalidKey(_))
		));
	}

	#[tokio::test]
	async fn test_sign_hash_recovers_to_address() {
		let wallet = wallet();
		let hash = B256::repeat_byte(0x42);
		let sig = wallet.sign_hash(&hash).await.unwrap();

		let primitive = alloy_primitives_signature(&sig);
		let recovered = primitive.recover_address_from_prehash(&hash).unwrap();
		assert_eq!(recovered, wallet.address().await.unwrap());
	}

	#[tokio::test]
	async fn test_sign_message_uses_personal_envelope() {
		let wallet = wallet();
		let message = b"claim";
		let sig = wallet.sign_message(message).await.unwrap();

		let primitive = alloy_primitives_signature(&sig);
		let recovered = primitive.recover_address_from_msg(message).unwrap();
		assert_eq!(recovered, wallet.address().await.unwrap());

		// Not a raw-digest signature over the same bytes.
		let raw = wallet.sign_hash(&B256::right_padding_from(message)).await.unwrap();
		assert_ne!(raw, sig);
	}

	#[test]
	fn test_factory_validates_config() {
		let missing = toml::Value::Table(toml::Table::new());
		assert!(matches!(
			create_account(&missing),
			Err(AccountError::InvalidKey(_))
		));

		for bad in ["private_key = 5", "private_key = \"0x1234\""] {
			let config: toml::Value = toml::from_str(bad).unwrap();
			let err = create_account(&config).err().unwrap();
			assert!(matches!(err, AccountError::InvalidKey(_)), "{bad}");
			assert!(err.to_string().contains("private_key"), "{bad}");
		}

		let config: toml::Value = toml::from_str(&format!("private_key = \"{}\"", DEV_KEY)).unwrap();
		assert!(create_account(&config).is_ok());
	}

	fn alloy_primitives_signature(sig: &ClaimSignature) -> PrimitiveSignature {
		sig.into()
	}
}
