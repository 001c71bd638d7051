//! Key provider abstraction for the claim signer.
//!
//! The signer never owns key material directly. It talks to an
//! [`AccountInterface`], a capability that can report its address and produce
//! recoverable secp256k1 signatures either over a personal message (EIP-191
//! envelope applied by the provider) or over a raw 32-byte digest.

use airdrop_types::{Address, ClaimSignature, ImplementationRegistry, B256};
use async_trait::async_trait;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Signing failed inside the provider.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The key is missing or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The provider could not be built or reached.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface every key provider implements.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address derived from the provider's public key.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs `message` under the personal-message convention.
	///
	/// The provider hashes `"\x19Ethereum Signed Message:\n" || len || message`
	/// and signs the result.
	async fn sign_message(&self, message: &[u8]) -> Result<ClaimSignature, AccountError>;

	/// Signs a 32-byte digest directly, without any envelope.
	async fn sign_hash(&self, hash: &B256) -> Result<ClaimSignature, AccountError>;
}

/// Factory signature all account implementations provide.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Returns every registered account implementation as `(name, factory)`.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Looks up and builds the named implementation from its TOML table.
pub fn create_account(
	name: &str,
	config: &toml::Value,
) -> Result<Box<dyn AccountInterface>, AccountError> {
	let factory = get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			AccountError::Implementation(format!("Unknown account implementation '{}'", name))
		})?;
	factory(config)
}

/// Service wrapping the active key provider.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs under the personal-message convention.
	pub async fn sign_message(&self, message: &[u8]) -> Result<ClaimSignature, AccountError> {
		self.implementation.sign_message(message).await
	}

	/// Signs a raw digest.
	pub async fn sign_hash(&self, hash: &B256) -> Result<ClaimSignature, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}
