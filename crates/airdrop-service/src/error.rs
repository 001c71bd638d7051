use airdrop_account::AccountError;
use airdrop_claim::ClaimError;
use airdrop_config::ConfigError;
use airdrop_types::AmountError;
use thiserror::Error;

/// Errors surfaced by the `airdrop` commands.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Claim(#[from] ClaimError),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}

impl From<AccountError> for ServiceError {
	fn from(err: AccountError) -> Self {
		ServiceError::Claim(err.into())
	}
}

impl From<AmountError> for ServiceError {
	fn from(err: AmountError) -> Self {
		ServiceError::Claim(err.into())
	}
}
