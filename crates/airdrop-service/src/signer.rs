//! Wires the configured key provider into a [`ClaimSigner`].

use crate::error::ServiceError;
use airdrop_account::{
	create_account, implementations::local::LocalWallet, AccountInterface, AccountService,
};
use airdrop_claim::{ClaimError, ClaimSigner};
use airdrop_config::Config;
use airdrop_types::SecretString;
use std::sync::Arc;

/// Environment variable consulted when no configuration file is given.
pub const SIGNER_ENV: &str = "SIGNER";

/// Builds the signer from `[account]` when a configuration is loaded,
/// otherwise from the `SIGNER` environment variable.
pub fn build_signer(config: Option<&Config>) -> Result<ClaimSigner, ServiceError> {
	let implementation: Box<dyn AccountInterface> = match config {
		Some(config) => {
			let account = &config.account;
			let table = account.primary_config().ok_or_else(|| {
				ServiceError::InvalidArgument(format!(
					"Account implementation '{}' is not configured",
					account.primary
				))
			})?;
			tracing::debug!(implementation = %account.primary, "Creating account from configuration");
			create_account(&account.primary, table)?
		},
		None => {
			let key = std::env::var(SIGNER_ENV).map(SecretString::from).map_err(|_| {
				ClaimError::InvalidKey(format!(
					"no --config given and {} is not set",
					SIGNER_ENV
				))
			})?;
			tracing::debug!("Creating local account from {}", SIGNER_ENV);
			Box::new(LocalWallet::new(&key)?)
		},
	};

	Ok(ClaimSigner::new(Arc::new(AccountService::new(implementation))))
}
