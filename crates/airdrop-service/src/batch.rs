//! `airdrop batch`: signs every recipient of a `[distribution]` section.

use crate::error::ServiceError;
use airdrop_claim::{ClaimScheme, ClaimSigner, NonceTracker, TypedSchema};
use airdrop_config::{DistributionConfig, DomainConfig};
use airdrop_types::{format_token_amount, ClaimRequest, SplitSignature, U256};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;

/// One issued claim, keyed by checksummed wallet in the batch output.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
	/// Base units.
	pub amount: String,
	/// Whole-token amount, for review.
	pub tokens: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
	/// Packed 65-byte form.
	pub signature: String,
	#[serde(flatten)]
	pub split: SplitSignature,
}

/// Signs the whole distribution.
///
/// Nonces are assigned one wallet at a time, then all signatures are produced
/// concurrently.
pub async fn sign_distribution(
	signer: &ClaimSigner,
	distribution: &DistributionConfig,
	domain: &DomainConfig,
) -> Result<BTreeMap<String, BatchEntry>, ServiceError> {
	let scheme: ClaimScheme = distribution
		.scheme
		.parse()
		.map_err(ServiceError::InvalidArgument)?;
	let token = distribution.token_address()?;
	let claim_domain = domain.to_claim_domain()?;
	let nonces = NonceTracker::new(U256::from(distribution.start_nonce));

	let mut requests = Vec::with_capacity(distribution.recipients.len());
	for recipient in &distribution.recipients {
		let wallet = recipient.wallet_address()?;
		let amount = recipient.scaled_amount(distribution.decimals)?;
		let mut request = ClaimRequest::new(token, wallet, amount);

		if let ClaimScheme::Typed(schema) = scheme {
			request = request.with_domain(claim_domain.clone());
			if schema == TypedSchema::Nonced {
				if let Some(nonce) = recipient.nonce {
					nonces.reset(&wallet, U256::from(nonce)).await;
				}
				request.nonce = Some(nonces.issue(&wallet).await?);
			}
		}
		requests.push(request);
	}

	tracing::info!(
		recipients = requests.len(),
		scheme = %scheme,
		"Signing distribution"
	);

	let signatures =
		try_join_all(requests.iter().map(|request| signer.sign(request, scheme))).await?;

	let entries = requests
		.iter()
		.zip(signatures)
		.map(|(request, signature)| -> Result<_, ServiceError> {
			let entry = BatchEntry {
				amount: request.amount.to_string(),
				tokens: format_token_amount(request.amount, distribution.decimals)?,
				nonce: request.nonce.map(|n| n.to_string()),
				signature: signature.to_hex(),
				split: signature.split(),
			};
			Ok((request.recipient.to_checksum(None), entry))
		})
		.collect::<Result<BTreeMap<_, _>, ServiceError>>()?;

	tracing::info!(issued = entries.len(), "Distribution signed");
	Ok(entries)
}
