//! Single-claim subcommands.
//!
//! Each handler returns the JSON document printed on stdout, so the binary
//! can be scripted against.

use crate::error::ServiceError;
use airdrop_claim::{
	pull_claim_digest, recover_claim_signer, typed_data_payload, ClaimScheme, ClaimSigner,
	TypedSchema,
};
use airdrop_types::{
	parse_address, parse_amount, scale_token_amount, Address, ClaimDomain, ClaimRequest,
	ClaimSignature, VConvention, U256, DEFAULT_DOMAIN_NAME, DEFAULT_DOMAIN_VERSION,
};
use clap::Args;
use serde_json::{json, Value};

/// `airdrop pull`
#[derive(Args, Debug, Clone)]
pub struct PullArgs {
	/// Token contract address
	#[arg(long)]
	pub token: String,

	/// Wallet allowed to claim
	#[arg(long)]
	pub recipient: String,

	/// Amount in base units, or in whole tokens when --decimals is given
	#[arg(long)]
	pub amount: String,

	/// Scale --amount by 10^decimals
	#[arg(long)]
	pub decimals: Option<u8>,

	/// Emit v as 0/1 instead of 27/28
	#[arg(long)]
	pub parity_v: bool,
}

/// `airdrop typed`
#[derive(Args, Debug, Clone)]
pub struct TypedArgs {
	/// Distribution contract (EIP-712 verifyingContract)
	#[arg(long)]
	pub contract: String,

	/// Wallet's expected nonce; omit together with --legacy
	#[arg(long)]
	pub nonce: Option<String>,

	/// Wallet allowed to claim
	#[arg(long)]
	pub recipient: String,

	/// Amount in base units, or in whole tokens when --decimals is given
	#[arg(long)]
	pub amount: String,

	/// Scale --amount by 10^decimals
	#[arg(long)]
	pub decimals: Option<u8>,

	/// EIP-712 domain name
	#[arg(long, default_value = DEFAULT_DOMAIN_NAME)]
	pub domain: String,

	/// EIP-712 domain version
	#[arg(long, default_value = DEFAULT_DOMAIN_VERSION)]
	pub domain_version: String,

	/// Chain the contract is deployed on
	#[arg(long, default_value_t = 1)]
	pub chain_id: u64,

	/// Sign the nonce-less Recipient(address wallet,uint256 amount) layout
	#[arg(long)]
	pub legacy: bool,

	/// Also print the eth_signTypedData_v4 payload
	#[arg(long)]
	pub typed_data: bool,
}

/// `airdrop recover`
#[derive(Args, Debug, Clone)]
pub struct RecoverArgs {
	/// pull, typed or typed-legacy
	#[arg(long, default_value = "pull")]
	pub scheme: ClaimScheme,

	/// Token contract address (plain scheme only)
	#[arg(long)]
	pub token: Option<String>,

	#[arg(long)]
	pub recipient: String,

	/// Amount in base units
	#[arg(long)]
	pub amount: String,

	#[arg(long)]
	pub nonce: Option<String>,

	/// Distribution contract (typed schemes only)
	#[arg(long)]
	pub contract: Option<String>,

	#[arg(long, default_value = DEFAULT_DOMAIN_NAME)]
	pub domain: String,

	#[arg(long, default_value = DEFAULT_DOMAIN_VERSION)]
	pub domain_version: String,

	#[arg(long, default_value_t = 1)]
	pub chain_id: u64,

	/// Packed 65-byte signature, hex
	#[arg(long)]
	pub signature: String,

	/// Authority the signature should recover to
	#[arg(long)]
	pub expected: Option<String>,
}

pub(crate) fn address_arg(name: &str, value: &str) -> Result<Address, ServiceError> {
	parse_address(value).map_err(|e| ServiceError::InvalidArgument(format!("--{}: {}", name, e)))
}

fn amount_arg(value: &str, decimals: Option<u8>) -> Result<U256, ServiceError> {
	Ok(match decimals {
		Some(decimals) => scale_token_amount(value, decimals)?,
		None => parse_amount(value)?,
	})
}

fn nonce_arg(value: Option<&str>) -> Result<Option<U256>, ServiceError> {
	value
		.map(|nonce| {
			parse_amount(nonce)
				.map_err(|e| ServiceError::InvalidArgument(format!("--nonce: {}", e)))
		})
		.transpose()
}

/// Signs a plain-hash claim and prints the packed signature.
pub async fn pull(signer: &ClaimSigner, args: &PullArgs) -> Result<Value, ServiceError> {
	let request = ClaimRequest::new(
		address_arg("token", &args.token)?,
		address_arg("recipient", &args.recipient)?,
		amount_arg(&args.amount, args.decimals)?,
	);

	let signature = signer.sign_pull_claim(&request).await?;
	let convention = if args.parity_v {
		VConvention::Parity
	} else {
		VConvention::Electrum
	};

	Ok(json!({
		"signer": signer.address().await?.to_checksum(None),
		"token": request.token.to_checksum(None),
		"recipient": request.recipient.to_checksum(None),
		"amount": request.amount.to_string(),
		"digest": pull_claim_digest(&request).to_string(),
		"signature": format!("0x{}", hex::encode(signature.to_bytes_with(convention))),
	}))
}

/// Signs a typed-data claim and prints `{r, s, v}`.
pub async fn typed(signer: &ClaimSigner, args: &TypedArgs) -> Result<Value, ServiceError> {
	let domain = ClaimDomain::new(args.domain.clone())
		.with_version(args.domain_version.clone())
		.with_chain_id(args.chain_id)
		.with_verifying_contract(address_arg("contract", &args.contract)?);

	let mut request = ClaimRequest::new(
		Address::ZERO,
		address_arg("recipient", &args.recipient)?,
		amount_arg(&args.amount, args.decimals)?,
	)
	.with_domain(domain);
	request.nonce = nonce_arg(args.nonce.as_deref())?;

	let schema = if args.legacy {
		TypedSchema::Legacy
	} else {
		TypedSchema::Nonced
	};
	let signature = signer.sign_typed_claim(&request, schema).await?;
	let split = signature.split();

	let mut output = json!({
		"r": split.r,
		"s": split.s,
		"v": split.v,
		"signature": signature.to_hex(),
	});
	if args.typed_data {
		output["typedData"] = typed_data_payload(&request, schema)?;
	}
	Ok(output)
}

/// Recovers the signer of a packed signature, optionally checking it.
pub fn recover(args: &RecoverArgs) -> Result<Value, ServiceError> {
	let token = match (&args.token, args.scheme) {
		(Some(token), _) => address_arg("token", token)?,
		(None, ClaimScheme::Pull) => {
			return Err(ServiceError::InvalidArgument(
				"--token is required for the pull scheme".to_string(),
			))
		},
		// Typed digests do not cover the token.
		(None, ClaimScheme::Typed(_)) => Address::ZERO,
	};
	let mut request = ClaimRequest::new(
		token,
		address_arg("recipient", &args.recipient)?,
		parse_amount(&args.amount)?,
	);
	request.nonce = nonce_arg(args.nonce.as_deref())?;

	if let Some(contract) = &args.contract {
		request = request.with_domain(
			ClaimDomain::new(args.domain.clone())
				.with_version(args.domain_version.clone())
				.with_chain_id(args.chain_id)
				.with_verifying_contract(address_arg("contract", contract)?),
		);
	}

	let signature: ClaimSignature = args
		.signature
		.parse()
		.map_err(|e| ServiceError::InvalidArgument(format!("--signature: {}", e)))?;
	let signer = recover_claim_signer(&request, args.scheme, &signature)?;

	let mut output = json!({
		"scheme": args.scheme.to_string(),
		"signer": signer.to_checksum(None),
	});
	if let Some(expected) = &args.expected {
		let expected = address_arg("expected", expected)?;
		let valid = expected == signer;
		if !valid {
			tracing::warn!(%expected, recovered = %signer, "Signature does not match the expected authority");
		}
		output["valid"] = json!(valid);
	}
	Ok(output)
}
