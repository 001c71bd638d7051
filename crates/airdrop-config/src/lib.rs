//! Configuration for the airdrop signer.
//!
//! Configuration is TOML. `${VAR}` and `${VAR:-default}` references are
//! resolved from the environment before parsing, so secrets such as the
//! signing key can stay out of the file.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["account.toml", "recipients.toml"]` in the entry file
//! - Each of `[account]`, `[domain]` and `[distribution]` is defined in one file only

mod loader;

use airdrop_types::{
	parse_address, scale_token_amount, Address, ClaimDomain, U256, DEFAULT_DOMAIN_NAME,
	DEFAULT_DOMAIN_VERSION,
};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Top-level sections of a configuration.
const SECTIONS: [&str; 3] = ["account", "domain", "distribution"];

/// Scheme names accepted in `[distribution]`.
pub const SCHEME_NAMES: [&str; 3] = ["pull", "typed", "typed-legacy"];

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Display would echo the offending input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Key provider selection.
	pub account: AccountConfig,
	/// Typed-data signing domain.
	#[serde(default)]
	pub domain: DomainConfig,
	/// Recipients for batch issuance.
	pub distribution: Option<DistributionConfig>,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl AccountConfig {
	/// Raw TOML table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Typed-data domain. Every field must match the verifying contract's
/// constructor arguments exactly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	#[serde(default = "default_domain_name")]
	pub name: String,
	#[serde(default = "default_domain_version")]
	pub version: String,
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	/// Distribution contract address. Required for the typed schemes.
	pub verifying_contract: Option<String>,
}

fn default_domain_name() -> String {
	DEFAULT_DOMAIN_NAME.to_string()
}

fn default_domain_version() -> String {
	DEFAULT_DOMAIN_VERSION.to_string()
}

fn default_chain_id() -> u64 {
	1
}

impl Default for DomainConfig {
	fn default() -> Self {
		Self {
			name: default_domain_name(),
			version: default_domain_version(),
			chain_id: default_chain_id(),
			verifying_contract: None,
		}
	}
}

impl DomainConfig {
	/// Converts to the signer's domain, parsing the contract address.
	pub fn to_claim_domain(&self) -> Result<ClaimDomain, ConfigError> {
		let mut domain = ClaimDomain::new(self.name.clone())
			.with_version(self.version.clone())
			.with_chain_id(self.chain_id);
		if let Some(contract) = &self.verifying_contract {
			let address = parse_address(contract).map_err(|e| {
				ConfigError::Validation(format!("Invalid domain verifying_contract: {}", e))
			})?;
			domain = domain.with_verifying_contract(address);
		}
		Ok(domain)
	}
}

/// A batch of claims to sign from one authority.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistributionConfig {
	/// ERC-20 token being distributed.
	pub token: String,
	/// Token decimals used to scale recipient amounts.
	#[serde(default = "default_decimals")]
	pub decimals: u8,
	/// One of `pull`, `typed` or `typed-legacy`.
	#[serde(default = "default_scheme")]
	pub scheme: String,
	/// First nonce issued to each wallet under the `typed` scheme.
	#[serde(default)]
	pub start_nonce: u64,
	pub recipients: Vec<RecipientConfig>,
}

fn default_decimals() -> u8 {
	18
}

fn default_scheme() -> String {
	"pull".to_string()
}

impl DistributionConfig {
	pub fn token_address(&self) -> Result<Address, ConfigError> {
		parse_address(&self.token)
			.map_err(|e| ConfigError::Validation(format!("Invalid distribution token: {}", e)))
	}
}

/// One recipient. `amount` is in whole token units and may carry a
/// fractional part up to `decimals` digits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipientConfig {
	pub wallet: String,
	pub amount: AmountValue,
	/// Overrides `start_nonce` for this wallet under the `typed` scheme.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
}

/// Amounts may be written as TOML integers or as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AmountValue {
	Integer(u64),
	Text(String),
}

impl std::fmt::Display for AmountValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AmountValue::Integer(value) => write!(f, "{}", value),
			AmountValue::Text(value) => f.write_str(value),
		}
	}
}

impl RecipientConfig {
	pub fn wallet_address(&self) -> Result<Address, ConfigError> {
		parse_address(&self.wallet).map_err(|e| {
			ConfigError::Validation(format!("Invalid recipient wallet '{}': {}", self.wallet, e))
		})
	}

	/// Amount in base units, `amount * 10^decimals`.
	pub fn scaled_amount(&self, decimals: u8) -> Result<U256, ConfigError> {
		scale_token_amount(&self.amount.to_string(), decimals).map_err(|e| {
			ConfigError::Validation(format!(
				"Invalid amount for recipient {}: {}",
				self.wallet, e
			))
		})
	}
}

/// Expands `${VAR}` and `${VAR:-default}` from the environment in one pass.
///
/// Substituted values are never expanded again. Inputs over 1 MiB are
/// rejected before the pattern runs.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration is {} bytes, the limit is {} bytes",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let pattern = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Invalid variable pattern: {}", e)))?;

	let mut missing: Option<String> = None;
	let resolved = pattern.replace_all(input, |caps: &Captures<'_>| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		loader::load(Path::new(path)).await
	}

	/// Builds a configuration from a TOML table whose environment references
	/// are already resolved.
	fn from_table(table: toml::Table) -> Result<Self, ConfigError> {
		if let Some(name) = table.keys().find(|name| !SECTIONS.contains(&name.as_str())) {
			return Err(ConfigError::Validation(format!(
				"Unknown section '{}', expected one of {:?}",
				name, SECTIONS
			)));
		}
		let config: Config = toml::Value::Table(table).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Checks cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate account config
		if self.account.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Account primary implementation cannot be empty".into(),
			));
		}
		if self.account.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary account '{}' not found in implementations",
				self.account.primary
			)));
		}

		// Validate domain config
		if self.domain.name.is_empty() {
			return Err(ConfigError::Validation("Domain name cannot be empty".into()));
		}
		if self.domain.version.is_empty() {
			return Err(ConfigError::Validation(
				"Domain version cannot be empty".into(),
			));
		}
		if self.domain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"Domain chain_id must be greater than 0".into(),
			));
		}
		let domain = self.domain.to_claim_domain()?;

		if let Some(distribution) = &self.distribution {
			self.validate_distribution(distribution, &domain)?;
		}

		Ok(())
	}

	fn validate_distribution(
		&self,
		distribution: &DistributionConfig,
		domain: &ClaimDomain,
	) -> Result<(), ConfigError> {
		if !SCHEME_NAMES.contains(&distribution.scheme.as_str()) {
			return Err(ConfigError::Validation(format!(
				"Unknown distribution scheme '{}', expected one of {:?}",
				distribution.scheme, SCHEME_NAMES
			)));
		}
		if distribution.scheme != "pull" && domain.verifying_contract.is_none() {
			return Err(ConfigError::Validation(format!(
				"Scheme '{}' requires domain.verifying_contract",
				distribution.scheme
			)));
		}
		if distribution.decimals > 77 {
			return Err(ConfigError::Validation(
				"Distribution decimals cannot exceed 77".into(),
			));
		}

		distribution.token_address()?;

		if distribution.recipients.is_empty() {
			return Err(ConfigError::Validation(
				"Distribution must list at least one recipient".into(),
			));
		}

		// Output is keyed by wallet, one claim each.
		let mut seen = HashSet::new();
		for recipient in &distribution.recipients {
			let wallet = recipient.wallet_address()?;
			if !seen.insert(wallet) {
				return Err(ConfigError::Validation(format!(
					"Duplicate recipient wallet {}",
					wallet
				)));
			}
			recipient.scaled_amount(distribution.decimals)?;
			if recipient.nonce.is_some() && distribution.scheme != "typed" {
				return Err(ConfigError::Validation(format!(
					"Recipient {} sets a nonce but scheme '{}' has none",
					recipient.wallet, distribution.scheme
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string, resolving environment variables
/// and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		Config::from_table(toml::from_str(&resolved)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ACCOUNT: &str = r#"
[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#;

	fn with_account(rest: &str) -> String {
		format!("{}\n{}", ACCOUNT, rest)
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("AIRDROP_TEST_HOST", "localhost");
		std::env::set_var("AIRDROP_TEST_PORT", "8545");

		let input = "rpc = \"${AIRDROP_TEST_HOST}:${AIRDROP_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "rpc = \"localhost:8545\"");

		std::env::remove_var("AIRDROP_TEST_HOST");
		std::env::remove_var("AIRDROP_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${AIRDROP_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_env_values_are_inserted_verbatim() {
		std::env::set_var("AIRDROP_TEST_NESTED", "${AIRDROP_TEST_UNSET_INNER}");

		let input = "name = \"${AIRDROP_TEST_NESTED}\"";
		let config_str = format!("{}\n[domain]\n{}\n", ACCOUNT, input);
		assert_eq!(
			resolve_env_vars(input).unwrap(),
			"name = \"${AIRDROP_TEST_UNSET_INNER}\""
		);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.domain.name, "${AIRDROP_TEST_UNSET_INNER}");

		std::env::remove_var("AIRDROP_TEST_NESTED");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${AIRDROP_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("AIRDROP_MISSING_VAR"));
	}

	#[test]
	fn test_private_key_from_env() {
		std::env::set_var(
			"AIRDROP_TEST_SIGNER",
			"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
		);

		let config_str = r#"
[account]
primary = "local"
[account.implementations.local]
private_key = "${AIRDROP_TEST_SIGNER}"
"#;
		let config: Config = config_str.parse().unwrap();
		let key = config
			.account
			.primary_config()
			.and_then(|v| v.get("private_key"))
			.and_then(|v| v.as_str())
			.unwrap();
		assert!(key.starts_with("0x59c6"));

		std::env::remove_var("AIRDROP_TEST_SIGNER");
	}

	#[test]
	fn test_domain_defaults() {
		let config: Config = ACCOUNT.parse().unwrap();
		assert_eq!(config.domain.name, "Airdrop Signature");
		assert_eq!(config.domain.version, "1");
		assert_eq!(config.domain.chain_id, 1);
		assert!(config.distribution.is_none());

		let domain = config.domain.to_claim_domain().unwrap();
		assert_eq!(domain.chain_id, Some(1));
		assert_eq!(domain.verifying_contract, None);
	}

	#[test]
	fn test_full_distribution() {
		let config: Config = with_account(
			r#"
[domain]
chain_id = 31337
verifying_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
scheme = "typed"
start_nonce = 3

[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 10

[[distribution.recipients]]
wallet = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
amount = "2.5"
"#,
		)
		.parse()
		.unwrap();

		let distribution = config.distribution.unwrap();
		assert_eq!(distribution.decimals, 18);
		assert_eq!(distribution.start_nonce, 3);
		assert_eq!(distribution.recipients.len(), 2);
		assert_eq!(
			distribution.recipients[0].scaled_amount(18).unwrap(),
			U256::from(10_000_000_000_000_000_000u128)
		);
		assert_eq!(
			distribution.recipients[1].scaled_amount(18).unwrap(),
			U256::from(2_500_000_000_000_000_000u128)
		);
	}

	#[test]
	fn test_primary_account_must_exist() {
		let config_str = r#"
[account]
primary = "kms"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#;
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary account 'kms'"));
	}

	#[test]
	fn test_empty_domain_fields_rejected() {
		for domain in ["name = \"\"", "version = \"\"", "chain_id = 0"] {
			let config_str = with_account(&format!("[domain]\n{}\n", domain));
			assert!(
				matches!(
					config_str.parse::<Config>(),
					Err(ConfigError::Validation(_))
				),
				"{domain}"
			);
		}
	}

	#[test]
	fn test_typed_distribution_requires_contract() {
		let config_str = with_account(
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
scheme = "typed-legacy"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 1
"#,
		);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("verifying_contract"));
	}

	#[test]
	fn test_distribution_rejections() {
		let cases = [
			// unknown scheme
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
scheme = "push"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 1
"#,
			// no recipients
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
recipients = []
"#,
			// duplicate wallet
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 1
[[distribution.recipients]]
wallet = "0xba9fec0023e6aa54d96617cdb3e5507ff20f8b81"
amount = 2
"#,
			// amount too precise for the token
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
decimals = 2
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = "0.001"
"#,
			// malformed token
			r#"
[distribution]
token = "0x1234"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 1
"#,
		];

		for case in cases {
			let result = with_account(case).parse::<Config>();
			assert!(matches!(result, Err(ConfigError::Validation(_))), "{case}");
		}
	}

	#[test]
	fn test_recipient_nonce_override() {
		let config: Config = with_account(
			r#"
[domain]
chain_id = 31337
verifying_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
scheme = "typed"

[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 10
nonce = 4
"#,
		)
		.parse()
		.unwrap();
		let distribution = config.distribution.unwrap();
		assert_eq!(distribution.recipients[0].nonce, Some(4));

		let pull = with_account(
			r#"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 10
nonce = 4
"#,
		);
		let err = pull.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("sets a nonce"));
	}

	#[test]
	fn test_unknown_sections_rejected() {
		let err = with_account("[networks]\nrpc = \"http://localhost\"\n")
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("Unknown section 'networks'"));

		// Includes only work when loading from a file.
		let err = format!("include = \"account.toml\"\n{}", ACCOUNT)
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("Unknown section 'include'"));
	}

	#[test]
	fn test_scheme_names_are_exact() {
		for scheme in ["pull712", "Typed"] {
			let config_str = with_account(&format!(
				r#"
[domain]
verifying_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
[distribution]
token = "0x7d91e637589EC3Bb54D8213a9e92Dc6E8D12da91"
scheme = "{scheme}"
[[distribution.recipients]]
wallet = "0xBA9FEc0023e6AA54D96617cDb3E5507FF20F8B81"
amount = 1
"#
			));
			assert!(
				matches!(config_str.parse::<Config>(), Err(ConfigError::Validation(_))),
				"{scheme}"
			);
		}
	}

	#[test]
	fn test_parse_error_is_concise() {
		let err = "[account\nprimary = 1".parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}
}
