//! Main entry point for the airdrop claim signer.
//!
//! Issues the off-chain authorizations recipients present to the pull
//! distribution contracts, either one claim at a time or for a whole
//! configured distribution, and recovers signers from existing signatures.

use airdrop_config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod batch;
mod commands;
mod error;
mod signer;

use commands::{PullArgs, RecoverArgs, TypedArgs};
use error::ServiceError;

/// Command-line arguments for the airdrop signer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file. Without it the key is read from SIGNER.
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Sign a plain-hash claim for (token, recipient, amount)
	Pull(PullArgs),
	/// Sign an EIP-712 Recipient claim and print {r, s, v}
	Typed(TypedArgs),
	/// Sign every recipient listed under [distribution]
	Batch,
	/// Recover the signer of an existing claim signature
	Recover(RecoverArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Logs go to stderr so stdout stays machine readable.
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = match &args.config {
		Some(path) => {
			let path = path.to_str().ok_or_else(|| {
				ServiceError::InvalidArgument(format!("Non UTF-8 config path: {}", path.display()))
			})?;
			let config = Config::from_file(path).await?;
			tracing::info!(account = %config.account.primary, "Loaded configuration");
			Some(config)
		},
		None => None,
	};

	let output = run(args.command, config.as_ref()).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

async fn run(command: Command, config: Option<&Config>) -> Result<serde_json::Value, ServiceError> {
	match command {
		Command::Recover(args) => commands::recover(&args),
		Command::Pull(args) => {
			let signer = signer::build_signer(config)?;
			commands::pull(&signer, &args).await
		},
		Command::Typed(args) => {
			let signer = signer::build_signer(config)?;
			commands::typed(&signer, &args).await
		},
		Command::Batch => {
			let config = config.ok_or_else(|| {
				ServiceError::InvalidArgument("batch requires --config".to_string())
			})?;
			let distribution = config.distribution.as_ref().ok_or_else(|| {
				ServiceError::InvalidArgument(
					"configuration has no [distribution] section".to_string(),
				)
			})?;
			let signer = signer::build_signer(Some(config))?;
			let entries = batch::sign_distribution(&signer, distribution, &config.domain).await?;
			serde_json::to_value(entries)
				.map_err(|e| ServiceError::InvalidArgument(format!("Failed to encode output: {}", e)))
		},
	}
}
