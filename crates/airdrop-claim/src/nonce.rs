//! Per-wallet nonce bookkeeping for batch issuance.
//!
//! The nonced typed scheme only accepts the wallet's next nonce, so signing a
//! run of claims for the same wallet needs a running counter. The signer never
//! learns the on-chain value; the tracker is seeded with whatever the caller
//! believes the verifier expects.

use crate::ClaimError;
use airdrop_types::U256;
use alloy_primitives::Address;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Hands out consecutive nonces per wallet.
pub struct NonceTracker {
	start: U256,
	/// `None` once `U256::MAX` has been issued.
	next: Mutex<HashMap<Address, Option<U256>>>,
}

impl NonceTracker {
	/// Creates a tracker where every wallet starts at `start`.
	pub fn new(start: impl Into<U256>) -> Self {
		Self {
			start: start.into(),
			next: Mutex::new(HashMap::new()),
		}
	}

	/// Consumes and returns the next nonce for `wallet`.
	pub async fn issue(&self, wallet: &Address) -> Result<U256, ClaimError> {
		let mut next = self.next.lock().await;
		let slot = next.entry(*wallet).or_insert(Some(self.start));
		let issued = (*slot).ok_or_else(|| {
			ClaimError::InvalidNonce(format!("nonces for {} are exhausted", wallet))
		})?;
		*slot = issued.checked_add(U256::from(1));
		Ok(issued)
	}

	/// Sets the next nonce for `wallet`, e.g. to the verifier's current
	/// counter for it.
	pub async fn reset(&self, wallet: &Address, nonce: impl Into<U256>) {
		self.next.lock().await.insert(*wallet, Some(nonce.into()));
	}
}

impl Default for NonceTracker {
	fn default() -> Self {
		Self::new(U256::ZERO)
	}
}
