//! Zeroizing holder for signing key material.
//!
//! Keys only live in process memory for the duration of an invocation, read
//! from the configuration table or the `SIGNER` variable. The buffer is wiped
//! on drop and `Debug` never shows it.

use std::fmt;
use zeroize::Zeroizing;

/// A string whose contents are wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Runs `f` against the plaintext, keeping the borrow scoped.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// True for blank input, which no key provider accepts.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretString(<redacted>)")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self(Zeroizing::new(s))
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::from(s.to_string())
	}
}
