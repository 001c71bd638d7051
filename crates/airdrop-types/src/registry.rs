//! Registry trait for pluggable implementations.
//!
//! Key providers register under the name used in configuration, e.g.
//! `[account.implementations.local]`, together with a factory that builds
//! the implementation from its raw TOML table.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// Name used in configuration files to select this implementation.
	const NAME: &'static str;

	/// Factory function type this implementation provides.
	type Factory;

	/// Returns the factory for this implementation.
	fn factory() -> Self::Factory;
}
