//! Multi-file configuration loading.
//!
//! The entry file may list other files under `include`. Each of `[account]`,
//! `[domain]` and `[distribution]` lives in exactly one file, and included
//! files cannot include further files.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A section together with the file that defined it.
struct Section {
	value: toml::Value,
	source: PathBuf,
}

/// The three configuration sections as collected across files.
#[derive(Default)]
struct Sections {
	account: Option<Section>,
	domain: Option<Section>,
	distribution: Option<Section>,
}

impl Sections {
	fn slot(&mut self, name: &str) -> Option<&mut Option<Section>> {
		match name {
			"account" => Some(&mut self.account),
			"domain" => Some(&mut self.domain),
			"distribution" => Some(&mut self.distribution),
			_ => None,
		}
	}

	/// Takes every section of `table`, which was read from `source`.
	fn absorb(&mut self, table: toml::Table, source: &Path) -> Result<(), ConfigError> {
		for (name, value) in table {
			let slot = self.slot(&name).ok_or_else(|| {
				ConfigError::Validation(format!(
					"Unknown section '{}' in {}",
					name,
					source.display()
				))
			})?;
			if let Some(existing) = slot.as_ref() {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}",
					name,
					existing.source.display(),
					source.display()
				)));
			}
			*slot = Some(Section {
				value,
				source: source.to_path_buf(),
			});
		}
		Ok(())
	}

	fn into_table(self) -> toml::Table {
		[
			("account", self.account),
			("domain", self.domain),
			("distribution", self.distribution),
		]
		.into_iter()
		.filter_map(|(name, section)| section.map(|s| (name.to_string(), s.value)))
		.collect()
	}
}

/// Loads `path` and the files it includes into one validated [`Config`].
///
/// Environment references are resolved once per file, as it is read.
pub(crate) async fn load(path: &Path) -> Result<Config, ConfigError> {
	let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
	let mut loaded = HashSet::new();
	loaded.insert(canonical(path).await?);

	let mut table = read_table(path).await?;
	let includes = match table.remove("include") {
		Some(value) => include_paths(value)?,
		None => Vec::new(),
	};

	let mut sections = Sections::default();
	sections.absorb(table, path)?;

	for include in includes {
		let include_path = base_dir.join(include);
		let canonical_path = canonical(&include_path).await?;
		if !loaded.insert(canonical_path) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				include_path.display()
			)));
		}

		let table = read_table(&include_path).await?;
		if table.contains_key("include") {
			return Err(ConfigError::Validation(format!(
				"Nested include in {} is not supported",
				include_path.display()
			)));
		}
		sections.absorb(table, &include_path)?;
	}

	Config::from_table(sections.into_table())
}

async fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
	tokio::fs::canonicalize(path).await.map_err(|e| {
		ConfigError::Io(std::io::Error::new(
			e.kind(),
			format!("Cannot resolve path {}: {}", path.display(), e),
		))
	})
}

async fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
	let content = tokio::fs::read_to_string(path).await?;
	Ok(toml::from_str(&resolve_env_vars(&content)?)?)
}

/// `include` is either one path or an array of paths.
fn include_paths(value: toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
