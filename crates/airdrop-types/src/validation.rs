//! Checks for the raw TOML tables key providers are configured with.
//!
//! Providers receive their `[account.implementations.<name>]` table untyped.
//! A [`Schema`] lists the string fields the provider needs and rejects the
//! table before any key material is parsed.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// The configuration is not a table.
	#[error("Expected a table, got {0}")]
	NotATable(String),
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field is present but is not a string.
	#[error("Field '{field}' must be a string, got {actual}")]
	NotAString { field: String, actual: String },
	/// A field is present but its value is rejected.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
}

/// Check run on a field's string value.
pub type FieldValidator = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// A required string field.
pub struct Field {
	pub name: String,
	pub validator: Option<FieldValidator>,
}

impl Field {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			validator: None,
		}
	}

	/// Attaches a check returning an error message on failure.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// The fields a provider table must carry. Unknown keys are ignored.
pub struct Schema {
	fields: Vec<Field>,
}

impl Schema {
	pub fn new(fields: Vec<Field>) -> Self {
		Self { fields }
	}

	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::NotATable(config.type_str().to_string()))?;

		for field in &self.fields {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			let value = value.as_str().ok_or_else(|| ValidationError::NotAString {
				field: field.name.clone(),
				actual: value.type_str().to_string(),
			})?;
			if let Some(validator) = &field.validator {
				validator(value).map_err(|message| ValidationError::InvalidValue {
					field: field.name.clone(),
					message,
				})?;
			}
		}
		Ok(())
	}
}
