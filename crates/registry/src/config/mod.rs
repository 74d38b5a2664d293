//! Declarative schema configuration.
//!
//! Generators are code, so patterns are always registered programmatically.
//! Categories and convenience methods only need tuple templates and positions,
//! and can be loaded from TOML:
//!
//! ```toml
//! [[category]]
//! name = "world_string"
//! pattern = [":world", "<float>", "<string>"]
//! positions = [2]
//!
//! [[method]]
//! name = "hello"
//! template = [":hello", "<int>"]
//! positions = [1]
//!
//! [[method]]
//! name = "world"
//! template = [":world", "<float>", "<string>"]
//! named = { x = 1, label = 2 }
//! ```
//!
//! TOML numbers and booleans are literals. Strings use the element syntax of
//! [`Element`]'s `FromStr` impl: `":name"` symbols, `"<kind>"` markers, `"*"`
//! wildcard, `"::text"` for a literal string starting with `:`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use idreg_primitives::{Element, ParseElementError, Pattern, Value};
use serde::Deserialize;
use tracing::debug;

use crate::{CacheObject, MethodSlots, RegistryError, Schema};

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The document is not valid TOML or does not have the expected shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The configuration file could not be read.
	#[error("failed to read {}: {source}", .path.display())]
	Io {
		/// File that failed to load.
		path: PathBuf,
		/// Underlying I/O error.
		source: std::io::Error,
	},

	/// A template element string could not be parsed.
	#[error("{context}: {source}")]
	Element {
		/// Category or method the element belongs to.
		context: String,
		/// Parse failure.
		source: ParseElementError,
	},

	/// A method declares both or neither of `positions` and `named`.
	#[error("method {name}: exactly one of `positions` or `named` is required")]
	MethodSlots {
		/// Method name.
		name: String,
	},

	/// The schema rejected a definition.
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// One template element as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawElement {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}

impl RawElement {
	fn parse(&self) -> std::result::Result<Element, ParseElementError> {
		Ok(match self {
			RawElement::Bool(v) => Element::Literal(Value::Bool(*v)),
			RawElement::Int(v) => Element::Literal(Value::Int(*v)),
			RawElement::Float(v) => Element::Literal(Value::Float(*v)),
			RawElement::Text(s) => s.parse()?,
		})
	}
}

/// A `[[category]]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
	pub name: String,
	pub pattern: Vec<RawElement>,
	pub positions: Vec<usize>,
}

/// A `[[method]]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodConfig {
	pub name: String,
	pub template: Vec<RawElement>,
	/// Target position of each positional argument.
	#[serde(default)]
	pub positions: Option<Vec<usize>>,
	/// Target position of each keyword argument.
	#[serde(default)]
	pub named: Option<BTreeMap<String, usize>>,
}

impl MethodConfig {
	fn slots(&self) -> Result<MethodSlots> {
		match (&self.positions, &self.named) {
			(Some(positions), None) => Ok(MethodSlots::positional(positions.iter().copied())),
			(None, Some(named)) => Ok(MethodSlots::named(named.iter().map(|(k, v)| (k, *v)))),
			_ => Err(ConfigError::MethodSlots { name: self.name.clone() }),
		}
	}
}

/// Parsed schema configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
	#[serde(default, rename = "category")]
	pub categories: Vec<CategoryConfig>,
	#[serde(default, rename = "method")]
	pub methods: Vec<MethodConfig>,
}

impl SchemaConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Reads and parses a TOML file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}

	/// Registers every category and method with `schema`.
	///
	/// All templates are parsed before the schema is touched, so syntax errors
	/// leave it unchanged. A definition the schema rejects stops the apply;
	/// definitions registered before it stay registered.
	pub fn apply<T>(&self, schema: &Schema<T>) -> Result<()>
	where
		T: ?Sized + CacheObject,
	{
		let categories = self
			.categories
			.iter()
			.map(|c| Ok((c, parse_template(&c.pattern, &c.name)?)))
			.collect::<Result<Vec<_>>>()?;
		let methods = self
			.methods
			.iter()
			.map(|m| Ok((m, parse_template(&m.template, &m.name)?, m.slots()?)))
			.collect::<Result<Vec<_>>>()?;

		for (category, pattern) in categories {
			schema.add_category(&category.name, pattern, category.positions.iter().copied())?;
		}
		for (method, template, slots) in methods {
			schema.add_convenience_method(&method.name, template, slots)?;
		}
		debug!(categories = self.categories.len(), methods = self.methods.len(), "applied schema config");
		Ok(())
	}
}

fn parse_template(elements: &[RawElement], context: &str) -> Result<Pattern> {
	elements
		.iter()
		.map(|raw| {
			raw.parse().map_err(|source| ConfigError::Element {
				context: context.to_string(),
				source,
			})
		})
		.collect()
}
