use crate::store::{Table, Value};
use std::path::Path;

/// Errors reported by a format parser. Wrapped in `ConfigError::ParseFailure`.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("content is not valid UTF-8")]
	Utf8(#[from] std::str::Utf8Error),

	#[error(transparent)]
	Toml(#[from] toml::de::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error("{0}")]
	Structure(String),
}

/// Turns raw file contents into a nested key/value table.
pub trait Parser: Send + Sync {
	/// Short format name used in errors and logs.
	fn name(&self) -> &'static str;

	fn parse(&self, bytes: &[u8]) -> Result<Table, ParseError>;
}

/// TOML documents. Datetimes are kept as their string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

/// JSON documents whose top level is an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Parser for Toml {
	fn name(&self) -> &'static str {
		"toml"
	}

	fn parse(&self, bytes: &[u8]) -> Result<Table, ParseError> {
		let content = std::str::from_utf8(bytes)?;
		let table: toml::Table = toml::from_str(content)?;
		Ok(table
			.into_iter()
			.map(|(key, value)| (key, Value::from(value)))
			.collect())
	}
}

impl Parser for Json {
	fn name(&self) -> &'static str {
		"json"
	}

	fn parse(&self, bytes: &[u8]) -> Result<Table, ParseError> {
		match serde_json::from_slice(bytes)? {
			serde_json::Value::Object(map) => json_object(map),
			_ => Err(ParseError::Structure(
				"top-level JSON value must be an object".to_string(),
			)),
		}
	}
}

fn json_object(map: serde_json::Map<String, serde_json::Value>) -> Result<Table, ParseError> {
	let mut table = Table::new();
	for (key, value) in map {
		// null members are treated as absent
		if let Some(value) = json_value(value)? {
			table.insert(key, value);
		}
	}
	Ok(table)
}

fn json_value(value: serde_json::Value) -> Result<Option<Value>, ParseError> {
	let value = match value {
		serde_json::Value::Null => return Ok(None),
		serde_json::Value::Bool(b) => Value::Boolean(b),
		serde_json::Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				Value::Integer(i)
			} else if let Some(u) = n.as_u64() {
				Value::Unsigned(u)
			} else {
				Value::Float(n.as_f64().unwrap_or(f64::NAN))
			}
		}
		serde_json::Value::String(s) => Value::String(s),
		serde_json::Value::Array(items) => {
			let mut values = Vec::with_capacity(items.len());
			for item in items {
				let item = json_value(item)?.ok_or_else(|| {
					ParseError::Structure("null is not supported inside arrays".to_string())
				})?;
				values.push(item);
			}
			Value::Array(values)
		}
		serde_json::Value::Object(map) => Value::Table(json_object(map)?),
	};
	Ok(Some(value))
}

/// Pick a parser from a file extension (`.toml`, `.json`; case-insensitive).
pub fn parser_for_path(path: &Path) -> Option<&'static dyn Parser> {
	let ext = path.extension()?.to_str()?.to_ascii_lowercase();
	match ext.as_str() {
		"toml" => Some(&Toml),
		"json" => Some(&Json),
		_ => None,
	}
}
