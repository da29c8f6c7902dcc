use serde::Serialize;
use serde::de::Unexpected;
use std::collections::BTreeMap;

/// Ordered mapping from lower-cased key segment to value.
pub type Table = BTreeMap<String, Value>;

/// A node of the merged configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
	String(String),
	Integer(i64),
	/// Integers above `i64::MAX`; smaller ones are always `Integer`.
	Unsigned(u64),
	Float(f64),
	Boolean(bool),
	Array(Vec<Value>),
	Table(Table),
}

impl Value {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_table(&self) -> Option<&Table> {
		match self {
			Value::Table(table) => Some(table),
			_ => None,
		}
	}

	/// Rewrite every table key in this subtree to lower case.
	pub(crate) fn normalize_keys(self) -> Value {
		match self {
			Value::Table(table) => Value::Table(normalize_table(table)),
			Value::Array(items) => Value::Array(items.into_iter().map(Value::normalize_keys).collect()),
			scalar => scalar,
		}
	}

	pub(crate) fn unexpected(&self) -> Unexpected<'_> {
		match self {
			Value::String(s) => Unexpected::Str(s),
			Value::Integer(n) => Unexpected::Signed(*n),
			Value::Unsigned(n) => Unexpected::Unsigned(*n),
			Value::Float(f) => Unexpected::Float(*f),
			Value::Boolean(b) => Unexpected::Bool(*b),
			Value::Array(_) => Unexpected::Seq,
			Value::Table(_) => Unexpected::Map,
		}
	}
}

/// Lower-case every key, merging siblings that differ only by case.
pub(crate) fn normalize_table(table: Table) -> Table {
	let mut normalized = Table::new();
	for (key, value) in table {
		let entry = Table::from([(key.to_lowercase(), value.normalize_keys())]);
		super::merge_tables(&mut normalized, entry);
	}
	normalized
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Integer(value)
	}
}

impl From<u64> for Value {
	fn from(value: u64) -> Self {
		match i64::try_from(value) {
			Ok(n) => Value::Integer(n),
			Err(_) => Value::Unsigned(value),
		}
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Boolean(value)
	}
}

impl From<Table> for Value {
	fn from(value: Table) -> Self {
		Value::Table(value)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(value: Vec<T>) -> Self {
		Value::Array(value.into_iter().map(Into::into).collect())
	}
}

impl From<toml::Value> for Value {
	fn from(value: toml::Value) -> Self {
		match value {
			toml::Value::String(s) => Value::String(s),
			toml::Value::Integer(n) => Value::Integer(n),
			toml::Value::Float(f) => Value::Float(f),
			toml::Value::Boolean(b) => Value::Boolean(b),
			toml::Value::Datetime(dt) => Value::String(dt.to_string()),
			toml::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
			toml::Value::Table(table) => Value::Table(
				table
					.into_iter()
					.map(|(key, value)| (key, Value::from(value)))
					.collect(),
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_normalize_keys_is_recursive() {
		let mut inner = Table::new();
		inner.insert("MaxConns".to_string(), Value::Integer(4));
		let mut outer = Table::new();
		outer.insert("Server".to_string(), Value::Table(inner));

		let normalized = normalize_table(outer);
		let server = normalized["server"].as_table().unwrap();
		assert_eq!(server["maxconns"], Value::Integer(4));
	}

	#[test]
	fn test_u64_above_i64_stays_exact() {
		assert_eq!(Value::from(7u64), Value::Integer(7));
		assert_eq!(Value::from(u64::MAX), Value::Unsigned(u64::MAX));
	}

	#[test]
	fn test_toml_datetime_becomes_string() {
		let table: toml::Table = toml::from_str("at = 1979-05-27T07:32:00Z").unwrap();
		let value = Value::from(toml::Value::Table(table));
		let at = value.as_table().unwrap()["at"].as_str().unwrap();
		assert_eq!(at, "1979-05-27T07:32:00Z");
	}

	#[test]
	fn test_serialize_untagged() {
		let value = Value::from(vec![1i64, 2, 3]);
		assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2,3]");
	}
}
