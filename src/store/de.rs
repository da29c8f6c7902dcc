//! Destructuring of the merged tree into caller-defined types.
//!
//! The tree is walked through serde, so the binding between a dotted path
//! and a field is whatever the target's `Deserialize` impl declares. Values
//! are converted weakly: environment variables only ever yield strings, so
//! numbers and booleans are parsed from strings on demand.

use crate::error::ConfigError;
use crate::store::path::KeyPath;
use crate::store::value::{Table, Value};
use serde::de::{
	self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess,
	SeqAccess, VariantAccess, Visitor,
};
use std::collections::btree_map;
use std::fmt;

pub(crate) fn from_table<T: DeserializeOwned>(table: &Table) -> Result<T, DeError> {
	let root = Value::Table(table.clone());
	T::deserialize(ValueDeserializer::new(&root, KeyPath::root()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeErrorKind {
	TypeMismatch { expected: String, found: String },
	Custom(String),
}

/// Error raised while destructuring, tagged with the innermost path it
/// was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeError {
	path: Option<String>,
	kind: DeErrorKind,
}

impl DeError {
	fn at(mut self, path: &KeyPath) -> Self {
		if self.path.is_none() {
			self.path = Some(path.to_string());
		}
		self
	}

	fn path(&self) -> String {
		self.path
			.clone()
			.unwrap_or_else(|| KeyPath::root().to_string())
	}
}

impl fmt::Display for DeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			DeErrorKind::TypeMismatch { expected, found } => {
				write!(f, "expected {expected}, found {found} at `{}`", self.path())
			}
			DeErrorKind::Custom(message) => write!(f, "{message} at `{}`", self.path()),
		}
	}
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
	fn custom<T: fmt::Display>(msg: T) -> Self {
		Self {
			path: None,
			kind: DeErrorKind::Custom(msg.to_string()),
		}
	}

	fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
		Self {
			path: None,
			kind: DeErrorKind::TypeMismatch {
				expected: exp.to_string(),
				found: unexp.to_string(),
			},
		}
	}

	fn invalid_value(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
		Self::invalid_type(unexp, exp)
	}
}

impl From<DeError> for ConfigError {
	fn from(err: DeError) -> Self {
		let path = err.path();
		match err.kind {
			DeErrorKind::TypeMismatch { expected, found } => ConfigError::TypeMismatch {
				path,
				expected,
				found,
			},
			DeErrorKind::Custom(message) => ConfigError::Destructure { path, message },
		}
	}
}

/// Accepts `1/t/true` and `0/f/false` in lower, upper and title case.
fn parse_bool(s: &str) -> Option<bool> {
	match s {
		"1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
		"0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
		_ => None,
	}
}

fn float_to_int(f: f64) -> Option<i64> {
	if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
		Some(f as i64)
	} else {
		None
	}
}

struct ValueDeserializer<'a> {
	value: &'a Value,
	path: KeyPath,
}

impl<'a> ValueDeserializer<'a> {
	fn new(value: &'a Value, path: KeyPath) -> Self {
		Self { value, path }
	}

	fn mismatch(&self, expected: &str) -> DeError {
		<DeError as de::Error>::invalid_type(self.value.unexpected(), &expected).at(&self.path)
	}

	fn deserialize_integer<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let result = match self.value {
			Value::Integer(n) => visitor.visit_i64(*n),
			Value::Unsigned(n) => visitor.visit_u64(*n),
			Value::Float(f) => match float_to_int(*f) {
				Some(n) => visitor.visit_i64(n),
				None => return Err(self.mismatch("an integer")),
			},
			Value::String(s) => {
				if let Ok(n) = s.parse::<i64>() {
					visitor.visit_i64(n)
				} else if let Ok(n) = s.parse::<u64>() {
					visitor.visit_u64(n)
				} else {
					return Err(self.mismatch("an integer"));
				}
			}
			_ => return Err(self.mismatch("an integer")),
		};
		result.map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_float<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let f = match self.value {
			Value::Float(f) => *f,
			Value::Integer(n) => *n as f64,
			Value::Unsigned(n) => *n as f64,
			Value::String(s) => match s.parse::<f64>() {
				Ok(f) => f,
				Err(_) => return Err(self.mismatch("a float")),
			},
			_ => return Err(self.mismatch("a float")),
		};
		visitor.visit_f64(f).map_err(|e: DeError| e.at(&self.path))
	}
}

macro_rules! forward_to_integer {
	($($method:ident)*) => {
		$(
			fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
				self.deserialize_integer(visitor)
			}
		)*
	};
}

impl<'de, 'a> Deserializer<'de> for ValueDeserializer<'a> {
	type Error = DeError;

	fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let result = match self.value {
			Value::String(s) => visitor.visit_str(s),
			Value::Integer(n) => visitor.visit_i64(*n),
			Value::Unsigned(n) => visitor.visit_u64(*n),
			Value::Float(f) => visitor.visit_f64(*f),
			Value::Boolean(b) => visitor.visit_bool(*b),
			Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items, &self.path)),
			Value::Table(table) => {
				visitor.visit_map(MapDeserializer::new(table, &self.path, None))
			}
		};
		result.map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let b = match self.value {
			Value::Boolean(b) => *b,
			Value::Integer(n) => *n != 0,
			Value::Unsigned(n) => *n != 0,
			Value::String(s) => match parse_bool(s) {
				Some(b) => b,
				None => return Err(self.mismatch("a boolean")),
			},
			_ => return Err(self.mismatch("a boolean")),
		};
		visitor.visit_bool(b).map_err(|e: DeError| e.at(&self.path))
	}

	forward_to_integer! {
		deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
		deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
	}

	fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_float(visitor)
	}

	fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_float(visitor)
	}

	fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_str(visitor)
	}

	fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let result = match self.value {
			Value::String(s) => visitor.visit_str(s),
			Value::Integer(n) => visitor.visit_string(n.to_string()),
			Value::Unsigned(n) => visitor.visit_string(n.to_string()),
			Value::Float(f) => visitor.visit_string(f.to_string()),
			Value::Boolean(b) => visitor.visit_string(b.to_string()),
			_ => return Err(self.mismatch("a string")),
		};
		result.map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_str(visitor)
	}

	fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_any(visitor)
	}

	fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_any(visitor)
	}

	fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		// The store has no null; a present key is always `Some`.
		visitor.visit_some(self)
	}

	fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		visitor.visit_unit().map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_unit_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		visitor: V,
	) -> Result<V::Value, DeError> {
		self.deserialize_unit(visitor)
	}

	fn deserialize_newtype_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		visitor: V,
	) -> Result<V::Value, DeError> {
		visitor.visit_newtype_struct(self)
	}

	fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		let items: &[Value] = match self.value {
			Value::Array(items) => items.as_slice(),
			Value::Table(_) => return Err(self.mismatch("a sequence")),
			Value::String(s) if s.is_empty() => &[][..],
			scalar => std::slice::from_ref(scalar),
		};
		visitor
			.visit_seq(SeqDeserializer::new(items, &self.path))
			.map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_tuple<V: Visitor<'de>>(
		self,
		_len: usize,
		visitor: V,
	) -> Result<V::Value, DeError> {
		self.deserialize_seq(visitor)
	}

	fn deserialize_tuple_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		_len: usize,
		visitor: V,
	) -> Result<V::Value, DeError> {
		self.deserialize_seq(visitor)
	}

	fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		match self.value {
			Value::Table(table) => visitor
				.visit_map(MapDeserializer::new(table, &self.path, None))
				.map_err(|e: DeError| e.at(&self.path)),
			_ => Err(self.mismatch("a table")),
		}
	}

	fn deserialize_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, DeError> {
		match self.value {
			Value::Table(table) => visitor
				.visit_map(MapDeserializer::new(table, &self.path, Some(fields)))
				.map_err(|e: DeError| e.at(&self.path)),
			_ => Err(self.mismatch("a table")),
		}
	}

	fn deserialize_enum<V: Visitor<'de>>(
		self,
		_name: &'static str,
		variants: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, DeError> {
		let result = match self.value {
			Value::String(s) => {
				let variant = match_name(variants, s);
				visitor.visit_enum(str_deserializer(variant))
			}
			Value::Table(table) if table.len() == 1 => {
				let Some((key, value)) = table.iter().next() else {
					return Err(self.mismatch("an enum"));
				};
				visitor.visit_enum(EnumDeserializer {
					variant: match_name(variants, key),
					value,
					path: self.path.child(key),
				})
			}
			_ => return Err(self.mismatch("an enum")),
		};
		result.map_err(|e: DeError| e.at(&self.path))
	}

	fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		self.deserialize_str(visitor)
	}

	fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
		visitor.visit_unit()
	}
}

fn str_deserializer(s: &str) -> de::value::StrDeserializer<'_, DeError> {
	s.into_deserializer()
}

/// Resolve a store key against declared names, ignoring ASCII case.
fn match_name<'a>(names: &'static [&'static str], key: &'a str) -> &'a str {
	names
		.iter()
		.find(|name| name.eq_ignore_ascii_case(key))
		.copied()
		.unwrap_or(key)
}

struct SeqDeserializer<'a> {
	iter: std::iter::Enumerate<std::slice::Iter<'a, Value>>,
	path: KeyPath,
}

impl<'a> SeqDeserializer<'a> {
	fn new(items: &'a [Value], path: &KeyPath) -> Self {
		Self {
			iter: items.iter().enumerate(),
			path: path.clone(),
		}
	}
}

impl<'de, 'a> SeqAccess<'de> for SeqDeserializer<'a> {
	type Error = DeError;

	fn next_element_seed<T: DeserializeSeed<'de>>(
		&mut self,
		seed: T,
	) -> Result<Option<T::Value>, DeError> {
		match self.iter.next() {
			Some((index, value)) => seed
				.deserialize(ValueDeserializer::new(value, self.path.index(index)))
				.map(Some),
			None => Ok(None),
		}
	}

	fn size_hint(&self) -> Option<usize> {
		Some(self.iter.len())
	}
}

struct MapDeserializer<'a> {
	iter: btree_map::Iter<'a, String, Value>,
	fields: Option<&'static [&'static str]>,
	pending: Option<(&'a str, &'a Value)>,
	path: KeyPath,
}

impl<'a> MapDeserializer<'a> {
	fn new(table: &'a Table, path: &KeyPath, fields: Option<&'static [&'static str]>) -> Self {
		Self {
			iter: table.iter(),
			fields,
			pending: None,
			path: path.clone(),
		}
	}
}

impl<'de, 'a> MapAccess<'de> for MapDeserializer<'a> {
	type Error = DeError;

	fn next_key_seed<K: DeserializeSeed<'de>>(
		&mut self,
		seed: K,
	) -> Result<Option<K::Value>, DeError> {
		let Some((key, value)) = self.iter.next() else {
			return Ok(None);
		};
		self.pending = Some((key.as_str(), value));

		let name = match self.fields {
			Some(fields) => match_name(fields, key),
			None => key.as_str(),
		};
		seed.deserialize(str_deserializer(name))
			.map(Some)
			.map_err(|e: DeError| e.at(&self.path.child(key)))
	}

	fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
		let Some((key, value)) = self.pending.take() else {
			return Err(de::Error::custom("value requested before key"));
		};
		seed.deserialize(ValueDeserializer::new(value, self.path.child(key)))
	}

	fn size_hint(&self) -> Option<usize> {
		Some(self.iter.len())
	}
}

struct EnumDeserializer<'a> {
	variant: &'a str,
	value: &'a Value,
	path: KeyPath,
}

impl<'de, 'a> EnumAccess<'de> for EnumDeserializer<'a> {
	type Error = DeError;
	type Variant = ValueDeserializer<'a>;

	fn variant_seed<V: DeserializeSeed<'de>>(
		self,
		seed: V,
	) -> Result<(V::Value, Self::Variant), DeError> {
		let variant = seed.deserialize(str_deserializer(self.variant))?;
		Ok((variant, ValueDeserializer::new(self.value, self.path)))
	}
}

impl<'de, 'a> VariantAccess<'de> for ValueDeserializer<'a> {
	type Error = DeError;

	fn unit_variant(self) -> Result<(), DeError> {
		Ok(())
	}

	fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, DeError> {
		seed.deserialize(self)
	}

	fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DeError> {
		Deserializer::deserialize_seq(self, visitor)
	}

	fn struct_variant<V: Visitor<'de>>(
		self,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, DeError> {
		Deserializer::deserialize_struct(self, "", fields, visitor)
	}
}
