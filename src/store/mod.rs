//! The merge store: an ordered, case-insensitive key tree that accumulates
//! values from every loaded source.
//!
//! Writes follow last-write-wins at the leaves. Tables written over tables
//! are merged key by key; anything else replaces what was there.

pub(crate) mod de;
pub mod path;
pub mod value;

pub use path::KeyPath;
pub use value::{Table, Value};

use serde::de::DeserializeOwned;

/// Layered key-value tree owned by a single builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
	root: Table,
}

impl Store {
	pub fn new() -> Self {
		Self::default()
	}

	/// Deep-merge `value` at the dotted `path`.
	///
	/// Empty segments are ignored, so `"a..b"` addresses the same node as
	/// `"a.b"`. A path with no segments merges `value` into the root when it
	/// is a table and is otherwise ignored.
	pub fn set(&mut self, path: &str, value: impl Into<Value>) {
		let value = value.into().normalize_keys();
		let nested = path
			.rsplit('.')
			.filter(|segment| !segment.is_empty())
			.fold(value, |inner, segment| {
				Value::Table(Table::from([(segment.to_lowercase(), inner)]))
			});

		if let Value::Table(table) = nested {
			merge_tables(&mut self.root, table);
		}
	}

	/// Deep-merge a whole table, as produced by a source parser, into the root.
	pub fn merge(&mut self, table: Table) {
		merge_tables(&mut self.root, value::normalize_table(table));
	}

	/// Look up the value at a dotted path.
	pub fn get(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.').filter(|segment| !segment.is_empty());
		let first = segments.next()?.to_lowercase();
		let mut current = self.root.get(&first)?;
		for segment in segments {
			current = current.as_table()?.get(&segment.to_lowercase())?;
		}
		Some(current)
	}

	pub fn as_table(&self) -> &Table {
		&self.root
	}

	pub fn into_table(self) -> Table {
		self.root
	}

	/// Destructure the whole tree into a typed structure.
	pub fn unmarshal<T: DeserializeOwned>(&self) -> crate::Result<T> {
		de::from_table(&self.root).map_err(Into::into)
	}
}

fn merge_values(existing: &mut Value, incoming: Value) {
	match (existing, incoming) {
		(Value::Table(dst), Value::Table(src)) => merge_tables(dst, src),
		(slot, incoming) => *slot = incoming,
	}
}

fn merge_tables(dst: &mut Table, src: Table) {
	for (key, value) in src {
		match dst.get_mut(&key) {
			Some(existing) => merge_values(existing, value),
			None => {
				dst.insert(key, value);
			}
		}
	}
}
