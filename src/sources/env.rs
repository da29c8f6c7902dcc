//! Environment variables as a config source.
//!
//! A variable `APP_SERVER_PORTS=80,443` read with prefix `APP`, key
//! delimiter `_` and value delimiter `,` becomes the dotted key
//! `server.ports` holding the list `["80", "443"]`.

use crate::store::Value;

/// Errors from enumerating the environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	#[error("environment variable name is not valid unicode: {name}")]
	NonUnicodeName { name: String },

	#[error("value of environment variable {name} is not valid unicode")]
	NonUnicodeValue { name: String },
}

/// Something that can list environment variables.
pub trait Environment {
	/// All `(name, value)` pairs whose name starts with `prefix`.
	fn vars(&self, prefix: &str) -> Result<Vec<(String, String)>, EnvError>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
	fn vars(&self, prefix: &str) -> Result<Vec<(String, String)>, EnvError> {
		let mut vars = Vec::new();
		for (name, value) in std::env::vars_os() {
			let name = match name.into_string() {
				Ok(name) => name,
				Err(raw) => {
					let lossy = raw.to_string_lossy();
					if lossy.starts_with(prefix) {
						return Err(EnvError::NonUnicodeName {
							name: lossy.into_owned(),
						});
					}
					continue;
				}
			};

			if !name.starts_with(prefix) {
				continue;
			}

			let value = value
				.into_string()
				.map_err(|_| EnvError::NonUnicodeValue { name: name.clone() })?;
			vars.push((name, value));
		}
		Ok(vars)
	}
}

impl<K: AsRef<str>, V: AsRef<str>> Environment for [(K, V)] {
	fn vars(&self, prefix: &str) -> Result<Vec<(String, String)>, EnvError> {
		Ok(self
			.iter()
			.filter(|(name, _)| name.as_ref().starts_with(prefix))
			.map(|(name, value)| (name.as_ref().to_string(), value.as_ref().to_string()))
			.collect())
	}
}

/// Convert one environment variable into a dotted key and a value.
///
/// Returns `None` when `raw_key` does not start with `prefix + key_delimiter`
/// or nothing but delimiters remains after the prefix. An empty
/// `key_delimiter` keeps the remainder as a single key segment; an empty
/// `value_delimiter` keeps the raw value as one string.
pub fn transform_env_entry(
	raw_key: &str,
	raw_value: &str,
	prefix: &str,
	key_delimiter: &str,
	value_delimiter: &str,
) -> Option<(String, Value)> {
	let rest = raw_key.strip_prefix(prefix)?.strip_prefix(key_delimiter)?;
	let lowered = rest.to_lowercase();

	let key = if key_delimiter.is_empty() {
		lowered
	} else {
		lowered
			.split(key_delimiter)
			.filter(|segment| !segment.is_empty())
			.collect::<Vec<_>>()
			.join(".")
	};
	if key.is_empty() {
		return None;
	}

	if value_delimiter.is_empty() {
		return Some((key, Value::from(raw_value)));
	}

	let trimmed = raw_value
		.trim_start_matches(value_delimiter)
		.trim_end_matches(value_delimiter);
	let mut parts: Vec<&str> = trimmed.split(value_delimiter).collect();

	let value = if parts.len() == 1 {
		Value::from(parts.remove(0))
	} else {
		Value::from(parts)
	};
	Some((key, value))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_section_field_with_list() {
		let (key, value) =
			transform_env_entry("PREFIX_SECTION_FIELD", "1,2,3", "PREFIX", "_", ",").unwrap();
		assert_eq!(key, "section.field");
		assert_eq!(value, Value::from(vec!["1", "2", "3"]));
	}

	#[test]
	fn test_delimiter_noise_is_trimmed() {
		let (_, value) =
			transform_env_entry("PREFIX_SECTION_FIELD", ",,1,2,3,,,", "PREFIX", "_", ",").unwrap();
		assert_eq!(value, Value::from(vec!["1", "2", "3"]));
	}

	#[test]
	fn test_single_element_is_scalar() {
		let (_, value) = transform_env_entry("APP_PORT", "8080", "APP", "_", ",").unwrap();
		assert_eq!(value, Value::from("8080"));
	}

	#[test]
	fn test_only_delimiters_is_empty_scalar() {
		let (_, value) = transform_env_entry("APP_LIST", ",,,", "APP", "_", ",").unwrap();
		assert_eq!(value, Value::from(""));
	}

	#[test]
	fn test_inner_empty_elements_are_kept() {
		let (_, value) = transform_env_entry("APP_LIST", "a,,b", "APP", "_", ",").unwrap();
		assert_eq!(value, Value::from(vec!["a", "", "b"]));
	}

	#[test]
	fn test_empty_value_delimiter_keeps_raw_value() {
		let (_, value) = transform_env_entry("APP_LIST", ",1,2,", "APP", "_", "").unwrap();
		assert_eq!(value, Value::from(",1,2,"));
	}

	#[test]
	fn test_multi_char_value_delimiter() {
		let (_, value) = transform_env_entry("APP_HOSTS", "a::b::::", "APP", "_", "::").unwrap();
		assert_eq!(value, Value::from(vec!["a", "b"]));
	}

	#[test]
	fn test_prefix_must_be_followed_by_delimiter() {
		assert!(transform_env_entry("APPLICATION_PORT", "1", "APP", "_", ",").is_none());
		assert!(transform_env_entry("OTHER_PORT", "1", "APP", "_", ",").is_none());
	}

	#[test]
	fn test_prefix_match_is_case_sensitive() {
		assert!(transform_env_entry("app_port", "1", "APP", "_", ",").is_none());
	}

	#[test]
	fn test_empty_segments_are_dropped() {
		let (key, _) = transform_env_entry("APP_DB__HOST_", "x", "APP", "_", ",").unwrap();
		assert_eq!(key, "db.host");
	}

	#[test]
	fn test_bare_prefix_is_ignored() {
		assert!(transform_env_entry("APP_", "x", "APP", "_", ",").is_none());
		assert!(transform_env_entry("APP___", "x", "APP", "_", ",").is_none());
	}

	#[test]
	fn test_double_underscore_key_delimiter() {
		let (key, _) =
			transform_env_entry("APP__SERVER__MAX_CONNS", "4", "APP", "__", ",").unwrap();
		assert_eq!(key, "server.max_conns");
	}

	#[test]
	fn test_empty_key_delimiter_disables_nesting() {
		let (key, _) = transform_env_entry("APPSERVER_PORT", "1", "APP", "", ",").unwrap();
		assert_eq!(key, "server_port");
	}

	#[test]
	fn test_slice_environment_filters_by_prefix() {
		let env = [("APP_A", "1"), ("OTHER_B", "2"), ("APP_C", "3")];
		let vars = env[..].vars("APP_").unwrap();
		assert_eq!(
			vars,
			vec![
				("APP_A".to_string(), "1".to_string()),
				("APP_C".to_string(), "3".to_string())
			]
		);
	}
}
