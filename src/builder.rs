//! Fluent builder that layers config sources and destructures the result.

use crate::error::{ConfigError, Result};
use crate::sources::env::{Environment, ProcessEnv, transform_env_entry};
use crate::sources::file::read_table;
use crate::sources::parser::{Json, Parser, Toml};
use crate::store::{Store, Table};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Loaded {
	store: Store,
	loads: usize,
}

/// Layers configuration sources in call order, later sources overriding
/// earlier ones key by key.
///
/// Load errors do not interrupt the chain. The first one is kept, every
/// later `load_*` call becomes a no-op, and the error is returned by
/// [`finalize`](Self::finalize). Finalizing consumes the builder.
///
/// The builder does no internal locking; it is meant to be assembled on one
/// thread during startup.
///
/// ```no_run
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// struct Server {
///     port: u16,
///     hosts: Vec<String>,
/// }
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// struct AppConfig {
///     server: Server,
/// }
///
/// let config: AppConfig = layerconf::ConfigBuilder::new()
///     .load_toml("/etc/app/config.toml")
///     .load_json("config.local.json")
///     .load_env("APP", "_", ",")
///     .finalize()?;
/// # Ok::<(), layerconf::ConfigError>(())
/// ```
#[must_use]
#[derive(Debug)]
pub struct ConfigBuilder {
	state: std::result::Result<Loaded, ConfigError>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			state: Ok(Loaded::default()),
		}
	}

	/// Load a TOML file.
	pub fn load_toml(self, path: impl AsRef<Path>) -> Self {
		self.load_file(path, &Toml)
	}

	/// Load a JSON file.
	pub fn load_json(self, path: impl AsRef<Path>) -> Self {
		self.load_file(path, &Json)
	}

	/// Load a file with an explicit parser.
	pub fn load_file(self, path: impl AsRef<Path>, parser: &dyn Parser) -> Self {
		let path = path.as_ref();
		self.apply(format!("{}:{}", parser.name(), path.display()), |store| {
			let table = read_table(path, parser)?;
			debug!(path = %path.display(), format = parser.name(), keys = table.len(), "loaded config file");
			store.merge(table);
			Ok(())
		})
	}

	/// Load variables from the process environment named
	/// `prefix + key_delimiter + ...`.
	///
	/// See [`transform_env_entry`] for how names and values are mapped.
	pub fn load_env(self, prefix: &str, key_delimiter: &str, value_delimiter: &str) -> Self {
		self.load_env_from(&ProcessEnv, prefix, key_delimiter, value_delimiter)
	}

	/// Like [`load_env`](Self::load_env) but reads from `env`.
	pub fn load_env_from<E: Environment + ?Sized>(
		self,
		env: &E,
		prefix: &str,
		key_delimiter: &str,
		value_delimiter: &str,
	) -> Self {
		self.apply(format!("env:{prefix}"), |store| {
			let mut vars = env
				.vars(&format!("{prefix}{key_delimiter}"))
				.map_err(|source| ConfigError::EnvEnumeration {
					prefix: prefix.to_string(),
					source,
				})?;
			// Enumeration order is platform dependent; colliding keys must resolve the same way.
			vars.sort();

			let mut count = 0;
			for (name, value) in &vars {
				if let Some((key, value)) =
					transform_env_entry(name, value, prefix, key_delimiter, value_delimiter)
				{
					store.set(&key, value);
					count += 1;
				}
			}
			debug!(prefix, count, "loaded environment variables");
			Ok(())
		})
	}

	/// Number of sources loaded successfully so far.
	pub fn loads(&self) -> usize {
		match &self.state {
			Ok(loaded) => loaded.loads,
			Err(_) => 0,
		}
	}

	/// The deferred error, if any source failed.
	pub fn error(&self) -> Option<&ConfigError> {
		self.state.as_ref().err()
	}

	/// Return the merged tree without destructuring it.
	///
	/// Fails with the first load error, or `NoLoaderUsed` when no source was
	/// loaded successfully.
	pub fn finalize_table(self) -> Result<Table> {
		Ok(self.into_store()?.into_table())
	}

	/// Destructure the merged tree into `T`.
	///
	/// Fails with the first load error, `NoLoaderUsed` when no source was
	/// loaded successfully, or the first conversion error found while
	/// destructuring.
	pub fn finalize<T: DeserializeOwned>(self) -> Result<T> {
		self.into_store()?.unmarshal()
	}

	fn into_store(self) -> Result<Store> {
		let loaded = self.state?;
		if loaded.loads == 0 {
			return Err(ConfigError::NoLoaderUsed);
		}
		debug!(loads = loaded.loads, "finalizing configuration");
		Ok(loaded.store)
	}

	fn apply<F>(self, source: String, load: F) -> Self
	where
		F: FnOnce(&mut Store) -> Result<()>,
	{
		let mut loaded = match self.state {
			Ok(loaded) => loaded,
			Err(err) => {
				debug!(%source, "skipping config source after earlier failure");
				return Self { state: Err(err) };
			}
		};

		match load(&mut loaded.store) {
			Ok(()) => {
				loaded.loads += 1;
				Self { state: Ok(loaded) }
			}
			Err(err) => {
				warn!(%source, error = %err, "config source failed, error deferred to finalize");
				Self { state: Err(err) }
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::Value;
	use serde::Deserialize;

	#[derive(Debug, Default, Deserialize, PartialEq)]
	#[serde(default)]
	struct Cfg {
		name: String,
		ports: Vec<u16>,
	}

	#[test]
	fn test_no_loads_is_an_error() {
		let result = ConfigBuilder::new().finalize::<Cfg>();
		assert!(matches!(result, Err(ConfigError::NoLoaderUsed)));
	}

	#[test]
	fn test_first_error_wins() {
		let builder = ConfigBuilder::new()
			.load_toml("")
			.load_json("/definitely/not/here.json");

		assert!(matches!(builder.error(), Some(ConfigError::EmptyFilename)));
		let result = builder.finalize::<Cfg>();
		assert!(matches!(result, Err(ConfigError::EmptyFilename)));
	}

	#[test]
	fn test_loads_after_failure_are_skipped() {
		let env = [("APP_NAME", "svc")];
		let builder = ConfigBuilder::new()
			.load_env_from(&env[..], "APP", "_", ",")
			.load_toml("")
			.load_env_from(&env[..], "APP", "_", ",");

		assert_eq!(builder.loads(), 0);
		assert!(builder.error().is_some());
	}

	#[test]
	fn test_env_without_matches_counts_as_load() {
		let env: [(&str, &str); 0] = [];
		let builder = ConfigBuilder::new().load_env_from(&env[..], "APP", "_", ",");
		assert_eq!(builder.loads(), 1);

		let cfg: Cfg = builder.finalize().unwrap();
		assert_eq!(cfg, Cfg::default());
	}

	#[test]
	fn test_env_values_destructure() {
		let env = [("APP_NAME", "svc"), ("APP_PORTS", "80,443")];
		let cfg: Cfg = ConfigBuilder::new()
			.load_env_from(&env[..], "APP", "_", ",")
			.finalize()
			.unwrap();

		assert_eq!(
			cfg,
			Cfg {
				name: "svc".to_string(),
				ports: vec![80, 443],
			}
		);
	}

	#[test]
	fn test_later_env_overrides_earlier() {
		let first = [("A_NAME", "one")];
		let second = [("B_NAME", "two")];
		let table = ConfigBuilder::new()
			.load_env_from(&first[..], "A", "_", "")
			.load_env_from(&second[..], "B", "_", "")
			.finalize_table()
			.unwrap();

		assert_eq!(table["name"], Value::from("two"));
	}

	#[test]
	fn test_colliding_env_keys_resolve_by_name_order() {
		let env = [("APP_Name", "lower"), ("APP_NAME", "upper")];
		let table = ConfigBuilder::new()
			.load_env_from(&env[..], "APP", "_", "")
			.finalize_table()
			.unwrap();

		// "APP_NAME" sorts before "APP_Name", so the latter is applied last
		assert_eq!(table["name"], Value::from("lower"));
	}
}
