//! layerconf - layered configuration assembly.
//!
//! This library provides:
//! - A fluent builder that merges TOML files, JSON files and environment
//!   variables, later sources overriding earlier ones
//! - Deferred error reporting: the first failing source is reported when
//!   the builder is finalized
//! - Destructuring of the merged tree into any `serde::Deserialize` type
//! - URL path helpers for simple routers
//!
//! # Example
//!
//! ```no_run
//! use layerconf::ConfigBuilder;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct Database {
//!     url: String,
//!     pool_size: u32,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct Config {
//!     database: Database,
//! }
//!
//! // MYAPP_DATABASE_URL=postgres://... overrides the file value
//! let config: Config = ConfigBuilder::new()
//!     .load_toml("config.toml")
//!     .load_env("MYAPP", "_", ",")
//!     .finalize()
//!     .unwrap();
//!
//! println!("{}", config.database.url);
//! ```

pub mod builder;
pub mod error;
pub mod sources;
pub mod store;
pub mod urlpath;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, Result};
pub use store::{KeyPath, Store, Table, Value};
