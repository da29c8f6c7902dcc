use crate::sources::env::EnvError;
use crate::sources::parser::ParseError;
use std::path::PathBuf;

/// Library-level structured errors for layerconf.
///
/// Load failures are recorded by the builder and surfaced by `finalize`;
/// destructuring failures are produced by `finalize` itself.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("empty file name")]
	EmptyFilename,

	#[error("not a regular file: {path}")]
	NotAFile {
		path: PathBuf,
		#[source]
		source: Option<std::io::Error>,
	},

	#[error("failed to read config file: {path}")]
	ReadFailure {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {format} config file: {path}")]
	ParseFailure {
		path: PathBuf,
		format: &'static str,
		#[source]
		source: ParseError,
	},

	#[error("failed to read environment variables with prefix {prefix:?}")]
	EnvEnumeration {
		prefix: String,
		#[source]
		source: EnvError,
	},

	#[error("no loaders used")]
	NoLoaderUsed,

	#[error("type mismatch at `{path}`: expected {expected}, found {found}")]
	TypeMismatch {
		path: String,
		expected: String,
		found: String,
	},

	#[error("invalid config at `{path}`: {message}")]
	Destructure { path: String, message: String },
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
