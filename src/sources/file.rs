use crate::error::{ConfigError, Result};
use crate::sources::parser::Parser;
use crate::store::Table;
use std::path::Path;

/// Read and parse a config file.
///
/// The path must name a regular file (symlinks are followed). Stat failures
/// are reported as `NotAFile` carrying the underlying I/O error.
pub fn read_table(path: &Path, parser: &dyn Parser) -> Result<Table> {
	if path.as_os_str().is_empty() {
		return Err(ConfigError::EmptyFilename);
	}

	let metadata = std::fs::metadata(path).map_err(|source| ConfigError::NotAFile {
		path: path.to_path_buf(),
		source: Some(source),
	})?;

	if !metadata.is_file() {
		return Err(ConfigError::NotAFile {
			path: path.to_path_buf(),
			source: None,
		});
	}

	let bytes = std::fs::read(path).map_err(|source| ConfigError::ReadFailure {
		path: path.to_path_buf(),
		source,
	})?;

	parser
		.parse(&bytes)
		.map_err(|source| ConfigError::ParseFailure {
			path: path.to_path_buf(),
			format: parser.name(),
			source,
		})
}
