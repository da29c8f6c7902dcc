//! Small helpers for routing on URL paths.

use regex::Regex;
use std::num::ParseIntError;
use std::sync::LazyLock;

static ID_SEGMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"/(\d[^/]*)").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum PathIdError {
	#[error("int ID not found in path: {path}")]
	NotFound { path: String },

	#[error("invalid int ID segment `{segment}`")]
	Invalid {
		segment: String,
		#[source]
		source: ParseIntError,
	},
}

/// Lexically clean a rooted path: collapse repeated slashes, drop `.`,
/// resolve `..` and remove any trailing slash.
fn clean(path: &str) -> String {
	let mut segments: Vec<&str> = Vec::new();
	for segment in path.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			other => segments.push(other),
		}
	}
	format!("/{}", segments.join("/"))
}

/// Split a path into its first segment and the rest.
///
/// The tail always starts with `/` and is `/` when nothing follows the
/// head.
pub fn split_path(path: &str) -> (String, String) {
	let cleaned = clean(&format!("/{path}"));
	let rest = &cleaned[1..];
	match rest.find('/') {
		Some(i) => (rest[..i].to_string(), rest[i..].to_string()),
		None => (rest.to_string(), "/".to_string()),
	}
}

/// Find the first path segment that starts with a digit and parse it as an
/// integer ID, returning the ID and whatever follows that segment.
pub fn parse_int_id(path: &str) -> Result<(i64, String), PathIdError> {
	let cleaned = clean(&format!("/{path}"));
	let Some(caps) = ID_SEGMENT.captures(&cleaned) else {
		return Err(PathIdError::NotFound { path: cleaned });
	};
	let (Some(whole), Some(segment)) = (caps.get(0), caps.get(1)) else {
		return Err(PathIdError::NotFound { path: cleaned });
	};

	let id = segment
		.as_str()
		.parse::<i64>()
		.map_err(|source| PathIdError::Invalid {
			segment: segment.as_str().to_string(),
			source,
		})?;

	Ok((id, cleaned[whole.end()..].to_string()))
}
