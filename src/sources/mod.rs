//! Configuration sources.
//!
//! This module handles:
//! - TOML and JSON parsing behind the `Parser` trait
//! - Regular-file checks and reads
//! - Environment enumeration and key/value mapping

pub mod env;
pub mod file;
pub mod parser;

pub use env::{EnvError, Environment, ProcessEnv, transform_env_entry};
pub use file::read_table;
pub use parser::{Json, ParseError, Parser, Toml, parser_for_path};
