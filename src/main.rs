use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use layerconf::ConfigBuilder;
use layerconf::sources::parser_for_path;

#[derive(Parser)]
#[command(name = "layerconf")]
#[command(
	author,
	version,
	about = "Merge TOML, JSON and environment configuration and inspect the result"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Config file to load (.toml or .json); repeat to layer several, later files win
	#[arg(short, long = "file", value_name = "PATH", global = true)]
	files: Vec<PathBuf>,

	/// Load environment variables named PREFIX<key-delimiter>..., applied after all files
	#[arg(long, value_name = "PREFIX", global = true)]
	env_prefix: Option<String>,

	/// Separator between environment variable name segments
	#[arg(long, default_value = "_", global = true)]
	key_delimiter: String,

	/// Separator for list values in environment variables (empty disables splitting)
	#[arg(long, default_value = ",", global = true)]
	value_delimiter: String,

	/// Enable verbose logging (sets log level to DEBUG)
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the merged configuration as JSON
	Show,
	/// Load every source and report the first error, if any
	Check,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	let builder = build(&cli)?;

	match cli.command {
		Commands::Show => handle_show(builder),
		Commands::Check => handle_check(builder),
	}
}

fn init_logging(verbose: bool) {
	// RUST_LOG takes precedence; otherwise --verbose selects DEBUG over WARN.
	let level = if verbose { Level::DEBUG } else { Level::WARN };
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
	let _ = tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(filter)
		.try_init();
}

fn build(cli: &Cli) -> Result<ConfigBuilder> {
	let mut builder = ConfigBuilder::new();

	for path in &cli.files {
		let parser = parser_for_path(path).with_context(|| {
			format!(
				"Cannot infer config format for {} (expected .toml or .json)",
				path.display()
			)
		})?;
		builder = builder.load_file(path, parser);
	}

	if let Some(ref prefix) = cli.env_prefix {
		builder = builder.load_env(prefix, &cli.key_delimiter, &cli.value_delimiter);
	}

	Ok(builder)
}

fn handle_show(builder: ConfigBuilder) -> Result<ExitCode> {
	let table = builder
		.finalize_table()
		.context("Failed to assemble configuration")?;
	let rendered =
		serde_json::to_string_pretty(&table).context("Failed to render configuration")?;
	println!("{}", rendered);
	Ok(ExitCode::SUCCESS)
}

fn handle_check(builder: ConfigBuilder) -> Result<ExitCode> {
	let loads = builder.loads();
	match builder.finalize_table() {
		Ok(table) => {
			println!(
				"configuration OK ({} sources, {} top-level keys)",
				loads,
				table.len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("error: {:#}", anyhow::Error::new(e));
			Ok(ExitCode::FAILURE)
		}
	}
}
