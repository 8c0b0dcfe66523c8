//! Render command handler.

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use super::RenderArgs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// One object key per line
	#[default]
	Keys,
	/// Every object as YAML, sorted by key
	Yaml,
}

#[derive(Args)]
pub struct RenderCmdArgs {
	/// Release name
	pub release: String,

	/// Chart directory or archive
	pub chart: String,

	#[command(flatten)]
	pub render: RenderArgs,

	/// Output format
	#[arg(short = 'o', long, value_enum, default_value_t)]
	pub output: OutputFormat,
}

/// Run the render command.
pub fn run<W: Write>(args: RenderCmdArgs, mut writer: W) -> Result<()> {
	let manifests = args
		.render
		.renderer()
		.render_templates(&args.release, &args.chart, &args.render.options())
		.with_context(|| format!("rendering {}", args.chart))?;
	info!(objects = manifests.len(), "rendered");

	let mut keys = manifests.keys();
	keys.sort_by_cached_key(ToString::to_string);

	for key in keys {
		match args.output {
			OutputFormat::Keys => writeln!(writer, "{key}")?,
			OutputFormat::Yaml => {
				let Some(object) = manifests.load(&key) else {
					continue;
				};
				let yaml = chartest_diff::to_yaml(&object.into_value())
					.with_context(|| format!("rendering {key} as YAML"))?;
				write!(writer, "---\n{yaml}")?;
			}
		}
	}
	writer.flush()?;

	Ok(())
}
