//! Check command handler.

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use chartest_assert::{check_contains_all, Options, OptionsConfig};
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::{AssertArgs, RenderArgs};
use crate::report::write_failure;

#[derive(Args)]
pub struct CheckArgs {
	/// Release name
	pub release: String,

	/// Chart directory or archive
	pub chart: String,

	/// YAML file with the objects the render must contain
	#[arg(short = 'e', long)]
	pub expected: PathBuf,

	#[command(flatten)]
	pub render: RenderArgs,

	#[command(flatten)]
	pub assert: AssertArgs,
}

/// Run the check command. Returns whether every expected object matched.
pub fn run<W: Write>(args: CheckArgs, mut writer: W, color: bool) -> Result<bool> {
	let expected = std::fs::read_to_string(&args.expected)
		.with_context(|| format!("reading {}", args.expected.display()))?;
	let manifests = args
		.render
		.renderer()
		.render_templates(&args.release, &args.chart, &args.render.options())
		.with_context(|| format!("rendering {}", args.chart))?;
	info!(objects = manifests.len(), "rendered");

	let options = Options::from(OptionsConfig::from(&args.assert));
	let passed = match check_contains_all(&manifests, &expected, &options) {
		Ok(()) => {
			writeln!(writer, "{}", "✓ All expected objects found".green())?;
			true
		}
		Err(err) => {
			write_failure(&mut writer, &err, color)?;
			false
		}
	};
	writer.flush()?;

	Ok(passed)
}
