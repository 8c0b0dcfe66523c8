//! Run command handler.

use std::{io::Write, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use chartest::Renderer;
use chartest_assert::{check_contains_all, Options};
use clap::Args;
use tracing::{info, info_span};

use crate::{
	config::{Case, Suite},
	report::{print_summary, CaseReport, Outcome},
};

#[derive(Args)]
pub struct RunArgs {
	/// Path to the suite file
	pub suite: PathBuf,

	/// Only run cases whose name contains this string
	#[arg(long)]
	pub filter: Option<String>,
}

/// Run the run command. Returns whether every case passed.
pub fn run<W: Write>(args: RunArgs, mut writer: W, color: bool) -> Result<bool> {
	let suite = Suite::from_file(&args.suite)?;
	let renderer = match &suite.helm {
		Some(helm) => Renderer::new().with_helm_binary(helm),
		None => Renderer::new(),
	};

	let cases: Vec<&Case> = suite
		.cases
		.iter()
		.filter(|case| {
			args.filter
				.as_deref()
				.map_or(true, |filter| case.name.contains(filter))
		})
		.collect();
	writeln!(writer, "Running {} of {} cases", cases.len(), suite.cases.len())?;

	let mut reports = Vec::with_capacity(cases.len());
	for (index, case) in cases.into_iter().enumerate() {
		let report = run_case(&renderer, &suite, case);
		report.print(&mut writer, index, color)?;
		reports.push(report);
	}

	print_summary(&mut writer, &reports)?;
	writer.flush()?;

	Ok(reports.iter().all(CaseReport::passed))
}

fn run_case(renderer: &Renderer, suite: &Suite, case: &Case) -> CaseReport {
	let _span = info_span!("case", name = %case.name).entered();
	let chart = case.chart(suite).unwrap_or_default().to_owned();
	let start = Instant::now();

	let outcome = match render_and_check(renderer, &chart, case) {
		Ok(Ok(())) => Outcome::Passed,
		Ok(Err(err)) => Outcome::Failed(err),
		Err(err) => Outcome::Error(err),
	};
	let duration = start.elapsed();
	info!(passed = matches!(outcome, Outcome::Passed), ?duration, "case finished");

	CaseReport {
		name: case.name.clone(),
		release: case.release.clone(),
		chart,
		duration,
		outcome,
	}
}

fn render_and_check(
	renderer: &Renderer,
	chart: &str,
	case: &Case,
) -> Result<Result<(), chartest_assert::AssertError>> {
	let expected = std::fs::read_to_string(&case.expected)
		.with_context(|| format!("reading {}", case.expected))?;
	let manifests = renderer
		.render_templates(&case.release, chart, &case.render_options())
		.with_context(|| format!("rendering {chart}"))?;

	let options = Options::from(case.assertions.clone());
	Ok(check_contains_all(&manifests, &expected, &options))
}
