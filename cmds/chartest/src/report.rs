use std::{error::Error as _, io::Write, time::Duration};

use anyhow::Result;
use chartest_assert::AssertError;
use colored::Colorize;

#[derive(Debug)]
pub enum Outcome {
	Passed,
	/// Rendered, but the expected objects were not all found.
	Failed(AssertError),
	/// Could not render or load the case.
	Error(anyhow::Error),
}

#[derive(Debug)]
pub struct CaseReport {
	pub name: String,
	pub release: String,
	pub chart: String,
	pub duration: Duration,
	pub outcome: Outcome,
}

impl CaseReport {
	pub fn passed(&self) -> bool {
		matches!(self.outcome, Outcome::Passed)
	}

	pub fn print<W: Write>(&self, writer: &mut W, index: usize, color: bool) -> Result<()> {
		writeln!(writer, "\n{}", format!("=== Case {}: {} ===", index + 1, self.name).bold())?;
		writeln!(
			writer,
			"Render: {} {} ({}ms)",
			self.release.cyan(),
			self.chart.cyan(),
			self.duration.as_millis()
		)?;

		match &self.outcome {
			Outcome::Passed => writeln!(writer, "Result: {}", "✓ PASSED".green())?,
			Outcome::Failed(err) => {
				writeln!(writer, "Result: {}", "✗ FAILED".red())?;
				write_failure(writer, err, color)?;
			}
			Outcome::Error(err) => {
				writeln!(writer, "Result: {}", "✗ ERROR".red())?;
				writeln!(writer, "{}", format!("{err:#}").yellow())?;
			}
		}
		Ok(())
	}
}

/// Print an assertion failure, colouring diffs when asked to.
pub fn write_failure<W: Write>(writer: &mut W, err: &AssertError, color: bool) -> Result<()> {
	match err {
		AssertError::Several { total, failures } => {
			writeln!(writer, "{} of {} expected objects failed", failures.len(), total)?;
			for failure in failures {
				write_failure(writer, failure, color)?;
			}
		}
		AssertError::Mismatch { key, diff } => {
			writeln!(writer, "{} mismatch (-want +got):", key.to_string().bold())?;
			if color {
				write!(writer, "{}", chartest_diff::colorize(diff))?;
			} else {
				write!(writer, "{diff}")?;
			}
		}
		other => {
			let mut message = other.to_string();
			let mut source = other.source();
			while let Some(cause) = source {
				message.push_str(&format!(": {cause}"));
				source = cause.source();
			}
			writeln!(writer, "{}", message.yellow())?;
		}
	}
	Ok(())
}

pub fn print_summary<W: Write>(writer: &mut W, reports: &[CaseReport]) -> Result<()> {
	writeln!(writer, "\n{}", "=== SUMMARY ===".bold())?;

	let total = reports.len();
	let passed = reports.iter().filter(|r| r.passed()).count();
	let errored = reports
		.iter()
		.filter(|r| matches!(r.outcome, Outcome::Error(_)))
		.count();

	writeln!(writer, "Total cases: {total}")?;
	writeln!(writer, "Passed: {passed}/{total}")?;
	if errored > 0 {
		writeln!(writer, "Errors: {errored}")?;
	}

	if passed == total {
		writeln!(writer, "\n{}", "✓ All cases passed!".green().bold())?;
	} else {
		writeln!(writer, "\n{}", "✗ Some cases failed!".red().bold())?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn report(outcome: Outcome) -> CaseReport {
		CaseReport {
			name: "defaults".into(),
			release: "foo".into(),
			chart: "charts/app".into(),
			duration: Duration::from_millis(12),
			outcome,
		}
	}

	fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
		colored::control::set_override(false);
		let mut out = Vec::new();
		f(&mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn test_print_passed() {
		let out = render(|w| report(Outcome::Passed).print(w, 0, false));
		assert!(out.contains("=== Case 1: defaults ==="), "{out}");
		assert!(out.contains("Render: foo charts/app (12ms)"), "{out}");
		assert!(out.contains("✓ PASSED"), "{out}");
	}

	#[test]
	fn test_print_not_found() {
		let failure = AssertError::NotFound {
			searched: vec!["service/web".into(), "service/foo-web".into()],
		};
		let out = render(|w| report(Outcome::Failed(failure)).print(w, 1, false));
		assert!(out.contains("✗ FAILED"), "{out}");
		assert!(out.contains("searched: service/web, service/foo-web"), "{out}");
	}

	#[test]
	fn test_summary_counts() {
		let reports = [
			report(Outcome::Passed),
			report(Outcome::Error(anyhow::anyhow!("helm exploded"))),
		];
		let out = render(|w| print_summary(w, &reports));
		assert!(out.contains("Passed: 1/2"), "{out}");
		assert!(out.contains("Errors: 1"), "{out}");
		assert!(out.contains("Some cases failed"), "{out}");
	}
}
