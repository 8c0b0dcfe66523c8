//! Test suite files.
//!
//! ```toml
//! chart = "charts/app"
//!
//! [[case]]
//! name = "default values"
//! release = "foo"
//! expected = "expected/default.yaml"
//!
//! [case.assert]
//! ignore_helm_managed_labels = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chartest::RenderOptions;
use chartest_assert::OptionsConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
	/// Helm executable used for every case
	#[serde(default)]
	pub helm: Option<String>,
	/// Chart used by cases that do not name one
	#[serde(default)]
	pub chart: Option<String>,
	#[serde(default, rename = "case")]
	pub cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
	pub name: String,
	pub release: String,
	#[serde(default)]
	pub chart: Option<String>,
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub api_versions: Vec<String>,
	#[serde(default)]
	pub include_crds: bool,
	#[serde(default)]
	pub set: Vec<String>,
	#[serde(default)]
	pub set_string: Vec<String>,
	/// Values files, in order
	#[serde(default)]
	pub values: Vec<String>,
	/// Multi-document YAML file of objects the render must contain
	pub expected: String,
	#[serde(default, rename = "assert")]
	pub assertions: OptionsConfig,
}

impl Suite {
	pub fn from_file(path: &Path) -> Result<Self> {
		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read suite file: {}", path.display()))?;
		let base = path.parent().unwrap_or_else(|| Path::new("."));
		Self::parse(&contents, base)
			.with_context(|| format!("Failed to parse suite file: {}", path.display()))
	}

	/// Parse a suite, resolving relative paths against `base`.
	pub fn parse(contents: &str, base: &Path) -> Result<Self> {
		let mut suite: Suite = toml::from_str(contents)?;

		// Expand environment variables in path fields
		suite.helm = suite.helm.map(|helm| resolve_command(base, &helm));
		suite.chart = suite.chart.map(|chart| resolve(base, &chart));
		for case in &mut suite.cases {
			case.chart = case.chart.as_deref().map(|chart| resolve(base, chart));
			case.expected = resolve(base, &case.expected);
			for values in &mut case.values {
				*values = resolve(base, values);
			}
		}

		for case in &suite.cases {
			if case.chart.is_none() && suite.chart.is_none() {
				anyhow::bail!("case {:?} has no chart and the suite sets no default", case.name);
			}
		}

		Ok(suite)
	}
}

impl Case {
	/// The chart to render, falling back to the suite default.
	pub fn chart<'a>(&'a self, suite: &'a Suite) -> Option<&'a str> {
		self.chart.as_deref().or(suite.chart.as_deref())
	}

	pub fn render_options(&self) -> RenderOptions {
		RenderOptions {
			namespace: self.namespace.clone(),
			api_versions: self.api_versions.clone(),
			include_crds: self.include_crds,
			value_files: self.values.iter().map(PathBuf::from).collect(),
			set: self.set.clone(),
			set_string: self.set_string.clone(),
			..RenderOptions::default()
		}
	}
}

fn resolve(base: &Path, path: &str) -> String {
	let expanded = expand_env_vars(path);
	let path = Path::new(&expanded);
	if path.is_absolute() {
		expanded
	} else {
		base.join(path).to_string_lossy().into_owned()
	}
}

// Bare command names are looked up in PATH, paths are relative to the suite.
fn resolve_command(base: &Path, command: &str) -> String {
	let expanded = expand_env_vars(command);
	if expanded.contains('/') {
		resolve(base, &expanded)
	} else {
		expanded
	}
}

/// Expand environment variables in a string
/// Supports ${VAR} and $VAR syntax; unset variables expand to nothing.
pub fn expand_env_vars(s: &str) -> String {
	let mut result = String::with_capacity(s.len());
	let mut rest = s;

	while let Some(start) = rest.find('$') {
		result.push_str(&rest[..start]);
		let after = &rest[start + 1..];

		if let Some(braced) = after.strip_prefix('{') {
			if let Some(end) = braced.find('}') {
				result.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
				rest = &braced[end + 1..];
				continue;
			}
		} else {
			let len = after
				.find(|c: char| !(c.is_alphanumeric() || c == '_'))
				.unwrap_or(after.len());
			if after.starts_with(|c: char| c.is_alphabetic() || c == '_') {
				result.push_str(&std::env::var(&after[..len]).unwrap_or_default());
				rest = &after[len..];
				continue;
			}
		}

		result.push('$');
		rest = after;
	}
	result.push_str(rest);

	result
}
