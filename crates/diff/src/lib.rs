//! Rendering of objects for humans: YAML with stable key order, unified
//! diffs between two renderings, and terminal colouring of those diffs.

use nu_ansi_term::{Color, Style};
use serde_json::{Map, Value};
use similar::TextDiff;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
	#[error("converting object to YAML")]
	YamlConversion(#[source] serde_saphyr::ser_error::Error),
}

/// Sort object keys recursively so renderings do not depend on input order.
pub fn sort_json_keys(value: &Value) -> Value {
	match value {
		Value::Object(map) => {
			let mut entries: Vec<(&String, &Value)> = map.iter().collect();
			entries.sort_by(|(a, _), (b, _)| a.cmp(b));
			Value::Object(
				entries
					.into_iter()
					.map(|(k, v)| (k.clone(), sort_json_keys(v)))
					.collect::<Map<_, _>>(),
			)
		}
		Value::Array(items) => Value::Array(items.iter().map(sort_json_keys).collect()),
		other => other.clone(),
	}
}

/// Serialize a value to block-style YAML with sorted keys.
pub fn to_yaml(value: &Value) -> Result<String, DiffError> {
	let sorted = sort_json_keys(value);

	let options = serde_saphyr::SerializerOptions {
		indent_step: 2,
		indent_array: Some(0),
		prefer_block_scalars: true,
		empty_map_as_braces: true,
		empty_array_as_brackets: true,
		quote_ambiguous_keys: true,
		quote_numeric_strings: true,
		..Default::default()
	};

	let mut output = String::new();
	serde_saphyr::to_fmt_writer_with_options(&mut output, &sorted, options)
		.map_err(DiffError::YamlConversion)?;
	Ok(output)
}

/// Unified diff (3 lines of context) from `old` to `new`, or `None` when the
/// texts are identical.
pub fn unified_diff(old_label: &str, old: &str, new_label: &str, new: &str) -> Option<String> {
	if old == new {
		return None;
	}
	Some(
		TextDiff::from_lines(old, new)
			.unified_diff()
			.context_radius(3)
			.header(old_label, new_label)
			.to_string(),
	)
}

/// Render both values as YAML and diff them.
pub fn diff_values(
	old_label: &str,
	old: &Value,
	new_label: &str,
	new: &Value,
) -> Result<Option<String>, DiffError> {
	Ok(unified_diff(
		old_label,
		&to_yaml(old)?,
		new_label,
		&to_yaml(new)?,
	))
}

/// Colour a unified diff for terminal output.
pub fn colorize(diff: &str) -> String {
	let mut out = String::with_capacity(diff.len());
	for line in diff.split_inclusive('\n') {
		let style = if line.starts_with("+++") || line.starts_with("---") {
			Style::new().bold()
		} else if line.starts_with("@@") {
			Color::Cyan.normal()
		} else if line.starts_with('+') {
			Color::Green.normal()
		} else if line.starts_with('-') {
			Color::Red.normal()
		} else {
			out.push_str(line);
			continue;
		};
		let (text, newline) = match line.strip_suffix('\n') {
			Some(text) => (text, "\n"),
			None => (line, ""),
		};
		out.push_str(&style.paint(text).to_string());
		out.push_str(newline);
	}
	out
}
