//! Splitting multi-document manifest streams.

use serde_json::Value;
use tracing::trace;

use crate::{
	error::{Error, Result},
	object::Object,
	scheme::Scheme,
};

/// Parse a YAML multi-document stream, or a stream of concatenated JSON
/// objects, into one value per document.
///
/// Empty and `null` documents (Helm emits comment-only documents for
/// templates that render nothing) are skipped.
pub fn split_manifests(data: &str) -> Result<Vec<Value>> {
	let documents: Vec<Value> = if data.trim_start().starts_with('{') {
		serde_json::Deserializer::from_str(data)
			.into_iter::<Value>()
			.collect::<Result<Vec<Value>, _>>()
			.map_err(Error::ParseJson)?
	} else {
		let options = serde_saphyr::Options {
			// Helm renders YAML 1.1
			legacy_octal_numbers: true,
			budget: None,
			..Default::default()
		};
		serde_saphyr::from_multiple_with_options(data, options)
			.map_err(|e| Error::ParseYaml(e.to_string()))?
	};

	let total = documents.len();
	let documents: Vec<Value> = documents.into_iter().filter(|v| !v.is_null()).collect();
	trace!(total, kept = documents.len(), "split manifests");
	Ok(documents)
}

/// Split a YAML stream into the raw text of its documents.
///
/// A separator is a line starting with `---` followed only by whitespace.
/// Documents are trimmed; blank documents are dropped.
pub fn split_yaml_documents(data: &str) -> Vec<String> {
	let mut documents = Vec::new();
	let mut current = String::new();

	for line in data.split_inclusive('\n') {
		if is_separator(line) {
			push_document(&mut documents, &mut current);
		} else {
			current.push_str(line);
		}
	}
	push_document(&mut documents, &mut current);

	documents
}

fn is_separator(line: &str) -> bool {
	line.strip_prefix("---")
		.is_some_and(|rest| rest.trim().is_empty())
}

fn push_document(documents: &mut Vec<String>, current: &mut String) {
	let document = current.trim();
	if !document.is_empty() {
		documents.push(document.to_owned());
	}
	current.clear();
}

/// Decode a single raw manifest (YAML or JSON) through the scheme.
pub fn decode_manifest(scheme: &Scheme, data: &str) -> Result<Object> {
	let mut documents = split_manifests(data)?;
	match documents.len() {
		1 => scheme.decode(documents.remove(0)),
		n => Err(Error::DocumentCount(n)),
	}
}
