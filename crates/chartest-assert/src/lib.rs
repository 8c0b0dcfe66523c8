//! Assertions on rendered Helm manifests.
//!
//! [`check_contains`] looks an expected object up in [`Manifests`] and
//! compares the two; on a mismatch the error carries a unified diff of both
//! objects rendered as YAML. [`contains`] is the panicking form meant for
//! `#[test]` functions.
//!
//! ```no_run
//! use chartest::{k8s_openapi::api::core::v1::ServiceAccount, RenderOptions, Renderer};
//! use chartest::k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
//! use chartest_assert::{contains, Options};
//!
//! let manifests = Renderer::new()
//! 	.render_templates("foo", "testdata/test-chart", &RenderOptions::default())
//! 	.unwrap();
//!
//! contains(
//! 	&manifests,
//! 	&ServiceAccount {
//! 		metadata: ObjectMeta {
//! 			name: Some("foo-test-chart".into()),
//! 			..Default::default()
//! 		},
//! 		..Default::default()
//! 	},
//! 	&Options::new().ignore_helm_managed_labels(),
//! );
//! ```

use chartest::{split::decode_manifest, Manifests, Object, ObjectKey, Scheme};
use chartest_diff::DiffError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

mod normalize;
mod omit;
mod options;

pub use omit::HELM_MANAGED_LABELS;
pub use options::{Options, OptionsConfig};

#[derive(Debug, Error)]
pub enum AssertError {
	#[error("failed to convert object")]
	Convert(#[source] chartest::Error),

	#[error("object was not found, searched: {}", .searched.join(", "))]
	NotFound { searched: Vec<String> },

	#[error("failed to transform {key}")]
	Transform {
		key: ObjectKey,
		#[source]
		source: chartest::Error,
	},

	#[error("rendering diff of {key}")]
	Diff {
		key: ObjectKey,
		#[source]
		source: DiffError,
	},

	#[error("{key} mismatch (-want +got):\n{diff}")]
	Mismatch { key: ObjectKey, diff: String },

	#[error("{} of {total} expected objects failed:\n{}", .failures.len(), join_failures(.failures))]
	Several {
		total: usize,
		failures: Vec<AssertError>,
	},
}

fn join_failures(failures: &[AssertError]) -> String {
	failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("\n")
}

/// Check that `manifests` contain `expected`.
///
/// `expected` may be a typed resource or an [`Object`]; missing
/// `apiVersion`/`kind` are taken from the manifests' scheme.
pub fn check_contains<T: Serialize + 'static>(
	manifests: &Manifests,
	expected: &T,
	options: &Options,
) -> Result<(), AssertError> {
	let scheme = manifests.scheme();
	let object = scheme
		.to_object(expected)
		.and_then(|object| scheme.decode(object.into_value()))
		.map_err(AssertError::Convert)?;
	check_object(manifests, object, options)
}

/// Check that `manifests` contain the object described by one raw YAML or
/// JSON manifest.
pub fn check_contains_raw_manifest(
	manifests: &Manifests,
	manifest: &str,
	options: &Options,
) -> Result<(), AssertError> {
	let object = decode_manifest(manifests.scheme(), manifest).map_err(AssertError::Convert)?;
	check_object(manifests, object, options)
}

/// Check every document of a multi-document YAML stream, collecting all
/// failures.
pub fn check_contains_all(
	manifests: &Manifests,
	stream: &str,
	options: &Options,
) -> Result<(), AssertError> {
	let documents = chartest::split::split_manifests(stream).map_err(AssertError::Convert)?;
	let total = documents.len();

	let mut failures: Vec<AssertError> = documents
		.into_iter()
		.filter_map(|document| {
			manifests
				.scheme()
				.decode(document)
				.map_err(AssertError::Convert)
				.and_then(|object| check_object(manifests, object, options))
				.err()
		})
		.collect();

	if failures.is_empty() {
		return Ok(());
	}
	if total == 1 {
		if let Some(failure) = failures.pop() {
			return Err(failure);
		}
	}
	Err(AssertError::Several { total, failures })
}

/// Panicking form of [`check_contains`].
#[track_caller]
pub fn contains<T: Serialize + 'static>(manifests: &Manifests, expected: &T, options: &Options) -> bool {
	if let Err(e) = check_contains(manifests, expected, options) {
		panic!("{e}");
	}
	true
}

/// Panicking form of [`check_contains_raw_manifest`].
#[track_caller]
pub fn contains_raw_manifest(manifests: &Manifests, manifest: &str, options: &Options) -> bool {
	if let Err(e) = check_contains_raw_manifest(manifests, manifest, options) {
		panic!("{e}");
	}
	true
}

#[instrument(skip_all, fields(kind = expected.kind(), name = expected.name()))]
fn check_object(manifests: &Manifests, expected: Object, options: &Options) -> Result<(), AssertError> {
	let key = ObjectKey::from_object(&expected).map_err(AssertError::Convert)?;
	let (key, actual) = search(manifests, key, options)?;
	let scheme: &Scheme = manifests.scheme();

	let mut want = expected;
	let mut got = actual;
	for object in [&mut want, &mut got] {
		override_meta(object, &key);
		if options.omits_metadata() {
			omit::omit_metadata(object, options);
		}
		for transform in &options.transformers {
			transform(&mut *object, scheme).map_err(|source| AssertError::Transform {
				key: key.clone(),
				source,
			})?;
		}
	}

	let mut want = want.into_value();
	let mut got = got.into_value();
	normalize::normalize(&mut want, options);
	normalize::normalize(&mut got, options);

	if want == got {
		return Ok(());
	}
	let diff = chartest_diff::diff_values("want", &want, "got", &got)
		.map_err(|source| AssertError::Diff {
			key: key.clone(),
			source,
		})?
		// Values differing only in ways YAML does not show, e.g. 1 vs 1.0
		.unwrap_or_else(|| format!("-{want}\n+{got}\n"));
	Err(AssertError::Mismatch { key, diff })
}

/// Look `key` up, then every additional key derived from it.
fn search(
	manifests: &Manifests,
	key: ObjectKey,
	options: &Options,
) -> Result<(ObjectKey, Object), AssertError> {
	if let Some(object) = manifests.load(&key) {
		return Ok((key, object));
	}

	let mut searched = vec![key.to_string()];
	for additional in &options.additional_keys {
		let candidate = additional(&key);
		if let Some(object) = manifests.load(&candidate) {
			debug!(original = %key, found = %candidate, "found under additional key");
			return Ok((candidate, object));
		}
		searched.push(candidate.to_string());
	}

	Err(AssertError::NotFound { searched })
}

/// Make type and identity follow the key the object was found under.
fn override_meta(object: &mut Object, key: &ObjectKey) {
	object.set_gvk(&key.gvk());
	object.set_namespace(key.namespace());
	object.set_name(key.name());
}
