use std::{any::type_name, fmt, sync::Arc};

use chartest::{Object, ObjectKey, Scheme};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{trace, warn};

pub(crate) type Transformer =
	Arc<dyn Fn(&mut Object, &Scheme) -> chartest::Result<()> + Send + Sync>;
pub(crate) type KeyFn = Arc<dyn Fn(&ObjectKey) -> ObjectKey + Send + Sync>;

/// Controls how an expected object is looked up and compared.
///
/// ```
/// use chartest_assert::Options;
///
/// let options = Options::new()
/// 	.ignore_helm_managed_labels()
/// 	.additional_key(|key| key.clone().with_name(key.name().trim_start_matches("foo-")));
/// ```
#[derive(Clone, Default)]
pub struct Options {
	pub(crate) ignore_helm_managed_labels: bool,
	pub(crate) ignore_labels: Vec<String>,
	pub(crate) ignore_annotations: Vec<String>,
	pub(crate) transformers: Vec<Transformer>,
	pub(crate) additional_keys: Vec<KeyFn>,
	pub(crate) sort_lists_by_name: bool,
	pub(crate) equate_empty: bool,
	pub(crate) ignore_fields: Vec<String>,
}

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	/// Ignore the labels Helm charts conventionally set:
	/// `app.kubernetes.io/{name,managed-by,instance,version,component,part-of}`
	/// and `helm.sh/chart`.
	///
	/// See <https://helm.sh/docs/chart_best_practices/labels/>.
	pub fn ignore_helm_managed_labels(mut self) -> Self {
		self.ignore_helm_managed_labels = true;
		self
	}

	/// Ignore these label keys whatever their values. Replaces keys given by
	/// an earlier call.
	pub fn ignore_label_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.ignore_labels = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Ignore these annotation keys whatever their values. Replaces keys
	/// given by an earlier call.
	pub fn ignore_annotation_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.ignore_annotations = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Edit both objects right before they are compared, e.g. to drop a field.
	pub fn transformer<F>(mut self, f: F) -> Self
	where
		F: Fn(&mut Object) + Send + Sync + 'static,
	{
		self.transformers.push(Arc::new(move |object, _| {
			f(object);
			Ok(())
		}));
		self
	}

	/// Like [`Options::transformer`], but on the typed form of the object.
	/// Objects of kinds not registered for `T` are left alone.
	///
	/// ```
	/// use chartest::k8s_openapi::api::apps::v1::Deployment;
	/// use chartest_assert::Options;
	///
	/// let options = Options::new().transform_as(|deploy: &mut Deployment| {
	/// 	if let Some(spec) = &mut deploy.spec {
	/// 		spec.replicas = None;
	/// 	}
	/// });
	/// ```
	pub fn transform_as<T, F>(mut self, f: F) -> Self
	where
		T: Serialize + DeserializeOwned + 'static,
		F: Fn(&mut T) + Send + Sync + 'static,
	{
		self.transformers.push(Arc::new(move |object, scheme| {
			let Some(gvk) = object.gvk() else {
				return Ok(());
			};
			let Ok(kinds) = scheme.kinds_of::<T>() else {
				trace!(type_name = type_name::<T>(), "not registered, transformer skipped");
				return Ok(());
			};
			if !kinds.contains(&gvk) {
				return Ok(());
			}

			let mut typed: T = object.to_resource()?;
			f(&mut typed);
			let mut transformed = Object::from_resource(&typed)?;
			transformed.set_gvk(&gvk);
			*object = transformed;
			Ok(())
		}));
		self
	}

	/// Key to try when the object is not found under its own key. The
	/// function receives the object's own key; keys are tried in the order
	/// they were added and the first hit wins.
	pub fn additional_key<F>(mut self, f: F) -> Self
	where
		F: Fn(&ObjectKey) -> ObjectKey + Send + Sync + 'static,
	{
		self.additional_keys.push(Arc::new(f));
		self
	}

	/// Sort lists of named objects (containers, volumes, ports...) by name
	/// before comparing.
	pub fn sort_lists_by_name(mut self) -> Self {
		self.sort_lists_by_name = true;
		self
	}

	/// Treat `null`, `{}` and `[]` the same as an absent field.
	pub fn equate_empty(mut self) -> Self {
		self.equate_empty = true;
		self
	}

	/// Remove these fields, as JSON pointers (`/spec/replicas`), from both
	/// objects. Accumulates. Pointers not starting with `/` are skipped with a
	/// warning.
	pub fn ignore_fields<I, S>(mut self, pointers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.ignore_fields.extend(
			pointers
				.into_iter()
				.map(Into::into)
				.filter(|pointer: &String| {
					let valid = pointer.starts_with('/');
					if !valid {
						warn!(%pointer, "ignored field is not a JSON pointer, expected a leading '/'");
					}
					valid
				}),
		);
		self
	}

	pub(crate) fn omits_metadata(&self) -> bool {
		self.ignore_helm_managed_labels
			|| !self.ignore_labels.is_empty()
			|| !self.ignore_annotations.is_empty()
	}
}

impl fmt::Debug for Options {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("ignore_helm_managed_labels", &self.ignore_helm_managed_labels)
			.field("ignore_labels", &self.ignore_labels)
			.field("ignore_annotations", &self.ignore_annotations)
			.field("transformers", &self.transformers.len())
			.field("additional_keys", &self.additional_keys.len())
			.field("sort_lists_by_name", &self.sort_lists_by_name)
			.field("equate_empty", &self.equate_empty)
			.field("ignore_fields", &self.ignore_fields)
			.finish()
	}
}

/// The declarative subset of [`Options`], as written in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
	pub ignore_helm_managed_labels: bool,
	pub ignore_labels: Vec<String>,
	pub ignore_annotations: Vec<String>,
	pub sort_lists_by_name: bool,
	pub equate_empty: bool,
	pub ignore_fields: Vec<String>,
}

impl From<OptionsConfig> for Options {
	fn from(config: OptionsConfig) -> Self {
		Self {
			ignore_helm_managed_labels: config.ignore_helm_managed_labels,
			ignore_labels: config.ignore_labels,
			ignore_annotations: config.ignore_annotations,
			sort_lists_by_name: config.sort_lists_by_name,
			equate_empty: config.equate_empty,
			..Self::default()
		}
		.ignore_fields(config.ignore_fields)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ignore_label_keys_replaces() {
		let options = Options::new()
			.ignore_label_keys(["a", "b"])
			.ignore_label_keys(["c"]);
		assert_eq!(options.ignore_labels, ["c"]);
	}

	#[test]
	fn test_ignore_annotation_keys_replaces() {
		let options = Options::new()
			.ignore_annotation_keys(["a"])
			.ignore_annotation_keys(Vec::<String>::new());
		assert!(options.ignore_annotations.is_empty());
		assert!(!options.omits_metadata());
	}

	#[test]
	fn test_callbacks_accumulate() {
		let options = Options::new()
			.transformer(|_| {})
			.transformer(|_| {})
			.additional_key(ObjectKey::clone)
			.ignore_fields(["/a"])
			.ignore_fields(["/b"]);
		assert_eq!(options.transformers.len(), 2);
		assert_eq!(options.additional_keys.len(), 1);
		assert_eq!(options.ignore_fields, ["/a", "/b"]);
	}

	#[test]
	fn test_options_from_config() {
		let config: OptionsConfig = serde_json::from_value(serde_json::json!({
			"ignore_helm_managed_labels": true,
			"ignore_labels": ["team"],
			"equate_empty": true
		}))
		.unwrap();
		let options = Options::from(config);
		assert!(options.ignore_helm_managed_labels);
		assert_eq!(options.ignore_labels, ["team"]);
		assert!(options.equate_empty);
		assert!(!options.sort_lists_by_name);
		assert!(options.omits_metadata());
	}

	#[test]
	fn test_ignore_fields_skips_relative_paths() {
		let options = Options::new().ignore_fields(["spec/replicas", "/data/a", ""]);
		assert_eq!(options.ignore_fields, ["/data/a"]);

		let config = OptionsConfig {
			ignore_fields: vec!["metadata/labels".into(), "/spec/selector".into()],
			..OptionsConfig::default()
		};
		assert_eq!(Options::from(config).ignore_fields, ["/spec/selector"]);
	}

	#[test]
	fn test_config_rejects_unknown_fields() {
		let result: Result<OptionsConfig, _> =
			serde_json::from_value(serde_json::json!({ "ignore_label": ["x"] }));
		assert!(result.is_err());
	}
}
