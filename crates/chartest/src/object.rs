//! Decoded Kubernetes API objects.
//!
//! Objects are kept in their JSON representation, so typed `k8s-openapi`
//! resources and unstructured custom resources compare the same way.

use std::collections::BTreeMap;

use kube::core::GroupVersionKind;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A single Kubernetes API object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Object {
	fields: Map<String, Value>,
}

impl Object {
	pub fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Object(fields) => Ok(Self { fields }),
			_ => Err(Error::NotAnObject),
		}
	}

	/// Serialize any resource (typed or not) into an object.
	///
	/// No type metadata is added; see [`crate::Scheme::to_object`] for that.
	pub fn from_resource<T: Serialize + ?Sized>(resource: &T) -> Result<Self> {
		Self::from_value(serde_json::to_value(resource).map_err(Error::Serialize)?)
	}

	/// Decode the object into a typed resource.
	pub fn to_resource<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_value(self.to_value()).map_err(|source| Error::Decode {
			kind: self.kind().to_owned(),
			type_name: std::any::type_name::<T>(),
			source,
		})
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.fields
	}

	pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
		&mut self.fields
	}

	pub fn to_value(&self) -> Value {
		Value::Object(self.fields.clone())
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.fields)
	}

	pub fn api_version(&self) -> &str {
		self.fields
			.get("apiVersion")
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	pub fn kind(&self) -> &str {
		self.fields
			.get("kind")
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	/// Type of the object, if both apiVersion and kind are set.
	pub fn gvk(&self) -> Option<GroupVersionKind> {
		let (api_version, kind) = (self.api_version(), self.kind());
		if api_version.is_empty() || kind.is_empty() {
			return None;
		}
		Some(gvk_from_api_version(api_version, kind))
	}

	pub fn set_gvk(&mut self, gvk: &GroupVersionKind) {
		self.fields
			.insert("apiVersion".into(), Value::String(gvk.api_version()));
		self.fields
			.insert("kind".into(), Value::String(gvk.kind.clone()));
	}

	/// Fill in only the parts of apiVersion/kind that are missing.
	pub(crate) fn default_gvk(&mut self, gvk: &GroupVersionKind) {
		if self.api_version().is_empty() {
			self.fields
				.insert("apiVersion".into(), Value::String(gvk.api_version()));
		}
		if self.kind().is_empty() {
			self.fields
				.insert("kind".into(), Value::String(gvk.kind.clone()));
		}
	}

	pub fn name(&self) -> &str {
		self.metadata_str("name")
	}

	pub fn namespace(&self) -> &str {
		self.metadata_str("namespace")
	}

	pub fn set_name(&mut self, name: &str) {
		self.set_metadata_str("name", name);
	}

	/// Set the namespace; an empty namespace removes the field.
	pub fn set_namespace(&mut self, namespace: &str) {
		self.set_metadata_str("namespace", namespace);
	}

	pub fn labels(&self) -> BTreeMap<String, String> {
		self.metadata_string_map("labels")
	}

	pub fn annotations(&self) -> BTreeMap<String, String> {
		self.metadata_string_map("annotations")
	}

	/// Replace labels; an empty map removes the field.
	pub fn set_labels(&mut self, labels: BTreeMap<String, String>) {
		self.set_metadata_string_map("labels", labels);
	}

	/// Replace annotations; an empty map removes the field.
	pub fn set_annotations(&mut self, annotations: BTreeMap<String, String>) {
		self.set_metadata_string_map("annotations", annotations);
	}

	/// Remove the given label keys, whatever their values.
	///
	/// Labels left empty are removed entirely.
	pub fn remove_labels<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
		self.remove_metadata_entries("labels", keys);
	}

	/// Remove the given annotation keys, whatever their values.
	///
	/// Annotations left empty are removed entirely.
	pub fn remove_annotations<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
		self.remove_metadata_entries("annotations", keys);
	}

	fn metadata(&self) -> Option<&Map<String, Value>> {
		self.fields.get("metadata").and_then(Value::as_object)
	}

	fn metadata_mut(&mut self) -> &mut Map<String, Value> {
		let metadata = self
			.fields
			.entry("metadata")
			.or_insert_with(|| Value::Object(Map::new()));
		if !metadata.is_object() {
			*metadata = Value::Object(Map::new());
		}
		match metadata {
			Value::Object(map) => map,
			_ => unreachable!("metadata was just replaced with an object"),
		}
	}

	fn metadata_str(&self, field: &str) -> &str {
		self.metadata()
			.and_then(|m| m.get(field))
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	fn set_metadata_str(&mut self, field: &str, value: &str) {
		if value.is_empty() {
			if let Some(Value::Object(metadata)) = self.fields.get_mut("metadata") {
				metadata.remove(field);
			}
			return;
		}
		self.metadata_mut()
			.insert(field.into(), Value::String(value.into()));
	}

	fn metadata_string_map(&self, field: &str) -> BTreeMap<String, String> {
		self.metadata()
			.and_then(|m| m.get(field))
			.and_then(Value::as_object)
			.map(|map| {
				map.iter()
					.filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_owned())))
					.collect()
			})
			.unwrap_or_default()
	}

	fn set_metadata_string_map(&mut self, field: &str, entries: BTreeMap<String, String>) {
		if entries.is_empty() {
			if let Some(Value::Object(metadata)) = self.fields.get_mut("metadata") {
				metadata.remove(field);
			}
			return;
		}
		let map = entries
			.into_iter()
			.map(|(k, v)| (k, Value::String(v)))
			.collect();
		self.metadata_mut().insert(field.into(), Value::Object(map));
	}

	fn remove_metadata_entries<'a>(
		&mut self,
		field: &str,
		keys: impl IntoIterator<Item = &'a str>,
	) {
		let Some(Value::Object(metadata)) = self.fields.get_mut("metadata") else {
			return;
		};
		let Some(entries) = metadata.get_mut(field) else {
			return;
		};
		if let Value::Object(map) = &mut *entries {
			for key in keys {
				map.remove(key);
			}
			if !map.is_empty() {
				return;
			}
		}
		if entries.is_null() || entries.as_object().is_some_and(Map::is_empty) {
			metadata.remove(field);
		}
	}
}

impl TryFrom<Value> for Object {
	type Error = Error;

	fn try_from(value: Value) -> Result<Self> {
		Self::from_value(value)
	}
}

impl From<Object> for Value {
	fn from(object: Object) -> Self {
		object.into_value()
	}
}

/// Split an apiVersion (`group/version`, or `version` for the core group).
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
	let (group, version) = match api_version.split_once('/') {
		Some((g, v)) => (g, v),
		None => ("", api_version),
	};
	GroupVersionKind::gvk(group, version, kind)
}
