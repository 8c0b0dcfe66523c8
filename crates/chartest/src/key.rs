use std::fmt;

use kube::core::GroupVersionKind;
use serde::{Deserialize, Serialize};

use crate::{
	error::{Error, Result},
	object::Object,
	scheme::Scheme,
};

/// Uniquely identifies a rendered object inside [`crate::Manifests`].
#[derive(
	Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObjectKey {
	pub group: String,
	pub version: String,
	pub kind: String,
	pub namespace: String,
	pub name: String,
}

impl ObjectKey {
	pub fn new(
		namespace: impl Into<String>,
		name: impl Into<String>,
		gvk: &GroupVersionKind,
	) -> Self {
		Self {
			group: gvk.group.clone(),
			version: gvk.version.clone(),
			kind: gvk.kind.clone(),
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	/// Build the key from the object's own type metadata.
	pub fn from_object(object: &Object) -> Result<Self> {
		let gvk = object.gvk().ok_or(Error::MissingTypeMeta)?;
		Ok(Self::new(object.namespace(), object.name(), &gvk))
	}

	/// Build the key of a resource, asking the scheme for its kind when the
	/// resource carries no type metadata.
	pub fn for_resource<T: Serialize + 'static>(resource: &T, scheme: &Scheme) -> Result<Self> {
		Self::from_object(&scheme.to_object(resource)?)
	}

	pub fn gvk(&self) -> GroupVersionKind {
		GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// `Kind.group`, or just `Kind` for the core group.
	pub fn group_kind(&self) -> String {
		if self.group.is_empty() {
			self.kind.clone()
		} else {
			format!("{}.{}", self.kind, self.group)
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}
}

impl fmt::Display for ObjectKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let group_kind = self.group_kind().to_lowercase();
		if self.namespace.is_empty() {
			write!(f, "{}/{}", group_kind, self.name)
		} else {
			write!(f, "{}/{}/{}", group_kind, self.namespace, self.name)
		}
	}
}
