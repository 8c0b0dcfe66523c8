//! Registry of known object types.
//!
//! A scheme answers two questions: which kind a Rust type stands for (used
//! when a resource is serialized without `apiVersion`/`kind`), and how a
//! manifest of a given kind is decoded. Registered kinds go through their
//! typed representation so that both sides of a comparison share one
//! canonical form; everything else stays unstructured.

use std::{
	any::{type_name, TypeId},
	collections::HashMap,
	sync::{Arc, LazyLock},
};

use k8s_openapi::{
	api::{
		admissionregistration::v1 as admissionregistration, apps::v1 as apps,
		autoscaling::v1 as autoscaling_v1, autoscaling::v2 as autoscaling_v2, batch::v1 as batch,
		coordination::v1 as coordination, core::v1 as core, discovery::v1 as discovery,
		networking::v1 as networking, policy::v1 as policy, rbac::v1 as rbac,
		scheduling::v1 as scheduling, storage::v1 as storage,
	},
	apiextensions_apiserver::pkg::apis::apiextensions::v1 as apiextensions,
	kube_aggregator::pkg::apis::apiregistration::v1 as apiregistration,
	Resource,
};
use kube::core::GroupVersionKind;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::{
	error::{Error, Result},
	object::Object,
};

type Canonicalize = fn(Value) -> serde_json::Result<Value>;

#[derive(Debug, Clone, Copy)]
struct KnownType {
	type_name: &'static str,
	canonicalize: Canonicalize,
}

fn canonicalize<T: Serialize + DeserializeOwned>(value: Value) -> serde_json::Result<Value> {
	let typed: T = serde_json::from_value(value)?;
	serde_json::to_value(typed)
}

#[derive(Debug, Clone, Default)]
pub struct Scheme {
	kinds: HashMap<GroupVersionKind, KnownType>,
	types: HashMap<TypeId, Vec<GroupVersionKind>>,
}

impl Scheme {
	/// An empty scheme: every manifest decodes unstructured.
	pub fn new() -> Self {
		Self::default()
	}

	/// A scheme with the built-in Kubernetes kinds registered.
	pub fn with_defaults() -> Self {
		let mut scheme = Self::new();
		scheme.add_kubernetes_types();
		scheme
	}

	/// Register a `k8s-openapi` resource under its own kind.
	pub fn register<K>(&mut self) -> &mut Self
	where
		K: Resource + Serialize + DeserializeOwned + 'static,
	{
		self.add_known_type::<K>(crate::gvk_of::<K>())
	}

	/// Register any serde type as the representation of `gvk`.
	///
	/// Intended for custom resources. The type may omit `apiVersion` and
	/// `kind` from its serialized form; they are restored after decoding.
	pub fn add_known_type<T>(&mut self, gvk: GroupVersionKind) -> &mut Self
	where
		T: Serialize + DeserializeOwned + 'static,
	{
		let kinds = self.types.entry(TypeId::of::<T>()).or_default();
		if !kinds.contains(&gvk) {
			kinds.push(gvk.clone());
		}
		self.kinds.insert(
			gvk,
			KnownType {
				type_name: type_name::<T>(),
				canonicalize: canonicalize::<T>,
			},
		);
		self
	}

	pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
		self.kinds.contains_key(gvk)
	}

	/// All kinds registered for `T`.
	pub fn kinds_of<T: ?Sized + 'static>(&self) -> Result<&[GroupVersionKind]> {
		self.types
			.get(&TypeId::of::<T>())
			.map(Vec::as_slice)
			.filter(|kinds| !kinds.is_empty())
			.ok_or(Error::NotRegistered {
				type_name: type_name::<T>(),
			})
	}

	/// The single kind registered for `T`.
	pub fn kind_of<T: ?Sized + 'static>(&self) -> Result<GroupVersionKind> {
		match self.kinds_of::<T>()? {
			[gvk] => Ok(gvk.clone()),
			kinds => Err(Error::MultipleKinds {
				type_name: type_name::<T>(),
				kinds: kinds
					.iter()
					.map(|gvk| format!("{}/{}", gvk.api_version(), gvk.kind))
					.collect::<Vec<_>>()
					.join(", "),
			}),
		}
	}

	/// Serialize a resource, filling in missing `apiVersion`/`kind` from the
	/// kind registered for its type.
	pub fn to_object<T: Serialize + 'static>(&self, resource: &T) -> Result<Object> {
		let mut object = Object::from_resource(resource)?;
		if object.gvk().is_some() {
			return Ok(object);
		}
		if TypeId::of::<T>() == TypeId::of::<Object>() {
			return Err(Error::MissingTypeMeta);
		}
		let gvk = self.kind_of::<T>()?;
		object.default_gvk(&gvk);
		Ok(object)
	}

	/// Decode one manifest.
	///
	/// Registered kinds are decoded through their typed representation;
	/// unknown kinds are kept as they are.
	pub fn decode(&self, value: Value) -> Result<Object> {
		let object = Object::from_value(value)?;
		let gvk = object.gvk().ok_or(Error::MissingTypeMeta)?;

		let Some(known) = self.kinds.get(&gvk) else {
			trace!(api_version = %gvk.api_version(), kind = %gvk.kind, "not registered, keeping unstructured");
			return Ok(object);
		};

		let canonical =
			(known.canonicalize)(object.into_value()).map_err(|source| Error::Decode {
				kind: format!("{}/{}", gvk.api_version(), gvk.kind),
				type_name: known.type_name,
				source,
			})?;
		let mut object = Object::from_value(canonical)?;
		object.default_gvk(&gvk);
		Ok(object)
	}

	fn add_kubernetes_types(&mut self) {
		self.register::<core::ConfigMap>()
			.register::<core::Endpoints>()
			.register::<core::LimitRange>()
			.register::<core::Namespace>()
			.register::<core::PersistentVolume>()
			.register::<core::PersistentVolumeClaim>()
			.register::<core::Pod>()
			.register::<core::PodTemplate>()
			.register::<core::ReplicationController>()
			.register::<core::ResourceQuota>()
			.register::<core::Secret>()
			.register::<core::Service>()
			.register::<core::ServiceAccount>()
			.register::<apps::ControllerRevision>()
			.register::<apps::DaemonSet>()
			.register::<apps::Deployment>()
			.register::<apps::ReplicaSet>()
			.register::<apps::StatefulSet>()
			.register::<batch::CronJob>()
			.register::<batch::Job>()
			.register::<networking::Ingress>()
			.register::<networking::IngressClass>()
			.register::<networking::NetworkPolicy>()
			.register::<rbac::ClusterRole>()
			.register::<rbac::ClusterRoleBinding>()
			.register::<rbac::Role>()
			.register::<rbac::RoleBinding>()
			.register::<policy::PodDisruptionBudget>()
			.register::<autoscaling_v1::HorizontalPodAutoscaler>()
			.register::<autoscaling_v2::HorizontalPodAutoscaler>()
			.register::<storage::CSIDriver>()
			.register::<storage::StorageClass>()
			.register::<scheduling::PriorityClass>()
			.register::<admissionregistration::MutatingWebhookConfiguration>()
			.register::<admissionregistration::ValidatingWebhookConfiguration>()
			.register::<coordination::Lease>()
			.register::<discovery::EndpointSlice>()
			.register::<apiextensions::CustomResourceDefinition>()
			.register::<apiregistration::APIService>();
	}
}

static DEFAULT_SCHEME: LazyLock<Arc<Scheme>> = LazyLock::new(|| Arc::new(Scheme::with_defaults()));

/// The shared scheme used when none is specified.
pub fn default_scheme() -> Arc<Scheme> {
	Arc::clone(&DEFAULT_SCHEME)
}
