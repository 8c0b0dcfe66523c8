//! Unit testing for Helm charts.
//!
//! [`Renderer`] runs `helm template` and splits the output into [`Manifests`],
//! a set of [`Object`]s addressable by [`ObjectKey`]. Kinds registered in a
//! [`Scheme`] are decoded into a canonical typed form, so rendered objects can
//! be compared against `k8s-openapi` values written in tests.
//!
//! ```no_run
//! use chartest::{ObjectKey, RenderOptions, Renderer};
//! use chartest::k8s_openapi::api::apps::v1::Deployment;
//!
//! let options = RenderOptions::builder().set(vec!["replicaCount=2".into()]).build();
//! let manifests = Renderer::new()
//!     .render_templates("foo", "testdata/test-chart", &options)
//!     .unwrap();
//!
//! let key = ObjectKey::new("", "foo-test-chart", &chartest::gvk_of::<Deployment>());
//! let deployment: Deployment = manifests.load(&key).unwrap().to_resource().unwrap();
//! assert_eq!(deployment.spec.unwrap().replicas, Some(2));
//! ```

mod error;
mod key;
mod manifests;
mod object;
mod render;
mod scheme;
pub mod split;

pub use error::{Error, RenderError, Result};
pub use k8s_openapi;
pub use key::ObjectKey;
pub use kube::core::GroupVersionKind;
pub use manifests::Manifests;
pub use object::{gvk_from_api_version, Object};
pub use render::{RenderOptions, Renderer, HELM_BIN_ENV};
pub use scheme::{default_scheme, Scheme};

/// Kind of a `k8s-openapi` resource type.
pub fn gvk_of<K: k8s_openapi::Resource>() -> GroupVersionKind {
	GroupVersionKind::gvk(K::GROUP, K::VERSION, K::KIND)
}
