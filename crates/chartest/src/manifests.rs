use std::{
	collections::HashMap,
	sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::Serialize;

use crate::{
	error::Result,
	key::ObjectKey,
	object::Object,
	scheme::{default_scheme, Scheme},
};

/// The objects of one render, addressable by [`ObjectKey`].
///
/// Safe to share between tests running in parallel: lookups take a read
/// lock, mutations take the write lock.
#[derive(Debug)]
pub struct Manifests {
	objects: RwLock<HashMap<ObjectKey, Object>>,
	scheme: Arc<Scheme>,
}

impl Default for Manifests {
	fn default() -> Self {
		Self::new()
	}
}

impl Manifests {
	/// Empty manifests using the default scheme.
	pub fn new() -> Self {
		Self::with_scheme(default_scheme())
	}

	pub fn with_scheme(scheme: Arc<Scheme>) -> Self {
		Self {
			objects: RwLock::new(HashMap::new()),
			scheme,
		}
	}

	/// The object stored for `key`, if any.
	pub fn load(&self, key: &ObjectKey) -> Option<Object> {
		self.read().get(key).cloned()
	}

	/// Store `object` under `key`, replacing any previous object.
	pub fn store(&self, key: ObjectKey, object: Object) {
		self.write().insert(key, object);
	}

	/// Convert a resource with this manifests' scheme and store it under its
	/// own key.
	pub fn store_resource<T: Serialize + 'static>(&self, resource: &T) -> Result<ObjectKey> {
		let object = self.scheme.to_object(resource)?;
		let key = ObjectKey::from_object(&object)?;
		self.store(key.clone(), object);
		Ok(key)
	}

	/// Remove the object stored for `key`, returning it.
	pub fn delete(&self, key: &ObjectKey) -> Option<Object> {
		self.write().remove(key)
	}

	pub fn scheme(&self) -> &Arc<Scheme> {
		&self.scheme
	}

	pub fn len(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	/// Keys of all stored objects, in no particular order.
	pub fn keys(&self) -> Vec<ObjectKey> {
		self.read().keys().cloned().collect()
	}

	// Every mutation is a single map operation, so a poisoned lock still
	// guards a consistent map.
	fn read(&self) -> RwLockReadGuard<'_, HashMap<ObjectKey, Object>> {
		self.objects.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, HashMap<ObjectKey, Object>> {
		self.objects.write().unwrap_or_else(PoisonError::into_inner)
	}
}
