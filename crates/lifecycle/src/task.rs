use std::fmt;
use std::sync::Arc;

use idreg_registry::{CacheObject, Registry, Schema};
use tracing::debug;

/// Work deferred until the end of a unit of work.
///
/// Runs exactly once: on [`Cleanup::run`] or when dropped.
#[must_use = "dropping a cleanup runs it immediately"]
pub struct Cleanup(Option<Box<dyn FnOnce() + Send>>);

impl Cleanup {
	/// A cleanup with nothing to do.
	pub fn none() -> Self {
		Self(None)
	}

	/// Defers `f`.
	pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
		Self(Some(Box::new(f)))
	}

	/// Returns true if nothing is deferred.
	pub fn is_none(&self) -> bool {
		self.0.is_none()
	}

	/// Runs the deferred work now.
	pub fn run(mut self) {
		if let Some(f) = self.0.take() {
			f();
		}
	}
}

impl Drop for Cleanup {
	fn drop(&mut self) {
		if let Some(f) = self.0.take() {
			f();
		}
	}
}

impl fmt::Debug for Cleanup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Cleanup").field(&self.0.is_some()).finish()
	}
}

/// A hook run around a unit of work.
pub trait LifecycleTask<Req>: Send + Sync + 'static {
	/// Runs before the work. The returned cleanup runs after it.
	fn pre(&self, req: &mut Req) -> Cleanup;
}

type Predicate<Req> = Box<dyn Fn(&Req) -> bool + Send + Sync>;

/// Clears registries after each unit of work.
///
/// With [`ClearRegistry::before_request`] the clear happens before the work
/// instead. A predicate restricts clearing to matching requests; it sees the
/// request before the work runs in both modes.
pub struct ClearRegistry<T, Req>
where
	T: ?Sized + CacheObject,
{
	registries: Arc<[Arc<Registry<T>>]>,
	before_request: bool,
	predicate: Option<Predicate<Req>>,
}

impl<T, Req> ClearRegistry<T, Req>
where
	T: ?Sized + CacheObject,
{
	pub fn new(registries: impl IntoIterator<Item = Arc<Registry<T>>>) -> Self {
		Self {
			registries: registries.into_iter().collect(),
			before_request: false,
			predicate: None,
		}
	}

	/// Clears before the work runs rather than after.
	pub fn before_request(mut self) -> Self {
		self.before_request = true;
		self
	}

	/// Only clears for requests matching `predicate`.
	///
	/// The predicate runs before the work in both modes, since the request
	/// moves into the work; changes the work makes to it are not seen.
	pub fn when(mut self, predicate: impl Fn(&Req) -> bool + Send + Sync + 'static) -> Self {
		self.predicate = Some(Box::new(predicate));
		self
	}

	fn clear_all(registries: &[Arc<Registry<T>>]) {
		for registry in registries {
			registry.clear();
		}
	}
}

impl<T, Req> LifecycleTask<Req> for ClearRegistry<T, Req>
where
	T: ?Sized + CacheObject,
	Req: 'static,
{
	fn pre(&self, req: &mut Req) -> Cleanup {
		if self.predicate.as_ref().is_some_and(|p| !p(req)) {
			return Cleanup::none();
		}
		if self.before_request {
			debug!(registries = self.registries.len(), "clearing registries before request");
			Self::clear_all(&self.registries);
			return Cleanup::none();
		}
		let registries = self.registries.clone();
		Cleanup::new(move || {
			debug!(registries = registries.len(), "clearing registries after request");
			Self::clear_all(&registries);
		})
	}
}

/// A request that can hold registries spawned for it.
pub trait RegistryCarrier<T>
where
	T: ?Sized + CacheObject,
{
	fn attach_registry(&mut self, name: &str, registry: Arc<Registry<T>>);
}

/// Gives each unit of work its own empty registry.
///
/// The registry is spawned from a locked template schema, so spawning shares
/// the definitions instead of copying them. It is cleared once the work ends;
/// references the work kept stay valid but empty.
pub struct SpawnRegistry<T>
where
	T: ?Sized + CacheObject,
{
	template: Schema<T>,
	name: String,
}

impl<T> SpawnRegistry<T>
where
	T: ?Sized + CacheObject,
{
	/// Locks `template` and attaches spawned registries under `name`.
	pub fn new(template: Schema<T>, name: impl Into<String>) -> Self {
		template.lock();
		Self {
			template,
			name: name.into(),
		}
	}

	/// The template spawned registries are built against.
	pub fn template(&self) -> &Schema<T> {
		&self.template
	}
}

impl<T, Req> LifecycleTask<Req> for SpawnRegistry<T>
where
	T: ?Sized + CacheObject,
	Req: RegistryCarrier<T>,
{
	fn pre(&self, req: &mut Req) -> Cleanup {
		let registry = Arc::new(self.template.spawn_registry(false));
		req.attach_registry(&self.name, registry.clone());
		let name = self.name.clone();
		Cleanup::new(move || {
			debug!(registry = %name, size = registry.len(), "clearing spawned registry");
			registry.clear();
		})
	}
}
