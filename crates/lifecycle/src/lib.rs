//! Registry lifecycle hooks around a unit of work.
//!
//! A unit of work is usually a request: caches built while serving it should
//! not outlive it. [`LifecycleTask`]s run before the work and hand back a
//! [`Cleanup`] that runs after it, whether the work completes, fails, or is
//! dropped part way.
//!
//! | Task | Before | After |
//! |------|--------|-------|
//! | [`ClearRegistry`] | clears with `before_request` | clears otherwise |
//! | [`SpawnRegistry`] | spawns a registry and attaches it to the request | clears the spawned registry |
//!
//! [`Lifecycle::run`] drives tasks around a closure; [`LifecycleLayer`] does the
//! same around any [`tower_service::Service`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use idreg_lifecycle::{ClearRegistry, Lifecycle};
//! use idreg_primitives::{ValueKind, pattern, sym, tuple};
//! use idreg_registry::{PatternDef, Registry};
//!
//! let registry: Arc<Registry<i64>> = Arc::new(
//! 	Registry::builder()
//! 		.pattern(PatternDef::new(pattern![sym("n"), ValueKind::Int], |t| t[1].as_int().map(Arc::new)))
//! 		.build()
//! 		.unwrap(),
//! );
//!
//! let lifecycle = Lifecycle::new().with_task(ClearRegistry::new([registry.clone()]));
//! let size = lifecycle.run((), |()| {
//! 	registry.lookup(tuple![sym("n"), 1]).unwrap();
//! 	registry.len()
//! });
//! assert_eq!(size, 1);
//! assert!(registry.is_empty());
//! ```

mod lifecycle;
mod service;
mod task;

#[cfg(test)]
mod tests;

pub use lifecycle::{Lifecycle, LifecycleGuard};
pub use service::{LifecycleFuture, LifecycleLayer, LifecycleService};
pub use task::{Cleanup, ClearRegistry, LifecycleTask, RegistryCarrier, SpawnRegistry};
