use std::collections::BTreeMap;
use std::convert::Infallible;
use std::future::{Ready, poll_fn, ready};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use idreg_primitives::{ValueKind, pattern, sym, tuple};
use idreg_registry::{PatternDef, Registry, Schema};
use tower_layer::Layer;
use tower_service::Service;

use super::*;

fn schema() -> Schema<i64> {
	Registry::builder()
		.pattern(
			PatternDef::new(pattern![sym("hello"), ValueKind::Int], |t| t[1].as_int().map(Arc::new))
				.object_type("hello_numbers")
				.reverse(|n: &i64| Some(tuple![sym("hello"), *n])),
		)
		.pattern(
			PatternDef::new(pattern![sym("hello"), ValueKind::Float], |t| t[1].as_float().map(|v| Arc::new(v as i64)))
				.object_type("hello_numbers")
				.reverse(|n: &i64| Some(tuple![sym("hello"), *n as f64])),
		)
		.into_schema()
		.unwrap()
}

fn registry() -> Arc<Registry<i64>> {
	let registry = Arc::new(Registry::with_schema(schema()));
	registry.lookup(tuple![sym("hello"), 1]).unwrap().unwrap();
	assert_eq!(registry.len(), 1);
	registry
}

#[derive(Default)]
struct Env {
	route: &'static str,
	registries: BTreeMap<String, Arc<Registry<i64>>>,
}

impl Env {
	fn route(route: &'static str) -> Self {
		Self {
			route,
			..Self::default()
		}
	}
}

impl RegistryCarrier<i64> for Env {
	fn attach_registry(&mut self, name: &str, registry: Arc<Registry<i64>>) {
		self.registries.insert(name.to_owned(), registry);
	}
}

#[test]
fn clear_registry_after_request() {
	let registry = registry();
	let task = ClearRegistry::new([registry.clone()]);

	let cleanup = task.pre(&mut ());
	assert_eq!(registry.len(), 1);
	cleanup.run();
	assert!(registry.is_empty());
}

#[test]
fn clear_registry_with_predicate() {
	let registry = registry();
	let task = ClearRegistry::new([registry.clone()]).when(|env: &Env| env.route == "bar");

	let cleanup = task.pre(&mut Env::route("baz"));
	assert!(cleanup.is_none());
	cleanup.run();
	assert_eq!(registry.len(), 1);

	task.pre(&mut Env::route("bar")).run();
	assert!(registry.is_empty());
}

#[test]
fn clear_registry_before_request() {
	let registry = registry();
	let task = ClearRegistry::new([registry.clone()]).before_request();

	let cleanup = task.pre(&mut ());
	assert!(registry.is_empty());
	registry.lookup(tuple![sym("hello"), 2]).unwrap();
	cleanup.run();
	assert_eq!(registry.len(), 1, "nothing is deferred");
}

#[test]
fn clear_registry_clears_every_registry() {
	let a = registry();
	let b = registry();
	let task = ClearRegistry::new([a.clone(), b.clone()]);
	task.pre(&mut ()).run();
	assert!(a.is_empty());
	assert!(b.is_empty());
}

#[test]
fn spawn_registry_attaches_an_empty_registry() {
	let base = registry();
	let task = SpawnRegistry::new(schema(), "reg");
	assert!(task.template().is_locked());

	let mut env = Env::default();
	let cleanup = task.pre(&mut env);
	let spawned = env.registries["reg"].clone();
	assert!(spawned.is_empty());
	assert!(spawned.schema().is_locked());

	let obj1 = base.get(&tuple![sym("hello"), 1]).unwrap();
	let obj2 = spawned.lookup(tuple![sym("hello"), 1]).unwrap().unwrap();
	assert!(!Arc::ptr_eq(&obj1, &obj2));
	assert_eq!(spawned.tuples_for(&obj2).unwrap().len(), 2);

	cleanup.run();
	assert!(spawned.is_empty());
	assert_eq!(base.len(), 1);
}

#[test]
fn spawn_registry_gives_each_request_its_own_registry() {
	let task = SpawnRegistry::new(schema(), "reg");
	let (mut a, mut b) = (Env::default(), Env::default());
	let _ca = task.pre(&mut a);
	let _cb = task.pre(&mut b);
	assert!(!Arc::ptr_eq(&a.registries["reg"], &b.registries["reg"]));
}

#[test]
fn predicate_sees_request_before_work() {
	let registry = registry();
	let lifecycle = Lifecycle::new().with_task(ClearRegistry::new([registry.clone()]).when(|env: &Env| env.route == "bar"));

	let route = lifecycle.run(Env::route("bar"), |mut env: Env| {
		env.route = "baz";
		env.route
	});
	assert_eq!(route, "baz");
	assert!(registry.is_empty());
}

#[test]
fn lifecycle_and_layer_clone_with_owned_requests() {
	let registry = registry();
	let lifecycle: Lifecycle<Env> = Lifecycle::default().with_task(ClearRegistry::new([registry.clone()]));
	let copy = lifecycle.clone();
	assert_eq!(copy.len(), 1);
	assert_eq!(format!("{copy:?}"), "Lifecycle { tasks: 1 }");

	let layer = LifecycleLayer::new(copy).clone();
	let service = layer.layer(Lookup(Some(registry.clone()))).clone();
	assert!(service.get_ref().0.is_some());
	drop(lifecycle);
	assert_eq!(registry.len(), 1);
}

#[test]
fn run_clears_after_work() {
	let registry = registry();
	let lifecycle = Lifecycle::new().with_task(ClearRegistry::new([registry.clone()]));

	let size = lifecycle.run((), |()| {
		registry.lookup(tuple![sym("hello"), 2]).unwrap();
		registry.len()
	});
	assert_eq!(size, 2);
	assert!(registry.is_empty());
}

#[test]
fn run_clears_when_work_panics() {
	let registry = registry();
	let lifecycle = Lifecycle::new().with_task(ClearRegistry::new([registry.clone()]));

	let result = catch_unwind(AssertUnwindSafe(|| lifecycle.run((), |()| -> usize { panic!("work failed") })));
	assert!(result.is_err());
	assert!(registry.is_empty());
}

#[test]
fn guard_runs_cleanups_in_task_order() {
	let order = Arc::new(Log::default());
	struct Record(&'static str, Arc<Log>);
	impl LifecycleTask<()> for Record {
		fn pre(&self, _: &mut ()) -> Cleanup {
			self.1.push(format!("pre {}", self.0));
			let (name, log) = (self.0, self.1.clone());
			Cleanup::new(move || log.push(format!("post {name}")))
		}
	}

	let lifecycle = Lifecycle::new().with_task(Record("a", order.clone())).with_task(Record("b", order.clone()));
	assert_eq!(lifecycle.len(), 2);
	let guard = lifecycle.begin(&mut ());
	assert_eq!(guard.pending(), 2);
	guard.finish();
	assert_eq!(order.take(), ["pre a", "pre b", "post a", "post b"]);
}

#[derive(Default)]
struct Log(Mutex<Vec<String>>);

impl Log {
	fn push(&self, line: String) {
		self.0.lock().unwrap().push(line);
	}

	fn take(&self) -> Vec<String> {
		std::mem::take(&mut *self.0.lock().unwrap())
	}
}

/// Looks up `[:hello, 2]` in the request's spawned registry, or in a shared one.
#[derive(Clone)]
struct Lookup(Option<Arc<Registry<i64>>>);

impl Service<Env> for Lookup {
	type Response = usize;
	type Error = Infallible;
	type Future = Ready<Result<usize, Infallible>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, env: Env) -> Self::Future {
		let registry = match &self.0 {
			Some(registry) => registry.clone(),
			None => env.registries["reg"].clone(),
		};
		registry.lookup(tuple![sym("hello"), 2]).unwrap();
		ready(Ok(registry.len()))
	}
}

#[tokio::test]
async fn layer_clears_when_response_completes() {
	let registry = registry();
	let layer = LifecycleLayer::new(Lifecycle::new().with_task(ClearRegistry::new([registry.clone()])));
	let mut service = layer.layer(Lookup(Some(registry.clone())));

	poll_fn(|cx| service.poll_ready(cx)).await.unwrap();
	let size = service.call(Env::default()).await.unwrap();
	assert_eq!(size, 2);
	assert!(registry.is_empty());
}

#[tokio::test]
async fn layer_clears_when_response_is_dropped() {
	let registry = registry();
	let mut service = LifecycleService::new(Lookup(Some(registry.clone())), Lifecycle::new().with_task(ClearRegistry::new([registry.clone()])));

	let future = service.call(Env::default());
	assert_eq!(registry.len(), 2);
	drop(future);
	assert!(registry.is_empty());
}

#[tokio::test]
async fn layer_spawns_a_registry_per_request() {
	let layer = LifecycleLayer::new(Lifecycle::new().with_task(SpawnRegistry::new(schema(), "reg")));
	let mut service = layer.layer(Lookup(None));

	assert_eq!(service.call(Env::default()).await.unwrap(), 1);
	assert_eq!(service.call(Env::default()).await.unwrap(), 1);
}
