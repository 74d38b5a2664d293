use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::{Cleanup, LifecycleTask};

/// An ordered set of [`LifecycleTask`]s.
///
/// Tasks start in insertion order and their cleanups run in the same order.
pub struct Lifecycle<Req> {
	tasks: Vec<Arc<dyn LifecycleTask<Req>>>,
}

impl<Req> Default for Lifecycle<Req>
where
	Req: 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<Req> Clone for Lifecycle<Req>
where
	Req: 'static,
{
	fn clone(&self) -> Self {
		Self { tasks: self.tasks.clone() }
	}
}

impl<Req> fmt::Debug for Lifecycle<Req>
where
	Req: 'static,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Lifecycle").field("tasks", &self.tasks.len()).finish()
	}
}

impl<Req> Lifecycle<Req>
where
	Req: 'static,
{
	pub fn new() -> Self {
		Self { tasks: Vec::new() }
	}

	/// Appends a task.
	pub fn with_task(mut self, task: impl LifecycleTask<Req>) -> Self {
		self.tasks.push(Arc::new(task));
		self
	}

	pub fn len(&self) -> usize {
		self.tasks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	/// Runs every task's pre hook against `req`.
	///
	/// The cleanups run when the returned guard is dropped.
	pub fn begin(&self, req: &mut Req) -> LifecycleGuard {
		trace!(tasks = self.tasks.len(), "lifecycle begin");
		LifecycleGuard {
			cleanups: self.tasks.iter().map(|task| task.pre(req)).collect(),
		}
	}

	/// Runs `work` on `req` between the pre hooks and the cleanups.
	///
	/// Cleanups also run if `work` panics.
	pub fn run<R>(&self, mut req: Req, work: impl FnOnce(Req) -> R) -> R {
		let _guard = self.begin(&mut req);
		work(req)
	}
}

/// Pending cleanups of one unit of work.
#[must_use = "dropping the guard runs the cleanups immediately"]
pub struct LifecycleGuard {
	cleanups: Vec<Cleanup>,
}

impl LifecycleGuard {
	/// Number of cleanups that still have work to do.
	pub fn pending(&self) -> usize {
		self.cleanups.iter().filter(|c| !c.is_none()).count()
	}

	/// Runs the cleanups now.
	pub fn finish(self) {}
}

impl Drop for LifecycleGuard {
	fn drop(&mut self) {
		trace!(cleanups = self.pending(), "lifecycle end");
		for cleanup in self.cleanups.drain(..) {
			cleanup.run();
		}
	}
}

impl fmt::Debug for LifecycleGuard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LifecycleGuard").field("pending", &self.pending()).finish()
	}
}
