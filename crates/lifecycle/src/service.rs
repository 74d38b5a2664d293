//! Tower middleware running a [`Lifecycle`] around each request.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use tower_layer::Layer;
use tower_service::Service;

use crate::{Lifecycle, LifecycleGuard};

/// Wraps services in a [`LifecycleService`].
pub struct LifecycleLayer<Req> {
	lifecycle: Lifecycle<Req>,
}

impl<Req> LifecycleLayer<Req>
where
	Req: 'static,
{
	pub fn new(lifecycle: Lifecycle<Req>) -> Self {
		Self { lifecycle }
	}
}

impl<Req> Clone for LifecycleLayer<Req>
where
	Req: 'static,
{
	fn clone(&self) -> Self {
		Self {
			lifecycle: self.lifecycle.clone(),
		}
	}
}

impl<S, Req> Layer<S> for LifecycleLayer<Req>
where
	Req: 'static,
{
	type Service = LifecycleService<S, Req>;

	fn layer(&self, inner: S) -> Self::Service {
		LifecycleService {
			inner,
			lifecycle: self.lifecycle.clone(),
		}
	}
}

/// Runs the pre hooks before calling the inner service and the cleanups once
/// its response future completes or is dropped.
pub struct LifecycleService<S, Req> {
	inner: S,
	lifecycle: Lifecycle<Req>,
}

impl<S: Clone, Req> Clone for LifecycleService<S, Req>
where
	Req: 'static,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			lifecycle: self.lifecycle.clone(),
		}
	}
}

impl<S, Req> LifecycleService<S, Req>
where
	Req: 'static,
{
	pub fn new(inner: S, lifecycle: Lifecycle<Req>) -> Self {
		Self { inner, lifecycle }
	}

	/// Get a reference to the inner service.
	pub fn get_ref(&self) -> &S {
		&self.inner
	}

	/// Consume self, returning the inner service.
	pub fn into_inner(self) -> S {
		self.inner
	}
}

impl<S, Req> Service<Req> for LifecycleService<S, Req>
where
	S: Service<Req>,
	Req: 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = LifecycleFuture<S::Future>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, mut req: Req) -> Self::Future {
		let guard = self.lifecycle.begin(&mut req);
		LifecycleFuture {
			fut: self.inner.call(req),
			guard: Some(guard),
		}
	}
}

pin_project! {
	/// Response future of [`LifecycleService`].
	pub struct LifecycleFuture<Fut> {
		#[pin]
		fut: Fut,
		guard: Option<LifecycleGuard>,
	}
}

impl<Fut> Future for LifecycleFuture<Fut>
where
	Fut: Future,
{
	type Output = Fut::Output;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let output = ready!(this.fut.poll(cx));
		drop(this.guard.take());
		Poll::Ready(output)
	}
}
