//! Observer hooks invoked around every outbound request.

// std
use std::panic::{self, AssertUnwindSafe};
// self
use crate::{
	_prelude::*,
	http::{HttpRequest, HttpResponse},
	obs,
};

/// Observer notified before each request is sent and after each response arrives.
///
/// Hooks see every attempt, including token refreshes and retries, and run in registration
/// order on the task that drives the request. They receive shared references, so they cannot
/// alter the traffic, and they should return quickly because the request waits on them. A
/// panicking hook is skipped for that callback; the request and the remaining hooks proceed.
/// Transport failures that produce no response only trigger [`on_request`](Self::on_request).
pub trait RequestHook
where
	Self: Send + Sync,
{
	/// Called right before `request` is handed to the transport.
	fn on_request(&self, request: &HttpRequest) {
		let _ = request;
	}

	/// Called once `response` has been received, whatever its status.
	fn on_response(&self, response: &HttpResponse) {
		let _ = response;
	}
}

/// Ordered, cheaply cloneable list of hooks.
#[derive(Clone, Default)]
pub struct HookChain(Arc<[Arc<dyn RequestHook>]>);
impl HookChain {
	/// Freezes `hooks` in the given order.
	pub fn new(hooks: Vec<Arc<dyn RequestHook>>) -> Self {
		Self(hooks.into())
	}

	/// Number of registered hooks.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no hook is registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub(crate) fn notify_request(&self, request: &HttpRequest) {
		for (index, hook) in self.0.iter().enumerate() {
			isolate(index, "on_request", || hook.on_request(request));
		}
	}

	pub(crate) fn notify_response(&self, response: &HttpResponse) {
		for (index, hook) in self.0.iter().enumerate() {
			isolate(index, "on_response", || hook.on_response(response));
		}
	}
}
impl Debug for HookChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HookChain").field("len", &self.0.len()).finish()
	}
}

/// Runs one hook callback, containing any panic so the request carries on.
fn isolate(index: usize, callback: &'static str, run: impl FnOnce()) {
	if panic::catch_unwind(AssertUnwindSafe(run)).is_err() {
		obs::hook_panicked(index, callback);
	}
}
