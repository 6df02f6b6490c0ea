//! In-memory backend for hosts without an address bar.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use reinhardt_route_map::{Location, Route};

use crate::backend::NavigationBackend;
use crate::failure::{NavigationFailure, NavigationFailureType};
use crate::transition::{AbortCallback, BackendLink, CompleteCallback, TransitionController};

#[derive(Default)]
struct Stack {
	routes: Vec<Route>,
	index: Option<usize>,
}

struct MemoryInner {
	controller: TransitionController,
	base: String,
	stack: RefCell<Stack>,
}

/// Backend keeping its history as a stack of routes.
///
/// Nothing outside the router observes it, so there are no listeners and no
/// address to reconcile.
#[derive(Clone)]
pub struct MemoryBackend {
	inner: Rc<MemoryInner>,
}

impl std::fmt::Debug for MemoryBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let stack = self.inner.stack.borrow();
		f.debug_struct("MemoryBackend")
			.field("entries", &stack.routes.len())
			.field("index", &stack.index)
			.field("current", &self.current().full_path)
			.finish()
	}
}

impl MemoryBackend {
	/// Creates an empty backend attached to `controller`.
	pub fn new(controller: TransitionController, base: &str) -> Self {
		let backend = Self {
			inner: Rc::new(MemoryInner {
				controller,
				base: crate::backend::normalize_base(base),
				stack: RefCell::new(Stack::default()),
			}),
		};
		let weak = Rc::downgrade(&backend.inner);
		backend.inner.controller.attach(BackendLink::new(
			|_| {},
			move |location| {
				if let Some(backend) = Self::upgrade(&weak) {
					backend.navigate(location);
				}
			},
		));
		backend
	}

	fn upgrade(inner: &Weak<MemoryInner>) -> Option<Self> {
		inner.upgrade().map(|inner| Self { inner })
	}

	/// Full paths of every entry, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.inner
			.stack
			.borrow()
			.routes
			.iter()
			.map(|route| route.full_path.clone())
			.collect()
	}

	/// Position of the current entry, if any.
	pub fn index(&self) -> Option<usize> {
		self.inner.stack.borrow().index
	}

	fn record(&self, route: &Route, replace: bool) {
		let mut stack = self.inner.stack.borrow_mut();
		let keep = match (stack.index, replace) {
			(Some(index), false) => index + 1,
			(Some(index), true) => index,
			(None, _) => 0,
		};
		stack.routes.truncate(keep);
		stack.routes.push(route.clone());
		stack.index = Some(stack.routes.len() - 1);
	}

	fn navigate_with(
		&self,
		location: Location,
		replace: bool,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		let weak = Rc::downgrade(&self.inner);
		self.transition_to(
			location,
			Some(Box::new(move |route: &Route| {
				if let Some(backend) = Self::upgrade(&weak) {
					backend.record(route, replace);
				}
				if let Some(on_complete) = on_complete {
					on_complete(route);
				}
			})),
			on_abort,
		);
	}
}

impl NavigationBackend for MemoryBackend {
	fn controller(&self) -> &TransitionController {
		&self.inner.controller
	}

	fn base(&self) -> &str {
		&self.inner.base
	}

	fn transition_to(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		self.inner
			.controller
			.transition_to(location, on_complete, on_abort);
	}

	fn push(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		self.navigate_with(location, false, on_complete, on_abort);
	}

	fn replace(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		self.navigate_with(location, true, on_complete, on_abort);
	}

	/// Re-runs the guards for the target entry. Hooks see the move, but the
	/// completion callbacks of `push`/`replace` do not run again.
	fn go(&self, delta: i32) {
		let target = {
			let stack = self.inner.stack.borrow();
			let Some(index) = stack.index else {
				return;
			};
			let target = index as i64 + i64::from(delta);
			match usize::try_from(target) {
				Ok(target) if target < stack.routes.len() => target,
				_ => return,
			}
		};
		let route = self.inner.stack.borrow().routes[target].clone();

		let committed = Rc::downgrade(&self.inner);
		let failed = Rc::downgrade(&self.inner);
		self.inner.controller.confirm_transition(
			route,
			Box::new(move |route: &Route| {
				let Some(backend) = Self::upgrade(&committed) else {
					return;
				};
				let prev = backend.current();
				backend.inner.stack.borrow_mut().index = Some(target);
				backend.inner.controller.update_route(route.clone());
				backend.inner.controller.run_after_hooks(route, &prev);
			}),
			Some(Box::new(move |failure: NavigationFailure| {
				if failure.is_failure_type(NavigationFailureType::Duplicated)
					&& let Some(backend) = Self::upgrade(&failed)
				{
					backend.inner.stack.borrow_mut().index = Some(target);
				}
			})),
		);
	}

	fn ensure_url(&self, _push: bool) {}

	fn current_location(&self) -> String {
		self.inner
			.stack
			.borrow()
			.routes
			.last()
			.map_or_else(|| "/".to_string(), |route| route.full_path.clone())
	}

	fn setup_listeners(&self) {}

	fn listener_count(&self) -> usize {
		0
	}

	fn teardown(&self) {
		*self.inner.stack.borrow_mut() = Stack::default();
		self.inner.controller.teardown();
	}
}
