//! The navigation transition pipeline.
//!
//! A transition resolves a target location into a [`Route`], runs the guard
//! pipeline and, if nothing stops it, commits the route as `current`:
//!
//! 1. leave guards of deactivated components (innermost first)
//! 2. global `before_each` guards
//! 3. update guards of reused components
//! 4. `before_enter` guards of activated records
//! 5. enter guards of activated components
//! 6. global `before_resolve` guards
//! 7. commit, then the `listen` callback, the completion callback and
//!    `after_each` hooks
//!
//! Each phase runs through [`run_queue`](crate::run_queue). Starting a new
//! transition supersedes any pending one: the older transition reports
//! [`NavigationFailure::Cancelled`] and never touches shared state again.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use reinhardt_route_map::{
	AfterHook, GuardDecision, Location, NavigationGuard, Next, Route, RouteComponent, RouteMatcher,
	RouteRecord,
};

use crate::failure::{NavigationFailure, NavigationFailureType};
use crate::queue::{Advance, run_queue};

/// Called with the committed route.
pub type CompleteCallback = Box<dyn FnOnce(&Route)>;

/// Called with the reason a navigation did not commit.
pub type AbortCallback = Box<dyn FnOnce(NavigationFailure)>;

/// How the controller reaches back into the backend that owns it.
///
/// Guards that abort need the address re-synchronized, and guards that
/// redirect need a fresh push or replace through the backend.
#[derive(Clone)]
pub struct BackendLink {
	ensure_url: Rc<dyn Fn(bool)>,
	navigate: Rc<dyn Fn(Location)>,
}

impl BackendLink {
	/// `ensure_url(push)` reconciles the address with the current route;
	/// `navigate(location)` starts a push or replace (per
	/// [`Location::replace`]).
	pub fn new<E, N>(ensure_url: E, navigate: N) -> Self
	where
		E: Fn(bool) + 'static,
		N: Fn(Location) + 'static,
	{
		Self {
			ensure_url: Rc::new(ensure_url),
			navigate: Rc::new(navigate),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
	BeforeEach,
	BeforeResolve,
	AfterEach,
}

#[derive(Default)]
struct Hooks {
	next_id: u64,
	before_each: Vec<(u64, NavigationGuard)>,
	before_resolve: Vec<(u64, NavigationGuard)>,
	after_each: Vec<(u64, AfterHook)>,
}

impl Hooks {
	fn allocate(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}
}

/// Registration of a global hook. Call [`HookHandle::remove`] to unregister.
#[must_use = "dropping the handle keeps the hook registered; call `remove` to unregister it"]
pub struct HookHandle {
	id: u64,
	kind: HookKind,
	hooks: Weak<RefCell<Hooks>>,
}

impl HookHandle {
	/// Unregisters the hook. Transitions already running keep their snapshot.
	pub fn remove(self) {
		let Some(hooks) = self.hooks.upgrade() else {
			return;
		};
		let mut hooks = hooks.borrow_mut();
		match self.kind {
			HookKind::BeforeEach => hooks.before_each.retain(|(id, _)| *id != self.id),
			HookKind::BeforeResolve => hooks.before_resolve.retain(|(id, _)| *id != self.id),
			HookKind::AfterEach => hooks.after_each.retain(|(id, _)| *id != self.id),
		}
	}
}

impl std::fmt::Debug for HookHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HookHandle")
			.field("id", &self.id)
			.field("kind", &self.kind)
			.finish()
	}
}

struct State {
	current: Route,
	pending: Option<Route>,
	generation: u64,
	ready: bool,
	ready_callbacks: Vec<CompleteCallback>,
	ready_error_callbacks: Vec<Box<dyn FnOnce(&NavigationFailure)>>,
	error_callbacks: Vec<Rc<dyn Fn(&NavigationFailure)>>,
	listener: Option<Rc<dyn Fn(&Route)>>,
}

struct Inner {
	matcher: Rc<RefCell<RouteMatcher>>,
	hooks: Rc<RefCell<Hooks>>,
	state: RefCell<State>,
	link: RefCell<Option<BackendLink>>,
}

/// Owns the committed route and drives transitions towards new ones.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct TransitionController {
	inner: Rc<Inner>,
}

impl std::fmt::Debug for TransitionController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.borrow();
		f.debug_struct("TransitionController")
			.field("current", &state.current.full_path)
			.field("pending", &state.pending.as_ref().map(|r| r.full_path.clone()))
			.field("ready", &state.ready)
			.finish_non_exhaustive()
	}
}

impl TransitionController {
	/// Creates a controller starting at [`Route::start`].
	pub fn new(matcher: Rc<RefCell<RouteMatcher>>) -> Self {
		Self {
			inner: Rc::new(Inner {
				matcher,
				hooks: Rc::new(RefCell::new(Hooks::default())),
				state: RefCell::new(State {
					current: Route::start(),
					pending: None,
					generation: 0,
					ready: false,
					ready_callbacks: Vec::new(),
					ready_error_callbacks: Vec::new(),
					error_callbacks: Vec::new(),
					listener: None,
				}),
				link: RefCell::new(None),
			}),
		}
	}

	/// The shared route matcher.
	pub fn matcher(&self) -> &Rc<RefCell<RouteMatcher>> {
		&self.inner.matcher
	}

	/// Connects the owning backend.
	pub fn attach(&self, link: BackendLink) {
		*self.inner.link.borrow_mut() = Some(link);
	}

	/// The committed route.
	pub fn current(&self) -> Route {
		self.inner.state.borrow().current.clone()
	}

	/// The route of the transition in flight, if any.
	pub fn pending(&self) -> Option<Route> {
		self.inner.state.borrow().pending.clone()
	}

	/// Whether the initial navigation has settled.
	pub fn is_ready(&self) -> bool {
		self.inner.state.borrow().ready
	}

	/// Sets the callback run whenever a route is committed.
	pub fn listen<F>(&self, listener: F)
	where
		F: Fn(&Route) + 'static,
	{
		self.inner.state.borrow_mut().listener = Some(Rc::new(listener));
	}

	/// Registers a guard run before every navigation.
	pub fn before_each<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) + 'static,
	{
		let mut hooks = self.inner.hooks.borrow_mut();
		let id = hooks.allocate();
		hooks.before_each.push((id, Rc::new(guard)));
		self.handle(id, HookKind::BeforeEach)
	}

	/// Registers a guard run after every in-component and route guard.
	pub fn before_resolve<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) + 'static,
	{
		let mut hooks = self.inner.hooks.borrow_mut();
		let id = hooks.allocate();
		hooks.before_resolve.push((id, Rc::new(guard)));
		self.handle(id, HookKind::BeforeResolve)
	}

	/// Registers a hook run after every committed navigation.
	pub fn after_each<F>(&self, hook: F) -> HookHandle
	where
		F: Fn(&Route, &Route) + 'static,
	{
		let mut hooks = self.inner.hooks.borrow_mut();
		let id = hooks.allocate();
		hooks.after_each.push((id, Rc::new(hook)));
		self.handle(id, HookKind::AfterEach)
	}

	fn handle(&self, id: u64, kind: HookKind) -> HookHandle {
		HookHandle {
			id,
			kind,
			hooks: Rc::downgrade(&self.inner.hooks),
		}
	}

	/// Runs `callback` once the initial navigation commits, or right away if
	/// it already has. `on_error` runs instead if the initial navigation fails.
	pub fn on_ready<F>(&self, callback: F, on_error: Option<Box<dyn FnOnce(&NavigationFailure)>>)
	where
		F: FnOnce(&Route) + 'static,
	{
		let mut state = self.inner.state.borrow_mut();
		if state.ready {
			let current = state.current.clone();
			drop(state);
			callback(&current);
			return;
		}
		state.ready_callbacks.push(Box::new(callback));
		if let Some(on_error) = on_error {
			state.ready_error_callbacks.push(on_error);
		}
	}

	/// Registers a callback for navigations rejected by a guard.
	pub fn on_error<F>(&self, callback: F)
	where
		F: Fn(&NavigationFailure) + 'static,
	{
		self.inner
			.state
			.borrow_mut()
			.error_callbacks
			.push(Rc::new(callback));
	}

	/// Resolves `location` against the current route and transitions to it.
	///
	/// `on_complete` runs after the route is committed and before the
	/// `after_each` hooks; `on_abort` receives the failure otherwise.
	pub fn transition_to(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		let prev = self.current();
		let route = self
			.inner
			.matcher
			.borrow()
			.match_location(location, Some(&prev), None);
		tracing::debug!(target: "reinhardt_history", from = %prev.full_path, to = %route.full_path, "navigation started");

		let committed = self.clone();
		let committed_prev = prev.clone();
		let failed = self.clone();
		self.confirm_transition(
			route,
			Box::new(move |route: &Route| {
				committed.update_route(route.clone());
				if let Some(on_complete) = on_complete {
					on_complete(route);
				}
				committed.run_after_hooks(route, &committed_prev);
				committed.settle_ready(route);
			}),
			Some(Box::new(move |failure: NavigationFailure| {
				let ready_failure = failure.clone();
				if let Some(on_abort) = on_abort {
					on_abort(failure);
				}
				failed.settle_ready_failure(&ready_failure, &prev);
			})),
		);
	}

	/// Runs the guard pipeline for an already resolved route.
	///
	/// `on_complete` runs once every guard has passed and no newer transition
	/// has started; committing the route is up to the caller.
	pub fn confirm_transition(
		&self,
		route: Route,
		on_complete: CompleteCallback,
		on_abort: Option<AbortCallback>,
	) {
		let current = self.current();
		let generation = {
			let mut state = self.inner.state.borrow_mut();
			state.generation += 1;
			state.pending = Some(route.clone());
			state.generation
		};
		let abort = Rc::new(AbortSlot {
			controller: self.clone(),
			callback: RefCell::new(on_abort),
		});

		if route.is_same(&current, false) && same_leaf(&route, &current) {
			self.inner.state.borrow_mut().pending = None;
			self.ensure_url(false);
			abort.fail(NavigationFailure::duplicated(&current, &route));
			return;
		}

		let (updated, deactivated, activated) = resolve_queue(&current.matched, &route.matched);

		let mut queue = component_guards(&deactivated, |c| c.before_route_leave());
		queue.reverse();
		queue.extend(
			self.inner
				.hooks
				.borrow()
				.before_each
				.iter()
				.map(|(_, guard)| Some(Rc::clone(guard))),
		);
		queue.extend(component_guards(&updated, |c| c.before_route_update()));
		queue.extend(activated.iter().map(|record| record.before_enter().cloned()));

		let route = Rc::new(route);
		let current = Rc::new(current);
		let step = self.guard_step(&route, &current, generation, &abort);
		let this = self.clone();

		run_queue(queue, step, move || {
			let mut queue = component_guards(&activated, |c| c.before_route_enter());
			queue.extend(
				this.inner
					.hooks
					.borrow()
					.before_resolve
					.iter()
					.map(|(_, guard)| Some(Rc::clone(guard))),
			);
			let step = this.guard_step(&route, &current, generation, &abort);
			let controller = this.clone();

			run_queue(queue, step, move || {
				if !controller.is_pending(generation) {
					abort.fail(NavigationFailure::cancelled(&current, &route));
					return;
				}
				controller.inner.state.borrow_mut().pending = None;
				tracing::debug!(target: "reinhardt_history", to = %route.full_path, "navigation confirmed");
				on_complete(&route);
			});
		});
	}

	fn guard_step(
		&self,
		route: &Rc<Route>,
		current: &Rc<Route>,
		generation: u64,
		abort: &Rc<AbortSlot>,
	) -> impl FnMut(NavigationGuard, Advance) + 'static {
		let this = self.clone();
		let route = Rc::clone(route);
		let current = Rc::clone(current);
		let abort = Rc::clone(abort);
		move |guard, advance| {
			if !this.is_pending(generation) {
				abort.fail(NavigationFailure::cancelled(&current, &route));
				return;
			}
			let controller = this.clone();
			let to = Rc::clone(&route);
			let from = Rc::clone(&current);
			let abort = Rc::clone(&abort);
			let next = Next::new(move |decision| {
				if !controller.is_pending(generation) {
					abort.fail(NavigationFailure::cancelled(&from, &to));
					return;
				}
				match decision {
					GuardDecision::Proceed => advance.advance(),
					GuardDecision::Abort => {
						controller.ensure_url(true);
						abort.fail(NavigationFailure::aborted(&from, &to));
					}
					GuardDecision::Reject(reason) => {
						controller.ensure_url(true);
						abort.fail(NavigationFailure::rejected(&from, &to, reason));
					}
					GuardDecision::Redirect(location) => {
						abort.fail(NavigationFailure::redirected(&from, &to));
						controller.navigate(location);
					}
				}
			});
			guard(&route, &current, next);
		}
	}

	fn is_pending(&self, generation: u64) -> bool {
		let state = self.inner.state.borrow();
		state.generation == generation && state.pending.is_some()
	}

	/// Makes `route` the current route and notifies the `listen` callback.
	pub fn update_route(&self, route: Route) {
		let listener = {
			let mut state = self.inner.state.borrow_mut();
			state.current = route.clone();
			state.listener.clone()
		};
		if let Some(listener) = listener {
			listener(&route);
		}
	}

	/// Runs the `after_each` hooks.
	pub fn run_after_hooks(&self, to: &Route, from: &Route) {
		let hooks: Vec<AfterHook> = self
			.inner
			.hooks
			.borrow()
			.after_each
			.iter()
			.map(|(_, hook)| Rc::clone(hook))
			.collect();
		for hook in hooks {
			hook(to, from);
		}
	}

	fn settle_ready(&self, route: &Route) {
		let callbacks = {
			let mut state = self.inner.state.borrow_mut();
			if state.ready {
				return;
			}
			state.ready = true;
			state.ready_error_callbacks.clear();
			std::mem::take(&mut state.ready_callbacks)
		};
		for callback in callbacks {
			callback(route);
		}
	}

	fn settle_ready_failure(&self, failure: &NavigationFailure, prev: &Route) {
		// A redirect away from the start route is followed by another
		// navigation that will settle readiness instead.
		if failure.is_failure_type(NavigationFailureType::Redirected) && prev.is_start() {
			return;
		}
		let callbacks = {
			let mut state = self.inner.state.borrow_mut();
			if state.ready {
				return;
			}
			state.ready = true;
			state.ready_callbacks.clear();
			std::mem::take(&mut state.ready_error_callbacks)
		};
		for callback in callbacks {
			callback(failure);
		}
	}

	fn notify_error(&self, failure: &NavigationFailure) {
		let callbacks = self.inner.state.borrow().error_callbacks.clone();
		if callbacks.is_empty() {
			tracing::warn!(target: "reinhardt_history", "uncaught navigation error: {}", failure);
		}
		for callback in callbacks {
			callback(failure);
		}
	}

	/// Asks the backend to reconcile the address with the current route.
	pub fn ensure_url(&self, push: bool) {
		let link = self.inner.link.borrow().clone();
		if let Some(link) = link {
			(link.ensure_url)(push);
		}
	}

	fn navigate(&self, location: Location) {
		let link = self.inner.link.borrow().clone();
		match link {
			Some(link) => (link.navigate)(location),
			None => {
				tracing::warn!(target: "reinhardt_history", "guard redirect ignored: no backend attached");
			}
		}
	}

	/// Resets to the start route and drops any pending transition.
	pub fn teardown(&self) {
		let mut state = self.inner.state.borrow_mut();
		state.current = Route::start();
		state.pending = None;
		state.generation += 1;
	}
}

struct AbortSlot {
	controller: TransitionController,
	callback: RefCell<Option<AbortCallback>>,
}

impl AbortSlot {
	fn fail(&self, failure: NavigationFailure) {
		if failure.is_failure_type(NavigationFailureType::Rejected) {
			self.controller.notify_error(&failure);
		} else {
			tracing::debug!(target: "reinhardt_history", "{}", failure);
		}
		let callback = self.callback.borrow_mut().take();
		if let Some(callback) = callback {
			callback(failure);
		}
	}
}

fn same_leaf(left: &Route, right: &Route) -> bool {
	left.matched.len() == right.matched.len()
		&& match (left.leaf(), right.leaf()) {
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		}
}

type Records = Vec<Rc<RouteRecord>>;

/// Splits matched records into `(updated, deactivated, activated)` at the
/// first position where the two chains differ.
fn resolve_queue(current: &[Rc<RouteRecord>], next: &[Rc<RouteRecord>]) -> (Records, Records, Records) {
	let shared = current
		.iter()
		.zip(next)
		.take_while(|(a, b)| Rc::ptr_eq(a, b))
		.count();
	(
		next[..shared].to_vec(),
		current[shared..].to_vec(),
		next[shared..].to_vec(),
	)
}

/// In-component guards of `records`, outermost record first and slots in
/// name order.
fn component_guards<F>(records: &[Rc<RouteRecord>], extract: F) -> Vec<Option<NavigationGuard>>
where
	F: Fn(&dyn RouteComponent) -> Option<NavigationGuard>,
{
	let mut guards = Vec::new();
	for record in records {
		let mut slots: Vec<_> = record.components().iter().collect();
		slots.sort_by(|a, b| a.0.cmp(b.0));
		guards.extend(
			slots
				.into_iter()
				.filter_map(|(_, component)| extract(&**component))
				.map(Some),
		);
	}
	guards
}
