//! Fragment backend: routes live after the `#` of the address.

use std::rc::{Rc, Weak};

use reinhardt_route_map::{Location, Route, clean_path};

use crate::backend::{Listeners, NavigationBackend, and_then, normalize_base};
use crate::env::{BrowserEnvironment, NavigationEvent};
use crate::html5::get_location;
use crate::scroll::ScrollBehavior;
use crate::transition::{AbortCallback, BackendLink, CompleteCallback, TransitionController};

/// What construction had to do to the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashReadiness {
	/// The address already carried a `#/` route.
	Ready,
	/// A leading `/` was inserted into the fragment. The address read before
	/// the repair is stale, so no initial transition should run.
	SlashInserted,
	/// The address was moved under `base/#`, which reloads the page. No
	/// initial transition should run.
	Redirected,
}

/// The fragment of `href`, without the `#`. Empty when there is none.
pub fn get_hash(href: &str) -> &str {
	href.split_once('#').map_or("", |(_, hash)| hash)
}

/// `href` with its fragment replaced by `path`.
fn get_url(href: &str, path: &str) -> String {
	let base = href.split_once('#').map_or(href, |(before, _)| before);
	format!("{}#{}", base, path)
}

struct HashInner {
	controller: TransitionController,
	env: Rc<dyn BrowserEnvironment>,
	base: String,
	scroll: Option<Rc<dyn ScrollBehavior>>,
	listeners: Listeners,
	readiness: HashReadiness,
}

/// Backend persisting routes in the URL fragment.
///
/// With push-state support, fragments are written with
/// `history.pushState` and traversal is observed through `popstate`;
/// otherwise `location.hash` is assigned and `hashchange` is observed.
#[derive(Clone)]
pub struct HashBackend {
	inner: Rc<HashInner>,
}

impl std::fmt::Debug for HashBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HashBackend")
			.field("base", &self.inner.base)
			.field("readiness", &self.inner.readiness)
			.field("current", &self.current().full_path)
			.field("listeners", &self.inner.listeners.len())
			.finish()
	}
}

impl HashBackend {
	/// Creates the backend and attaches it to `controller`.
	///
	/// `fallback` marks a backend standing in for the push-state backend on a
	/// host without push-state. A path-style address such as `/app/users` is
	/// then moved to `/app/#/users`.
	pub fn new(
		controller: TransitionController,
		env: Rc<dyn BrowserEnvironment>,
		base: &str,
		fallback: bool,
		scroll: Option<Rc<dyn ScrollBehavior>>,
	) -> Self {
		let base = normalize_base(base);
		let readiness = if fallback && !env.supports_push_state() && check_fallback(env.as_ref(), &base) {
			HashReadiness::Redirected
		} else if ensure_slash(env.as_ref()) {
			HashReadiness::Ready
		} else {
			HashReadiness::SlashInserted
		};
		tracing::debug!(target: "reinhardt_history", ?readiness, base = %base, "hash backend created");

		let backend = Self {
			inner: Rc::new(HashInner {
				controller,
				env,
				base,
				scroll,
				listeners: Listeners::default(),
				readiness,
			}),
		};
		backend.attach();
		backend
	}

	/// What construction did to the address.
	pub fn readiness(&self) -> HashReadiness {
		self.inner.readiness
	}

	fn attach(&self) {
		let ensure = Rc::downgrade(&self.inner);
		let navigate = Rc::downgrade(&self.inner);
		self.inner.controller.attach(BackendLink::new(
			move |push| {
				if let Some(backend) = Self::upgrade(&ensure) {
					backend.ensure_url(push);
				}
			},
			move |location| {
				if let Some(backend) = Self::upgrade(&navigate) {
					backend.navigate(location);
				}
			},
		));
	}

	fn upgrade(inner: &Weak<HashInner>) -> Option<Self> {
		inner.upgrade().map(|inner| Self { inner })
	}

	fn scroll_enabled(&self) -> Option<Rc<dyn ScrollBehavior>> {
		if self.inner.env.supports_push_state() {
			self.inner.scroll.clone()
		} else {
			None
		}
	}

	fn push_hash(&self, path: &str) {
		push_hash(self.inner.env.as_ref(), path);
	}

	fn replace_hash(&self, path: &str) {
		replace_hash(self.inner.env.as_ref(), path);
	}

	fn navigate_with(
		&self,
		location: Location,
		replace: bool,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		let from = self.current();
		let weak = Rc::downgrade(&self.inner);
		self.transition_to(
			location,
			Some(Box::new(move |route: &Route| {
				if let Some(backend) = Self::upgrade(&weak) {
					if replace {
						backend.replace_hash(&route.full_path);
					} else {
						backend.push_hash(&route.full_path);
					}
					if let Some(scroll) = backend.scroll_enabled() {
						scroll.handle(route, &from, false);
					}
				}
				if let Some(on_complete) = on_complete {
					on_complete(route);
				}
			})),
			on_abort,
		);
	}

	fn handle_routing_event(&self) {
		let current = self.current();
		if !ensure_slash(self.inner.env.as_ref()) {
			return;
		}
		let scroll = self.scroll_enabled();
		let weak = Rc::downgrade(&self.inner);
		self.transition_to(
			Location::path(self.current_location()),
			Some(Box::new(move |route: &Route| {
				if let Some(scroll) = scroll {
					scroll.handle(route, &current, true);
				}
				if let Some(backend) = Self::upgrade(&weak)
					&& !backend.inner.env.supports_push_state()
				{
					backend.replace_hash(&route.full_path);
				}
			})),
			None,
		);
	}
}

/// Moves a path-style address under `base/#`. Returns whether it did.
fn check_fallback(env: &dyn BrowserEnvironment, base: &str) -> bool {
	let location = get_location(&env.href(), base);
	if location.starts_with("/#") {
		return false;
	}
	env.replace_location(&clean_path(&format!("{}/#{}", base, location)));
	true
}

/// Makes the fragment start with `/`. Returns whether it already did.
fn ensure_slash(env: &dyn BrowserEnvironment) -> bool {
	let href = env.href();
	let path = get_hash(&href);
	if path.starts_with('/') {
		return true;
	}
	replace_hash(env, &format!("/{}", path));
	false
}

fn push_hash(env: &dyn BrowserEnvironment, path: &str) {
	if env.supports_push_state() {
		env.push_state(&get_url(&env.href(), path));
	} else {
		env.assign_hash(path);
	}
}

fn replace_hash(env: &dyn BrowserEnvironment, path: &str) {
	let url = get_url(&env.href(), path);
	if env.supports_push_state() {
		env.replace_state(&url);
	} else {
		env.replace_location(&url);
	}
}

impl NavigationBackend for HashBackend {
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
		let weak = Rc::downgrade(&self.inner);
		let on_complete = and_then(on_complete, move || {
			if let Some(backend) = Self::upgrade(&weak) {
				backend.ensure_url(false);
			}
		});
		self.inner
			.controller
			.transition_to(location, Some(on_complete), on_abort);
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

	fn go(&self, delta: i32) {
		self.inner.env.go(delta);
	}

	fn ensure_url(&self, push: bool) {
		let current = self.current().full_path;
		if self.current_location() != current {
			if push {
				self.push_hash(&current);
			} else {
				self.replace_hash(&current);
			}
		}
	}

	fn current_location(&self) -> String {
		get_hash(&self.inner.env.href()).to_string()
	}

	fn setup_listeners(&self) {
		if !self.inner.listeners.is_empty() {
			return;
		}
		if let Some(teardown) = self.scroll_enabled().and_then(|scroll| scroll.setup()) {
			self.inner.listeners.push(teardown);
		}
		let event = NavigationEvent::for_environment(self.inner.env.supports_push_state());
		let weak = Rc::downgrade(&self.inner);
		let teardown = self.inner.env.subscribe(
			event,
			Rc::new(move || {
				if let Some(backend) = Self::upgrade(&weak) {
					backend.handle_routing_event();
				}
			}),
		);
		self.inner.listeners.push(teardown);
	}

	fn listener_count(&self) -> usize {
		self.inner.listeners.len()
	}

	fn teardown(&self) {
		self.inner.listeners.release();
		self.inner.controller.teardown();
	}
}
