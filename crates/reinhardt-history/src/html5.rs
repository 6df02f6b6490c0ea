//! Push-state backend: routes live in the address path.

use std::borrow::Cow;
use std::rc::{Rc, Weak};

use reinhardt_route_map::{Location, Route, clean_path, encode_path};
use url::Url;

use crate::backend::{Listeners, NavigationBackend, and_then, join_base, normalize_base};
use crate::env::{BrowserEnvironment, NavigationEvent};
use crate::scroll::ScrollBehavior;
use crate::transition::{AbortCallback, BackendLink, CompleteCallback, TransitionController};

/// Reads the router location (`path?query#hash`) from `href`, with `base`
/// stripped from the front of the path. Base matching ignores case.
///
/// The path is brought to the escaping that route locations use, so a
/// committed route compares equal to the address it was written to.
pub fn get_location(href: &str, base: &str) -> String {
	let url = match Url::parse(href) {
		Ok(url) => url,
		Err(e) => {
			tracing::warn!(target: "reinhardt_history", "cannot parse address \"{}\": {}", href, e);
			return "/".to_string();
		}
	};

	let raw_path = url.path();
	let decoded = urlencoding::decode(raw_path).unwrap_or(Cow::Borrowed(raw_path));
	let mut path = encode_path(&decoded);
	let lower_path = path.to_lowercase();
	let lower_base = base.to_lowercase();
	if !base.is_empty()
		&& (lower_path == lower_base
			|| lower_path.starts_with(&clean_path(&format!("{}/", lower_base))))
	{
		path = path.get(base.len()..).unwrap_or_default().to_string();
	}

	let query = url
		.query()
		.filter(|q| !q.is_empty())
		.map(|q| format!("?{}", q))
		.unwrap_or_default();
	let hash = url
		.fragment()
		.filter(|f| !f.is_empty())
		.map(|f| format!("#{}", f))
		.unwrap_or_default();
	let path = if path.is_empty() { "/" } else { path.as_str() };
	format!("{}{}{}", path, query, hash)
}

struct Html5Inner {
	controller: TransitionController,
	env: Rc<dyn BrowserEnvironment>,
	base: String,
	scroll: Option<Rc<dyn ScrollBehavior>>,
	listeners: Listeners,
	start_location: String,
}

/// Backend persisting routes with `history.pushState`.
///
/// The first `popstate` some browsers fire on page load is ignored while the
/// address is still the one the backend started from.
#[derive(Clone)]
pub struct Html5Backend {
	inner: Rc<Html5Inner>,
}

impl std::fmt::Debug for Html5Backend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Html5Backend")
			.field("base", &self.inner.base)
			.field("current", &self.current().full_path)
			.field("listeners", &self.inner.listeners.len())
			.finish()
	}
}

impl Html5Backend {
	/// Creates the backend and attaches it to `controller`.
	pub fn new(
		controller: TransitionController,
		env: Rc<dyn BrowserEnvironment>,
		base: &str,
		scroll: Option<Rc<dyn ScrollBehavior>>,
	) -> Self {
		let base = normalize_base(base);
		let start_location = get_location(&env.href(), &base);
		let backend = Self {
			inner: Rc::new(Html5Inner {
				controller,
				env,
				base,
				scroll,
				listeners: Listeners::default(),
				start_location,
			}),
		};
		backend.attach();
		backend
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

	fn upgrade(inner: &Weak<Html5Inner>) -> Option<Self> {
		inner.upgrade().map(|inner| Self { inner })
	}

	fn scroll_enabled(&self) -> Option<Rc<dyn ScrollBehavior>> {
		if self.inner.env.supports_push_state() {
			self.inner.scroll.clone()
		} else {
			None
		}
	}

	fn persist(&self, route: &Route, replace: bool) {
		let url = join_base(&self.inner.base, &route.full_path);
		if replace {
			self.inner.env.replace_state(&url);
		} else {
			self.inner.env.push_state(&url);
		}
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
					backend.persist(route, replace);
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

	fn handle_pop(&self) {
		let current = self.current();
		let location = self.current_location();
		if current.is_start() && location == self.inner.start_location {
			return;
		}
		let scroll = self.scroll_enabled();
		self.transition_to(
			Location::path(location),
			Some(Box::new(move |route: &Route| {
				if let Some(scroll) = scroll {
					scroll.handle(route, &current, true);
				}
			})),
			None,
		);
	}
}

impl NavigationBackend for Html5Backend {
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
		let current = self.current();
		if self.current_location() != current.full_path {
			self.persist(&current, !push);
		}
	}

	fn current_location(&self) -> String {
		get_location(&self.inner.env.href(), &self.inner.base)
	}

	fn setup_listeners(&self) {
		if !self.inner.listeners.is_empty() {
			return;
		}
		if let Some(teardown) = self.scroll_enabled().and_then(|scroll| scroll.setup()) {
			self.inner.listeners.push(teardown);
		}
		let weak = Rc::downgrade(&self.inner);
		let teardown = self.inner.env.subscribe(
			NavigationEvent::PopState,
			Rc::new(move || {
				if let Some(backend) = Self::upgrade(&weak) {
					backend.handle_pop();
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

#[cfg(test)]
mod tests {
	use super::*;
	use crate::env::{EnvMutation, MemoryEnvironment};
	use reinhardt_route_map::{RouteConfig, RouteMatcher};
	use rstest::rstest;
	use std::cell::RefCell;

	fn backend(env: &MemoryEnvironment, base: &str) -> Html5Backend {
		let matcher = RouteMatcher::new(&[
			RouteConfig::new("/"),
			RouteConfig::new("/foo"),
			RouteConfig::new("/bar"),
		])
		.unwrap();
		let controller = TransitionController::new(Rc::new(RefCell::new(matcher)));
		Html5Backend::new(controller, Rc::new(env.clone()), base, None)
	}

	#[rstest]
	#[case("https://x/app/foo?a=1#top", "/app", "/foo?a=1#top")]
	#[case("https://x/APP/foo", "/app", "/foo")]
	#[case("https://x/app", "/app", "/")]
	#[case("https://x/application", "/app", "/application")]
	#[case("https://x/caf%C3%A9", "", "/caf%C3%A9")]
	#[case("https://x/tags/a%20b", "", "/tags/a%20b")]
	fn test_get_location(#[case] href: &str, #[case] base: &str, #[case] expected: &str) {
		assert_eq!(get_location(href, base), expected);
	}

	#[rstest]
	fn test_push_writes_base_prefixed_path() {
		let env = MemoryEnvironment::new("https://x/app/");
		let backend = backend(&env, "/app/");

		backend.push(Location::path("/foo"), None, None);

		assert_eq!(env.href(), "https://x/app/foo");
		assert_eq!(env.mutations(), vec![EnvMutation::PushState("/app/foo".to_string())]);
	}

	#[rstest]
	fn test_popstate_transitions_to_address() {
		// Arrange
		let env = MemoryEnvironment::new("https://x/");
		let backend = backend(&env, "");
		backend.transition_to(Location::path(backend.current_location()), None, None);
		backend.setup_listeners();
		backend.push(Location::path("/foo"), None, None);

		// Act
		env.go(-1);

		// Assert
		assert_eq!(backend.current().path, "/");
	}

	#[rstest]
	fn test_initial_popstate_is_ignored() {
		let env = MemoryEnvironment::new("https://x/bar");
		let backend = backend(&env, "");
		backend.setup_listeners();

		env.fire(NavigationEvent::PopState);

		assert!(backend.current().is_start());
	}

	#[rstest]
	fn test_teardown_releases_listeners() {
		let env = MemoryEnvironment::new("https://x/");
		let backend = backend(&env, "");
		backend.setup_listeners();
		backend.setup_listeners();
		assert_eq!(env.subscription_count(), 1);

		backend.teardown();

		assert_eq!(env.subscription_count(), 0);
		assert_eq!(backend.listener_count(), 0);
		assert!(backend.current().is_start());
	}
}
