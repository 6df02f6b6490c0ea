//! The router facade.
//!
//! [`Router`] wires a [`RouteMatcher`], a [`TransitionController`] and the
//! backend chosen by [`RouterOptions::mode`] together.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use reinhardt_history::{
	AbortCallback, BrowserEnvironment, CompleteCallback, HashBackend, HashReadiness, HookHandle,
	Html5Backend, MemoryBackend, NavigationBackend, NavigationFailure, ScrollBehavior,
	TransitionController,
};
use reinhardt_route_map::{
	Location, Next, Route, RouteConfig, RouteMatcher, RouteRecord, clean_path,
};

use crate::error::RouterResult;
use crate::options::{RouterMode, RouterOptions};

/// The outcome of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
	/// The normalized target.
	pub location: Location,
	/// The route the target matches.
	pub route: Route,
	/// The address to link to, including base and mode prefix.
	pub href: String,
}

/// Builds the address for `full_path` under `base`.
///
/// Hash mode prefixes the path with `#`.
pub fn create_href(base: &str, full_path: &str, mode: RouterMode) -> String {
	let path = if mode == RouterMode::Hash {
		format!("#{}", full_path)
	} else {
		full_path.to_string()
	};
	if base.is_empty() {
		path
	} else {
		clean_path(&format!("{}/{}", base, path))
	}
}

/// Assembles a [`Router`].
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use reinhardt_history::MemoryEnvironment;
/// use reinhardt_navigation::{RouterBuilder, RouterMode, RouterOptions};
/// use reinhardt_route_map::RouteConfig;
///
/// let env = MemoryEnvironment::new("https://example.com/#/about");
/// let router = RouterBuilder::new()
///     .routes(vec![RouteConfig::new("/"), RouteConfig::new("/about")])
///     .options(RouterOptions::new().with_mode(RouterMode::Hash))
///     .environment(Rc::new(env))
///     .build()
///     .unwrap();
///
/// router.init();
/// assert_eq!(router.current_route().path, "/about");
/// ```
#[derive(Default)]
pub struct RouterBuilder {
	routes: Vec<RouteConfig>,
	options: RouterOptions,
	environment: Option<Rc<dyn BrowserEnvironment>>,
	scroll_behavior: Option<Rc<dyn ScrollBehavior>>,
}

impl std::fmt::Debug for RouterBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterBuilder")
			.field("routes", &self.routes.len())
			.field("options", &self.options)
			.field("environment", &self.environment.is_some())
			.field("scroll_behavior", &self.scroll_behavior.is_some())
			.finish()
	}
}

impl RouterBuilder {
	/// Starts with no routes and default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the route configuration.
	pub fn routes(mut self, routes: Vec<RouteConfig>) -> Self {
		self.routes = routes;
		self
	}

	/// Appends one top-level route.
	pub fn route(mut self, route: RouteConfig) -> Self {
		self.routes.push(route);
		self
	}

	/// Sets the router options.
	pub fn options(mut self, options: RouterOptions) -> Self {
		self.options = options;
		self
	}

	/// Sets the address-bar environment. Without one, the router runs in
	/// abstract mode.
	pub fn environment(mut self, environment: Rc<dyn BrowserEnvironment>) -> Self {
		self.environment = Some(environment);
		self
	}

	/// Sets the scroll behavior used on hosts with push-state support.
	pub fn scroll_behavior(mut self, scroll: Rc<dyn ScrollBehavior>) -> Self {
		self.scroll_behavior = Some(scroll);
		self
	}

	/// Compiles the routes and creates the backend.
	pub fn build(self) -> RouterResult<Router> {
		let Self {
			routes,
			options,
			environment,
			scroll_behavior,
		} = self;

		let matcher = RouteMatcher::with_diagnostics(&routes, options.resolve_diagnostics())?;
		let matcher = Rc::new(RefCell::new(matcher));
		let controller = TransitionController::new(Rc::clone(&matcher));

		let fallback = options.mode == RouterMode::History
			&& options.fallback
			&& environment
				.as_ref()
				.is_some_and(|env| !env.supports_push_state());
		let requested = if fallback {
			RouterMode::Hash
		} else {
			options.mode
		};

		let mut hash_readiness = None;
		let (mode, backend) = match (requested, environment) {
			(RouterMode::Hash, Some(env)) => {
				let backend = HashBackend::new(
					controller.clone(),
					env,
					&options.base,
					fallback,
					scroll_behavior,
				);
				hash_readiness = Some(backend.readiness());
				(RouterMode::Hash, Rc::new(backend) as Rc<dyn NavigationBackend>)
			}
			(RouterMode::History, Some(env)) => {
				let backend = Html5Backend::new(controller.clone(), env, &options.base, scroll_behavior);
				(RouterMode::History, Rc::new(backend) as Rc<dyn NavigationBackend>)
			}
			(requested, _) => {
				if requested != RouterMode::Abstract {
					tracing::debug!(target: "reinhardt_navigation", mode = %requested, "no browser environment, using abstract mode");
				}
				let backend = MemoryBackend::new(controller.clone(), &options.base);
				(RouterMode::Abstract, Rc::new(backend) as Rc<dyn NavigationBackend>)
			}
		};
		tracing::debug!(target: "reinhardt_navigation", mode = %mode, base = %backend.base(), "router created");

		Ok(Router {
			matcher,
			controller,
			backend,
			mode,
			options,
			hash_readiness,
			initialized: Cell::new(false),
		})
	}
}

/// Client-side router.
///
/// A router is single-threaded: callbacks run on the thread that drives
/// navigation, and guards resume transitions by calling their [`Next`].
pub struct Router {
	matcher: Rc<RefCell<RouteMatcher>>,
	controller: TransitionController,
	backend: Rc<dyn NavigationBackend>,
	mode: RouterMode,
	options: RouterOptions,
	hash_readiness: Option<HashReadiness>,
	initialized: Cell<bool>,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("mode", &self.mode)
			.field("base", &self.backend.base())
			.field("current", &self.current_route().full_path)
			.field("routes", &self.matcher.borrow().route_map().len())
			.finish()
	}
}

impl Router {
	/// Shorthand for [`RouterBuilder::new`].
	pub fn builder() -> RouterBuilder {
		RouterBuilder::new()
	}

	/// The mode actually in use, after fallbacks.
	pub fn mode(&self) -> RouterMode {
		self.mode
	}

	/// The options the router was built with.
	pub fn options(&self) -> &RouterOptions {
		&self.options
	}

	/// The active backend.
	pub fn history(&self) -> &dyn NavigationBackend {
		self.backend.as_ref()
	}

	/// Runs the initial navigation to the address, then subscribes to
	/// external navigation. Does nothing after the first call.
	///
	/// Abstract mode has no address to start from and waits for the first
	/// `push`. When the hash backend had to move the address under the base,
	/// the page reloads and the initial navigation is skipped. When it only
	/// inserted the leading slash, listeners are installed but the stale
	/// address is not navigated to.
	pub fn init(&self) {
		if self.initialized.replace(true) {
			return;
		}
		if self.mode == RouterMode::Abstract {
			return;
		}
		match self.hash_readiness {
			Some(HashReadiness::Redirected) => {
				tracing::debug!(target: "reinhardt_navigation", "address moved under the base, skipping initial navigation");
				return;
			}
			Some(HashReadiness::SlashInserted) => {
				tracing::debug!(target: "reinhardt_navigation", "fragment repaired, waiting for the next routing event");
				self.backend.setup_listeners();
				return;
			}
			Some(HashReadiness::Ready) | None => {}
		}

		let on_complete = Rc::downgrade(&self.backend);
		let on_abort = Weak::clone(&on_complete);
		let location = self.backend.current_location();
		self.backend.transition_to(
			Location::path(location),
			Some(Box::new(move |_: &Route| {
				if let Some(backend) = on_complete.upgrade() {
					backend.setup_listeners();
				}
			})),
			Some(Box::new(move |_: NavigationFailure| {
				if let Some(backend) = on_abort.upgrade() {
					backend.setup_listeners();
				}
			})),
		);
	}

	/// Sets the callback run whenever a route is committed.
	pub fn listen<F>(&self, listener: F)
	where
		F: Fn(&Route) + 'static,
	{
		self.controller.listen(listener);
	}

	/// The committed route.
	pub fn current_route(&self) -> Route {
		self.controller.current()
	}

	/// Navigates to `location`, adding a history entry.
	pub fn push(&self, location: impl Into<Location>) {
		self.backend.push(location.into(), None, None);
	}

	/// [`push`](Self::push) with completion and abort callbacks.
	pub fn push_with(
		&self,
		location: impl Into<Location>,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		self.backend.push(location.into(), on_complete, on_abort);
	}

	/// Navigates to `location`, replacing the current history entry.
	pub fn replace(&self, location: impl Into<Location>) {
		self.backend.replace(location.into(), None, None);
	}

	/// [`replace`](Self::replace) with completion and abort callbacks.
	pub fn replace_with(
		&self,
		location: impl Into<Location>,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	) {
		self.backend.replace(location.into(), on_complete, on_abort);
	}

	/// Moves through history by `delta` entries.
	pub fn go(&self, delta: i32) {
		self.backend.go(delta);
	}

	/// One entry back.
	pub fn back(&self) {
		self.go(-1);
	}

	/// One entry forward.
	pub fn forward(&self) {
		self.go(1);
	}

	/// Registers a guard run before every navigation.
	pub fn before_each<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) + 'static,
	{
		self.controller.before_each(guard)
	}

	/// Registers a guard run once in-component and route guards have passed.
	pub fn before_resolve<F>(&self, guard: F) -> HookHandle
	where
		F: Fn(&Route, &Route, Next) + 'static,
	{
		self.controller.before_resolve(guard)
	}

	/// Registers a hook run after every committed navigation.
	pub fn after_each<F>(&self, hook: F) -> HookHandle
	where
		F: Fn(&Route, &Route) + 'static,
	{
		self.controller.after_each(hook)
	}

	/// Runs `callback` once the initial navigation has committed.
	pub fn on_ready<F>(&self, callback: F, on_error: Option<Box<dyn FnOnce(&NavigationFailure)>>)
	where
		F: FnOnce(&Route) + 'static,
	{
		self.controller.on_ready(callback, on_error);
	}

	/// Registers a callback for navigations rejected by a guard.
	pub fn on_error<F>(&self, callback: F)
	where
		F: Fn(&NavigationFailure) + 'static,
	{
		self.controller.on_error(callback);
	}

	/// Resolves `to` without navigating.
	///
	/// Relative targets resolve against `current`, or the committed route.
	/// The `href` of a redirected target points at the original location.
	pub fn resolve(&self, to: impl Into<Location>, current: Option<&Route>, append: bool) -> Resolved {
		let committed;
		let current = match current {
			Some(current) => current,
			None => {
				committed = self.current_route();
				&committed
			}
		};
		let location = to.into().normalize(Some(current), append);
		let route = self
			.matcher
			.borrow()
			.match_location(location.clone(), Some(current), None);
		let full_path = route.redirected_from.as_deref().unwrap_or(&route.full_path);
		let href = create_href(self.backend.base(), full_path, self.mode);
		Resolved {
			location,
			route,
			href,
		}
	}

	/// Matches `raw` against the routes.
	pub fn match_route(&self, raw: impl Into<Location>, current: Option<&Route>) -> Route {
		self.matcher.borrow().match_location(raw, current, None)
	}

	/// Every registered record in path-list order.
	pub fn get_routes(&self) -> Vec<Rc<RouteRecord>> {
		self.matcher.borrow().routes()
	}

	/// Registers more top-level routes.
	///
	/// Once a route is committed, the address is matched again so that it
	/// can resolve to the new routes.
	pub fn add_routes(&self, routes: &[RouteConfig]) -> RouterResult<()> {
		self.matcher.borrow_mut().add_routes(routes)?;
		self.refresh();
		Ok(())
	}

	/// Registers one route, under the route named `parent` if given.
	pub fn add_route(&self, parent: Option<&str>, route: RouteConfig) -> RouterResult<()> {
		self.matcher.borrow_mut().add_route(parent, route)?;
		self.refresh();
		Ok(())
	}

	fn refresh(&self) {
		if !self.current_route().is_start() {
			self.backend
				.transition_to(Location::path(self.backend.current_location()), None, None);
		}
	}

	/// Releases every subscription and returns to the start route.
	/// [`init`](Self::init) may be called again afterwards.
	pub fn teardown(&self) {
		self.backend.teardown();
		self.initialized.set(false);
	}
}
