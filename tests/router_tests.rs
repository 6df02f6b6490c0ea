//! Integration tests for the router facade
//!
//! These tests verify:
//! 1. Mode selection and the hash fallback
//! 2. Initial navigation and listener setup
//! 3. Resolving links without navigating
//! 4. Adding routes at runtime
//! 5. Teardown

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reinhardt_navigation::prelude::*;
use reinhardt_navigation::history::{EnvMutation, NavigationEvent};
use reinhardt_navigation::route_map::ConfigurationError;
use rstest::*;

fn routes() -> Vec<RouteConfig> {
	vec![
		RouteConfig::new("/").name("home"),
		RouteConfig::new("/users/:id").name("user"),
		RouteConfig::new("/old").redirect("/users/1"),
	]
}

fn router(env: &MemoryEnvironment, options: RouterOptions) -> Router {
	Router::builder()
		.routes(routes())
		.options(options)
		.environment(Rc::new(env.clone()))
		.build()
		.unwrap()
}

#[rstest]
fn test_hash_init_navigates_to_fragment() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/users/3");
	let router = router(&env, RouterOptions::new());
	let ready = Rc::new(Cell::new(false));
	let flag = Rc::clone(&ready);
	router.on_ready(move |_| flag.set(true), None);

	// Act
	router.init();
	router.init();

	// Assert
	assert_eq!(router.mode(), RouterMode::Hash);
	assert_eq!(router.current_route().params["id"], "3");
	assert_eq!(router.history().listener_count(), 1);
	assert_eq!(env.subscription_count(), 1);
	assert!(ready.get());
}

#[rstest]
fn test_hash_init_after_slash_repair_waits_for_routing_event() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#users/3");
	let router = router(&env, RouterOptions::new());

	// Act
	router.init();
	let before_event = router.current_route();
	env.fire(NavigationEvent::PopState);

	// Assert
	assert_eq!(env.href(), "https://x/#/users/3");
	assert!(before_event.is_start());
	assert_eq!(router.history().listener_count(), 1);
	assert_eq!(router.current_route().params["id"], "3");
}

#[rstest]
fn test_history_falls_back_to_hash_without_push_state() {
	// Arrange
	let env = MemoryEnvironment::legacy("https://x/app/users/3");
	let options = RouterOptions::new()
		.with_mode(RouterMode::History)
		.with_base("/app");

	// Act
	let router = router(&env, options);
	router.init();

	// Assert
	assert_eq!(router.mode(), RouterMode::Hash);
	assert_eq!(
		env.mutations(),
		vec![EnvMutation::ReplaceLocation("/app/#/users/3".to_string())]
	);
	assert!(router.current_route().is_start());
}

#[rstest]
fn test_history_without_fallback_keeps_push_state_backend() {
	let env = MemoryEnvironment::legacy("https://x/users/3");
	let options = RouterOptions::new()
		.with_mode(RouterMode::History)
		.with_fallback(false);

	let router = router(&env, options);

	assert_eq!(router.mode(), RouterMode::History);
	assert!(env.mutations().is_empty());
}

#[rstest]
fn test_history_mode_strips_base() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/app/users/3");
	let options = RouterOptions::new()
		.with_mode(RouterMode::History)
		.with_base("/app/");
	let router = router(&env, options);
	router.init();

	// Act
	router.push("/");

	// Assert
	assert_eq!(router.history().base(), "/app");
	assert_eq!(router.current_route().name.as_deref(), Some("home"));
	assert_eq!(env.href(), "https://x/app/");
}

#[rstest]
fn test_options_from_json_drive_the_builder() {
	let env = MemoryEnvironment::new("https://x/users/5");
	let options = RouterOptions::from_json_str(r#"{"mode": "history", "diagnostics": false}"#).unwrap();

	let router = router(&env, options);
	router.init();

	assert_eq!(router.mode(), RouterMode::History);
	assert_eq!(router.current_route().path, "/users/5");
}

#[rstest]
#[case(RouterMode::Hash, "", "#/users/7")]
#[case(RouterMode::Hash, "/app", "/app/#/users/7")]
#[case(RouterMode::History, "/app", "/app/users/7")]
fn test_resolve_builds_href(#[case] mode: RouterMode, #[case] base: &str, #[case] expected: &str) {
	let env = MemoryEnvironment::new("https://x/");
	let router = router(&env, RouterOptions::new().with_mode(mode).with_base(base));

	let resolved = router.resolve(Location::named("user").with_param("id", "7"), None, false);

	assert_eq!(resolved.href, expected);
	assert_eq!(resolved.route.path, "/users/7");
	assert!(router.current_route().is_start());
}

#[rstest]
fn test_resolve_links_to_redirect_source() {
	let env = MemoryEnvironment::new("https://x/#/");
	let router = router(&env, RouterOptions::new());

	let resolved = router.resolve("/old", None, false);

	assert_eq!(resolved.route.path, "/users/1");
	assert_eq!(resolved.href, "#/old");
}

#[rstest]
fn test_resolve_relative_with_append() {
	let env = MemoryEnvironment::new("https://x/#/users/3");
	let router = router(&env, RouterOptions::new());
	router.init();

	let resolved = router.resolve("9", None, false);
	let appended = router.resolve("9", None, true);

	assert_eq!(resolved.location.path.as_deref(), Some("/users/9"));
	assert_eq!(appended.location.path.as_deref(), Some("/users/3/9"));
}

#[rstest]
fn test_redirect_route_navigates_to_target() {
	let env = MemoryEnvironment::new("https://x/#/");
	let router = router(&env, RouterOptions::new());
	router.init();

	router.push("/old");

	assert_eq!(router.current_route().path, "/users/1");
	assert_eq!(router.current_route().redirected_from.as_deref(), Some("/old"));
	assert_eq!(env.href(), "https://x/#/users/1");
}

#[rstest]
fn test_add_routes_rematches_current_address() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/later");
	let router = router(&env, RouterOptions::new());
	router.init();
	assert!(router.current_route().matched.is_empty());

	// Act
	router
		.add_routes(&[RouteConfig::new("/later").name("later")])
		.unwrap();

	// Assert
	assert_eq!(router.current_route().name.as_deref(), Some("later"));
	assert_eq!(router.get_routes().len(), 4);
}

#[rstest]
fn test_add_route_under_parent() {
	let env = MemoryEnvironment::new("https://x/#/");
	let router = router(&env, RouterOptions::new());

	router
		.add_route(Some("user"), RouteConfig::new("posts").name("user-posts"))
		.unwrap();

	let route = router.match_route(Location::named("user-posts").with_param("id", "2"), None);
	assert_eq!(route.path, "/users/2/posts");
	assert_eq!(route.matched.len(), 2);
}

#[rstest]
fn test_add_route_under_unknown_parent_fails() {
	let env = MemoryEnvironment::new("https://x/#/");
	let router = router(&env, RouterOptions::new());

	let result = router.add_route(Some("missing"), RouteConfig::new("child"));

	assert!(matches!(
		result,
		Err(RouterError::Configuration(ConfigurationError::UnknownParent(ref name))) if name == "missing"
	));
}

#[rstest]
fn test_invalid_configuration_fails_to_build() {
	let result = Router::builder()
		.route(RouteConfig::new("/bad/:id(?=x)"))
		.build();

	assert!(matches!(
		result,
		Err(RouterError::Configuration(ConfigurationError::InvalidPattern { .. }))
	));
}

#[rstest]
fn test_abstract_mode_walks_its_stack() {
	// Arrange
	let router = Router::builder().routes(routes()).build().unwrap();
	let visited = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&visited);
	let _hook = router.after_each(move |to, _| sink.borrow_mut().push(to.full_path.clone()));

	// Act
	router.push("/users/1");
	router.push("/users/2");
	router.back();
	router.forward();

	// Assert
	assert_eq!(router.mode(), RouterMode::Abstract);
	assert_eq!(
		*visited.borrow(),
		vec!["/users/1", "/users/2", "/users/1", "/users/2"]
	);
}

#[rstest]
fn test_rejected_navigation_reaches_on_error() {
	let router = Router::builder().routes(routes()).build().unwrap();
	let errors = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&errors);
	router.on_error(move |failure| sink.borrow_mut().push(failure.kind()));
	let _guard = router.before_each(|_, _, next| next.reject("offline"));

	router.push("/users/1");

	assert_eq!(*errors.borrow(), vec![NavigationFailureType::Rejected]);
	assert!(router.current_route().is_start());
}

#[rstest]
fn test_teardown_allows_reinit() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/users/3");
	let router = router(&env, RouterOptions::new());
	router.init();

	// Act
	router.teardown();
	let after_teardown = env.subscription_count();
	router.init();

	// Assert
	assert_eq!(after_teardown, 0);
	assert_eq!(env.subscription_count(), 1);
	assert_eq!(router.current_route().path, "/users/3");
}
