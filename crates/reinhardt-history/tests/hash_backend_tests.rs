//! Integration tests for the fragment backend
//!
//! These tests drive a `HashBackend` against an in-memory address bar:
//! 1. Reading and persisting the fragment
//! 2. Address self-healing through `ensure_url`
//! 3. Listener wiring and teardown
//! 4. Guard redirects and scroll handling

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reinhardt_history::{
	BrowserEnvironment, EnvMutation, HashBackend, MemoryEnvironment, NavigationBackend,
	NavigationFailureType, ScrollBehavior, Teardown, TransitionController,
};
use reinhardt_route_map::{Location, Route, RouteConfig, RouteMatcher};
use rstest::*;

fn controller() -> TransitionController {
	let matcher = RouteMatcher::new(&[
		RouteConfig::new("/"),
		RouteConfig::new("/foo"),
		RouteConfig::new("/bar"),
		RouteConfig::new("/users/:id"),
	])
	.unwrap();
	TransitionController::new(Rc::new(RefCell::new(matcher)))
}

fn hash_backend(env: &MemoryEnvironment) -> HashBackend {
	HashBackend::new(controller(), Rc::new(env.clone()), "", false, None)
}

#[derive(Default)]
struct RecordingScroll {
	calls: RefCell<Vec<(String, String, bool)>>,
	released: Rc<Cell<bool>>,
}

impl ScrollBehavior for RecordingScroll {
	fn setup(&self) -> Option<Teardown> {
		let released = Rc::clone(&self.released);
		Some(Box::new(move || released.set(true)))
	}

	fn handle(&self, to: &Route, from: &Route, is_pop: bool) {
		self.calls
			.borrow_mut()
			.push((to.full_path.clone(), from.full_path.clone(), is_pop));
	}
}

#[rstest]
#[case("https://x/y#/foo/bar", "/foo/bar")]
#[case("https://x/y", "")]
fn test_current_location_reads_raw_fragment(#[case] href: &str, #[case] expected: &str) {
	// Arrange
	let env = MemoryEnvironment::new(href);
	let backend = hash_backend(&env);
	env.replace_state(href);

	// Act
	let location = backend.current_location();

	// Assert
	assert_eq!(location, expected);
}

#[rstest]
fn test_fragment_is_not_percent_decoded() {
	let env = MemoryEnvironment::new("https://x/#/users/a%20b");
	let backend = hash_backend(&env);

	assert_eq!(backend.current_location(), "/users/a%20b");
}

#[rstest]
fn test_push_with_space_is_stored_escaped() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);

	// Act
	backend.push(Location::path("/users/a b"), None, None);
	let pushed = env.mutations();
	env.clear_mutations();
	backend.ensure_url(false);

	// Assert
	assert_eq!(
		pushed,
		vec![EnvMutation::PushState("https://x/#/users/a%20b".to_string())]
	);
	assert!(env.mutations().is_empty());
	assert_eq!(backend.current().full_path, "/users/a%20b");
	assert_eq!(backend.current().params["id"], "a b");
}

#[rstest]
fn test_ensure_url_after_push_is_a_no_op() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.push(Location::path("/foo"), None, None);
	env.clear_mutations();

	// Act
	backend.ensure_url(false);
	backend.ensure_url(true);

	// Assert
	assert!(env.mutations().is_empty());
	assert_eq!(env.href(), "https://x/#/foo");
}

#[rstest]
fn test_ensure_url_repairs_out_of_band_change() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.push(Location::path("/foo"), None, None);
	env.replace_state("https://x/#/elsewhere");
	env.clear_mutations();

	// Act
	backend.ensure_url(true);

	// Assert
	assert_eq!(
		env.mutations(),
		vec![EnvMutation::PushState("https://x/#/foo".to_string())]
	);
}

#[rstest]
fn test_replace_rewrites_current_entry() {
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);

	backend.replace(Location::path("/bar"), None, None);

	assert_eq!(env.entries(), vec!["https://x/#/bar"]);
	assert_eq!(backend.current().path, "/bar");
}

#[rstest]
fn test_setup_listeners_is_idempotent() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);

	// Act
	backend.setup_listeners();
	backend.setup_listeners();

	// Assert
	assert_eq!(env.subscription_count(), 1);
	assert_eq!(backend.listener_count(), 1);
}

#[rstest]
fn test_back_navigation_transitions_to_fragment() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.transition_to(Location::path(backend.current_location()), None, None);
	backend.setup_listeners();
	backend.push(Location::path("/foo"), None, None);
	backend.push(Location::path("/users/7"), None, None);

	// Act
	backend.go(-1);

	// Assert
	assert_eq!(backend.current().path, "/foo");
	assert_eq!(env.href(), "https://x/#/foo");
}

#[rstest]
fn test_external_fragment_without_slash_is_repaired() {
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.setup_listeners();

	env.navigate_externally("#foo");

	// The repaired entry is picked up by the next notification
	assert_eq!(env.href(), "https://x/#/foo");
	assert!(backend.current().is_start());
}

#[rstest]
fn test_guard_redirect_pushes_target() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	let _guard = backend.controller().before_each(|to, _, next| {
		if to.path == "/bar" {
			next.redirect("/foo");
		} else {
			next.proceed();
		}
	});
	let failure = Rc::new(RefCell::new(None));
	let sink = Rc::clone(&failure);

	// Act
	backend.push(
		Location::path("/bar"),
		None,
		Some(Box::new(move |f| *sink.borrow_mut() = Some(f.kind()))),
	);

	// Assert
	assert_eq!(*failure.borrow(), Some(NavigationFailureType::Redirected));
	assert_eq!(backend.current().path, "/foo");
	assert_eq!(env.href(), "https://x/#/foo");
}

#[rstest]
fn test_aborted_guard_keeps_address() {
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.push(Location::path("/foo"), None, None);
	let _guard = backend.controller().before_each(|_, _, next| next.abort());
	env.clear_mutations();

	backend.push(Location::path("/bar"), None, None);

	assert_eq!(backend.current().path, "/foo");
	assert!(env.mutations().is_empty());
}

#[rstest]
fn test_scroll_behavior_runs_with_push_state() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let scroll = Rc::new(RecordingScroll::default());
	let backend = HashBackend::new(
		controller(),
		Rc::new(env.clone()),
		"",
		false,
		Some(Rc::clone(&scroll) as Rc<dyn ScrollBehavior>),
	);
	backend.transition_to(Location::path("/"), None, None);
	backend.setup_listeners();

	// Act
	backend.push(Location::path("/foo"), None, None);
	backend.go(-1);
	backend.teardown();

	// Assert
	assert_eq!(
		*scroll.calls.borrow(),
		vec![
			("/foo".to_string(), "/".to_string(), false),
			("/".to_string(), "/foo".to_string(), true),
		]
	);
	assert!(scroll.released.get());
}

#[rstest]
fn test_scroll_behavior_skipped_without_push_state() {
	let env = MemoryEnvironment::legacy("https://x/#/");
	let scroll = Rc::new(RecordingScroll::default());
	let backend = HashBackend::new(
		controller(),
		Rc::new(env.clone()),
		"",
		false,
		Some(Rc::clone(&scroll) as Rc<dyn ScrollBehavior>),
	);
	backend.setup_listeners();

	backend.push(Location::path("/foo"), None, None);

	assert!(scroll.calls.borrow().is_empty());
	assert_eq!(backend.listener_count(), 1);
}

#[rstest]
fn test_teardown_releases_every_subscription() {
	// Arrange
	let env = MemoryEnvironment::new("https://x/#/");
	let backend = hash_backend(&env);
	backend.setup_listeners();
	backend.push(Location::path("/foo"), None, None);

	// Act
	backend.teardown();

	// Assert
	assert_eq!(env.subscription_count(), 0);
	assert_eq!(backend.listener_count(), 0);
	assert!(backend.current().is_start());
}
