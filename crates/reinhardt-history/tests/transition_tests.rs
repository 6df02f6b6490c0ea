//! Integration tests for the transition pipeline
//!
//! These tests verify:
//! 1. The order in which every kind of guard runs
//! 2. Guards resuming after deferred work
//! 3. Supersession of stalled transitions

use std::cell::RefCell;
use std::rc::Rc;

use reinhardt_history::{
	MemoryBackend, NavigationBackend, NavigationFailure, NavigationFailureType,
	TransitionController,
};
use reinhardt_route_map::{
	Component, Location, NavigationGuard, Next, Route, RouteComponent, RouteConfig, RouteMatcher,
};
use rstest::*;

type Log = Rc<RefCell<Vec<String>>>;

fn logging_guard(log: &Log, label: &str) -> NavigationGuard {
	let log = Rc::clone(log);
	let label = label.to_string();
	Rc::new(move |_: &Route, _: &Route, next: Next| {
		log.borrow_mut().push(label.clone());
		next.proceed();
	})
}

struct Page {
	name: &'static str,
	log: Log,
}

impl RouteComponent for Page {
	fn name(&self) -> &str {
		self.name
	}

	fn before_route_enter(&self) -> Option<NavigationGuard> {
		Some(logging_guard(&self.log, &format!("enter {}", self.name)))
	}

	fn before_route_update(&self) -> Option<NavigationGuard> {
		Some(logging_guard(&self.log, &format!("update {}", self.name)))
	}

	fn before_route_leave(&self) -> Option<NavigationGuard> {
		Some(logging_guard(&self.log, &format!("leave {}", self.name)))
	}
}

fn page(name: &'static str, log: &Log) -> Component {
	Rc::new(Page {
		name,
		log: Rc::clone(log),
	})
}

fn backend(routes: &[RouteConfig]) -> MemoryBackend {
	let matcher = RouteMatcher::new(routes).unwrap();
	MemoryBackend::new(TransitionController::new(Rc::new(RefCell::new(matcher))), "")
}

#[rstest]
fn test_guards_run_in_pipeline_order() {
	// Arrange
	let log: Log = Rc::new(RefCell::new(Vec::new()));
	let enter_log = Rc::clone(&log);
	let backend = backend(&[RouteConfig::new("/p")
		.component(page("parent", &log))
		.children(vec![
			RouteConfig::new("a").component(page("a", &log)),
			RouteConfig::new("b")
				.component(page("b", &log))
				.before_enter(move |_, _, next| {
					enter_log.borrow_mut().push("before_enter b".to_string());
					next.proceed();
				}),
		])]);
	backend.push(Location::path("/p/a"), None, None);
	log.borrow_mut().clear();

	let each = Rc::clone(&log);
	let resolve = Rc::clone(&log);
	let after = Rc::clone(&log);
	let controller = backend.controller();
	let _each = controller.before_each(move |_, _, next| {
		each.borrow_mut().push("before_each".to_string());
		next.proceed();
	});
	let _resolve = controller.before_resolve(move |_, _, next| {
		resolve.borrow_mut().push("before_resolve".to_string());
		next.proceed();
	});
	let _after = controller.after_each(move |_, _| after.borrow_mut().push("after_each".to_string()));

	// Act
	backend.push(Location::path("/p/b"), None, None);

	// Assert
	assert_eq!(
		*log.borrow(),
		vec![
			"leave a",
			"before_each",
			"update parent",
			"before_enter b",
			"enter b",
			"before_resolve",
			"after_each",
		]
	);
}

#[rstest]
fn test_deferred_guard_commits_on_resume() {
	// Arrange
	let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
	let slot = Rc::clone(&parked);
	let backend = backend(&[
		RouteConfig::new("/"),
		RouteConfig::new("/slow").before_enter(move |_, _, next| *slot.borrow_mut() = Some(next)),
	]);
	backend.push(Location::path("/"), None, None);

	// Act
	backend.push(Location::path("/slow"), None, None);
	let pending = backend.controller().pending().map(|r| r.path);
	let before_resume = backend.current().path;
	parked.borrow_mut().take().unwrap().proceed();

	// Assert
	assert_eq!(pending.as_deref(), Some("/slow"));
	assert_eq!(before_resume, "/");
	assert_eq!(backend.current().path, "/slow");
	assert_eq!(backend.entries(), vec!["/", "/slow"]);
}

#[rstest]
fn test_stalled_transition_is_superseded() {
	// Arrange
	let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
	let slot = Rc::clone(&parked);
	let backend = backend(&[
		RouteConfig::new("/"),
		RouteConfig::new("/slow").before_enter(move |_, _, next| *slot.borrow_mut() = Some(next)),
		RouteConfig::new("/fast"),
	]);
	let failures: Rc<RefCell<Vec<NavigationFailureType>>> = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&failures);

	// Act
	backend.push(
		Location::path("/slow"),
		None,
		Some(Box::new(move |f: NavigationFailure| sink.borrow_mut().push(f.kind()))),
	);
	backend.push(Location::path("/fast"), None, None);
	parked.borrow_mut().take().unwrap().proceed();

	// Assert
	assert_eq!(*failures.borrow(), vec![NavigationFailureType::Cancelled]);
	assert_eq!(backend.current().path, "/fast");
	assert_eq!(backend.entries(), vec!["/fast"]);
}

#[rstest]
fn test_listen_sees_every_commit() {
	let backend = backend(&[RouteConfig::new("/a"), RouteConfig::new("/b")]);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&seen);
	backend
		.controller()
		.listen(move |route| sink.borrow_mut().push(route.full_path.clone()));

	backend.push(Location::path("/a"), None, None);
	backend.push(Location::path("/b?x=1"), None, None);

	assert_eq!(*seen.borrow(), vec!["/a", "/b?x=1"]);
}
