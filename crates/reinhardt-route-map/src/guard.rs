//! Navigation guards and their continuations.
//!
//! A guard receives the target route, the route being left, and a [`Next`]
//! continuation. The transition stays suspended until `Next` is resolved,
//! which may happen synchronously or after any amount of asynchronous work.

use std::rc::Rc;

use crate::location::Location;
use crate::route::Route;

/// What a guard decided about a pending navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
	/// Continue with the next guard.
	Proceed,
	/// Stop the navigation and stay on the current route.
	Abort,
	/// Stop the navigation and start a new one towards the given location.
	Redirect(Location),
	/// Stop the navigation with an error.
	Reject(String),
}

/// Continuation handed to a guard. Consumed on use, so it resolves at most once.
pub struct Next {
	resolve: Box<dyn FnOnce(GuardDecision)>,
}

impl Next {
	/// Wraps the code that runs once the guard decides.
	pub fn new<F>(resolve: F) -> Self
	where
		F: FnOnce(GuardDecision) + 'static,
	{
		Self {
			resolve: Box::new(resolve),
		}
	}

	/// Resolves the continuation with an explicit decision.
	pub fn resolve(self, decision: GuardDecision) {
		(self.resolve)(decision)
	}

	/// Lets the navigation continue.
	pub fn proceed(self) {
		self.resolve(GuardDecision::Proceed)
	}

	/// Cancels the navigation.
	pub fn abort(self) {
		self.resolve(GuardDecision::Abort)
	}

	/// Cancels the navigation and navigates to `location` instead.
	pub fn redirect(self, location: impl Into<Location>) {
		self.resolve(GuardDecision::Redirect(location.into()))
	}

	/// Fails the navigation with `reason`.
	pub fn reject(self, reason: impl Into<String>) {
		self.resolve(GuardDecision::Reject(reason.into()))
	}
}

impl std::fmt::Debug for Next {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Next").finish_non_exhaustive()
	}
}

/// A guard gating a navigation: `(to, from, next)`.
pub type NavigationGuard = Rc<dyn Fn(&Route, &Route, Next)>;

/// A hook run after a navigation is confirmed: `(to, from)`.
pub type AfterHook = Rc<dyn Fn(&Route, &Route)>;

/// Wraps a closure as a [`NavigationGuard`].
pub fn guard<F>(f: F) -> NavigationGuard
where
	F: Fn(&Route, &Route, Next) + 'static,
{
	Rc::new(f)
}

/// A component descriptor mounted in a route slot.
///
/// Rendering is up to the view layer; the router only needs the in-component
/// guards.
pub trait RouteComponent {
	/// A human-readable component name.
	fn name(&self) -> &str;

	/// Guard run before a route rendering this component is entered.
	fn before_route_enter(&self) -> Option<NavigationGuard> {
		None
	}

	/// Guard run when the route changes but this component is reused.
	fn before_route_update(&self) -> Option<NavigationGuard> {
		None
	}

	/// Guard run before a route rendering this component is left.
	fn before_route_leave(&self) -> Option<NavigationGuard> {
		None
	}
}

/// Shared handle to a component descriptor.
pub type Component = Rc<dyn RouteComponent>;
