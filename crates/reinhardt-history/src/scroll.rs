//! Scroll restoration hook.

use reinhardt_route_map::Route;

use crate::env::Teardown;

/// Scroll handling supplied by the host application.
///
/// Backends only call into it when the environment supports push-state.
pub trait ScrollBehavior {
	/// Prepares scroll tracking once listeners are set up. The returned
	/// teardown runs when the backend is torn down.
	fn setup(&self) -> Option<Teardown> {
		None
	}

	/// Restores or adjusts the scroll position after a navigation.
	/// `is_pop` is set for history traversal.
	fn handle(&self, to: &Route, from: &Route, is_pop: bool);
}
