//! The navigation backend contract.

use std::cell::RefCell;

use reinhardt_route_map::{Location, Route, clean_path};

use crate::env::Teardown;
use crate::transition::{AbortCallback, CompleteCallback, TransitionController};

/// Persists the current location into some medium and listens for external
/// navigation.
///
/// Every backend drives its transitions through a shared
/// [`TransitionController`] and re-synchronizes the medium with
/// [`ensure_url`](NavigationBackend::ensure_url) after each commit.
pub trait NavigationBackend {
	/// The controller owning the committed route.
	fn controller(&self) -> &TransitionController;

	/// The committed route.
	fn current(&self) -> Route {
		self.controller().current()
	}

	/// Normalized application base (`""` or `/prefix`).
	fn base(&self) -> &str;

	/// Runs a transition and reconciles the medium once it commits.
	fn transition_to(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	);

	/// Navigates to `location`, adding an entry.
	fn push(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	);

	/// Navigates to `location`, replacing the current entry.
	fn replace(
		&self,
		location: Location,
		on_complete: Option<CompleteCallback>,
		on_abort: Option<AbortCallback>,
	);

	/// Pushes or replaces according to [`Location::replace`].
	fn navigate(&self, location: Location) {
		if location.replace {
			self.replace(location, None, None);
		} else {
			self.push(location, None, None);
		}
	}

	/// Moves through history by `delta` entries.
	fn go(&self, delta: i32);

	/// Rewrites the medium if it drifted from the committed route, pushing a
	/// new entry when `push` is set.
	fn ensure_url(&self, push: bool);

	/// The location currently stored in the medium.
	fn current_location(&self) -> String;

	/// Subscribes to external navigation. Idempotent.
	fn setup_listeners(&self);

	/// Number of registered teardown callbacks.
	fn listener_count(&self) -> usize;

	/// Releases every subscription and resets to the start route.
	fn teardown(&self);
}

/// Teardown callbacks accumulated by a backend.
#[derive(Default)]
pub(crate) struct Listeners(RefCell<Vec<Teardown>>);

impl Listeners {
	pub(crate) fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	pub(crate) fn len(&self) -> usize {
		self.0.borrow().len()
	}

	pub(crate) fn push(&self, teardown: Teardown) {
		self.0.borrow_mut().push(teardown);
	}

	pub(crate) fn release(&self) {
		let listeners = std::mem::take(&mut *self.0.borrow_mut());
		for teardown in listeners {
			teardown();
		}
	}
}

/// Chains `then` after the caller's completion callback.
pub(crate) fn and_then<F>(on_complete: Option<CompleteCallback>, then: F) -> CompleteCallback
where
	F: FnOnce() + 'static,
{
	Box::new(move |route: &Route| {
		if let Some(on_complete) = on_complete {
			on_complete(route);
		}
		then();
	})
}

/// Normalizes an application base: leading `/`, no trailing `/`, no origin.
/// An empty base or `/` becomes `""`.
pub fn normalize_base(base: &str) -> String {
	let mut base = base.trim();
	for scheme in ["http://", "https://"] {
		if let Some(rest) = base.strip_prefix(scheme) {
			base = rest.find('/').map_or("", |index| &rest[index..]);
		}
	}
	let base = if base.starts_with('/') {
		base.to_string()
	} else {
		format!("/{}", base)
	};
	base.strip_suffix('/').unwrap_or(&base).to_string()
}

/// `base + full_path`, as written into the address.
pub(crate) fn join_base(base: &str, full_path: &str) -> String {
	clean_path(&format!("{}{}", base, full_path))
}
