//! Navigation failures.
//!
//! Failures are handed to the `on_abort` callback of the navigation that
//! produced them; they are never returned or raised.

use reinhardt_route_map::Route;
use thiserror::Error;

/// Why a navigation did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationFailure {
	/// A guard redirected the navigation elsewhere.
	#[error("navigation from \"{from}\" to \"{to}\" was redirected by a guard")]
	Redirected {
		/// Full path of the route being left.
		from: String,
		/// Full path of the route that was targeted.
		to: String,
	},

	/// A guard aborted the navigation.
	#[error("navigation from \"{from}\" to \"{to}\" was aborted by a guard")]
	Aborted {
		/// Full path of the route being left.
		from: String,
		/// Full path of the route that was targeted.
		to: String,
	},

	/// A newer navigation started before this one finished.
	#[error("navigation from \"{from}\" to \"{to}\" was superseded by a newer navigation")]
	Cancelled {
		/// Full path of the route being left.
		from: String,
		/// Full path of the route that was targeted.
		to: String,
	},

	/// The target is the current route.
	#[error("already at \"{to}\"")]
	Duplicated {
		/// Full path of the current route.
		from: String,
		/// Full path of the route that was targeted.
		to: String,
	},

	/// A guard failed the navigation with an error.
	#[error("navigation from \"{from}\" to \"{to}\" was rejected: {reason}")]
	Rejected {
		/// Full path of the route being left.
		from: String,
		/// Full path of the route that was targeted.
		to: String,
		/// Reason given by the guard.
		reason: String,
	},
}

/// Kind of a [`NavigationFailure`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationFailureType {
	/// See [`NavigationFailure::Redirected`].
	Redirected,
	/// See [`NavigationFailure::Aborted`].
	Aborted,
	/// See [`NavigationFailure::Cancelled`].
	Cancelled,
	/// See [`NavigationFailure::Duplicated`].
	Duplicated,
	/// See [`NavigationFailure::Rejected`].
	Rejected,
}

impl NavigationFailure {
	pub(crate) fn redirected(from: &Route, to: &Route) -> Self {
		Self::Redirected {
			from: from.full_path.clone(),
			to: to.full_path.clone(),
		}
	}

	pub(crate) fn aborted(from: &Route, to: &Route) -> Self {
		Self::Aborted {
			from: from.full_path.clone(),
			to: to.full_path.clone(),
		}
	}

	pub(crate) fn cancelled(from: &Route, to: &Route) -> Self {
		Self::Cancelled {
			from: from.full_path.clone(),
			to: to.full_path.clone(),
		}
	}

	pub(crate) fn duplicated(from: &Route, to: &Route) -> Self {
		Self::Duplicated {
			from: from.full_path.clone(),
			to: to.full_path.clone(),
		}
	}

	pub(crate) fn rejected(from: &Route, to: &Route, reason: String) -> Self {
		Self::Rejected {
			from: from.full_path.clone(),
			to: to.full_path.clone(),
			reason,
		}
	}

	/// The failure kind.
	pub fn kind(&self) -> NavigationFailureType {
		match self {
			Self::Redirected { .. } => NavigationFailureType::Redirected,
			Self::Aborted { .. } => NavigationFailureType::Aborted,
			Self::Cancelled { .. } => NavigationFailureType::Cancelled,
			Self::Duplicated { .. } => NavigationFailureType::Duplicated,
			Self::Rejected { .. } => NavigationFailureType::Rejected,
		}
	}

	/// Whether this failure is of the given kind.
	pub fn is_failure_type(&self, kind: NavigationFailureType) -> bool {
		self.kind() == kind
	}

	/// Full path of the route being left.
	pub fn from(&self) -> &str {
		match self {
			Self::Redirected { from, .. }
			| Self::Aborted { from, .. }
			| Self::Cancelled { from, .. }
			| Self::Duplicated { from, .. }
			| Self::Rejected { from, .. } => from,
		}
	}

	/// Full path of the route that was targeted.
	pub fn to(&self) -> &str {
		match self {
			Self::Redirected { to, .. }
			| Self::Aborted { to, .. }
			| Self::Cancelled { to, .. }
			| Self::Duplicated { to, .. }
			| Self::Rejected { to, .. } => to,
		}
	}
}
