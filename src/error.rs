//! Router errors.

use reinhardt_route_map::ConfigurationError;
use thiserror::Error;

/// Errors raised while building or extending a [`Router`](crate::Router).
///
/// Navigation itself never fails with an error; failed navigations are
/// reported as [`NavigationFailure`](reinhardt_history::NavigationFailure)
/// through the abort callback.
#[derive(Debug, Error)]
pub enum RouterError {
	/// The route configuration was rejected.
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	/// Router options could not be parsed.
	#[error("invalid router options: {0}")]
	InvalidOptions(#[from] serde_json::Error),
}

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;
