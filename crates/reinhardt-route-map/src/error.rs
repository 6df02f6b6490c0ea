//! Error types for route configuration.

use thiserror::Error;

/// Fatal errors raised while compiling a route configuration.
///
/// These surface synchronously from the builder. Non-fatal problems are
/// reported as [`ConfigurationWarning`](crate::ConfigurationWarning) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// A route configuration was declared without a `path`.
	#[error("\"path\" is required in a route configuration{}", describe_name(.name))]
	MissingPath {
		/// Name of the offending route, when it has one.
		name: Option<String>,
	},

	/// A component was referenced by a string identifier.
	#[error("component of route {route} cannot be a string id ({identifier}); pass the component itself")]
	ComponentIdentifier {
		/// Path (or name) of the offending route.
		route: String,
		/// The string identifier that was given.
		identifier: String,
	},

	/// A path template could not be compiled.
	#[error("invalid route pattern \"{path}\": {reason}")]
	InvalidPattern {
		/// The path template.
		path: String,
		/// What went wrong.
		reason: String,
	},

	/// A required parameter was absent while filling a path template.
	#[error("missing param \"{param}\" for path \"{path}\"")]
	MissingParameter {
		/// The path template.
		path: String,
		/// The parameter name.
		param: String,
	},

	/// A parameter value does not satisfy the template's constraint.
	#[error("param \"{param}\" of path \"{path}\" does not accept value \"{value}\"")]
	InvalidParameter {
		/// The path template.
		path: String,
		/// The parameter name.
		param: String,
		/// The rejected value.
		value: String,
	},

	/// Routes were added below a parent name that is not registered.
	#[error("cannot add routes under unknown parent route \"{0}\"")]
	UnknownParent(String),
}

fn describe_name(name: &Option<String>) -> String {
	match name {
		Some(name) => format!(" (route \"{}\")", name),
		None => String::new(),
	}
}

/// Result type for route configuration operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;
