//! Development-time configuration warnings.
//!
//! Warnings never change what gets registered. They are collected by a
//! [`Diagnostics`] sink and logged through `tracing`; outside development
//! builds (no `debug_assertions`) the default sink drops them.

use thiserror::Error;

/// A non-fatal problem found while compiling routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationWarning {
	/// A compiled pattern declares the same parameter name more than once.
	#[error("route \"{path}\" declares the same param more than once: {}", .keys.join(", "))]
	DuplicateParamKeys {
		/// Normalized route path.
		path: String,
		/// The repeated parameter names.
		keys: Vec<String>,
	},

	/// Top-level paths that do not begin with `/`.
	#[error("top-level route paths must start with \"/\":\n{}", bullet_list(.paths))]
	MissingLeadingSlash {
		/// Every offending path, in registry order.
		paths: Vec<String>,
	},

	/// An alias identical to the route's own path. The alias is ignored.
	#[error("route \"{path}\" lists its own path as an alias; the alias is ignored")]
	AliasSameAsPath {
		/// The route path.
		path: String,
	},

	/// A second route claimed an already registered name.
	#[error("route name \"{name}\" is already taken; \"{path}\" is not reachable by that name")]
	DuplicateName {
		/// The contested name.
		name: String,
		/// Path of the route that lost.
		path: String,
	},

	/// Navigating to this route by name never renders its default child.
	#[error(
		"named route \"{name}\" has a default child that navigation by this name never renders; name the child instead"
	)]
	NamedRouteWithDefaultChild {
		/// The route name.
		name: String,
	},

	/// The path contains characters outside ASCII.
	#[error("route path \"{path}\" contains unencoded characters")]
	UnencodedPath {
		/// The raw configured path.
		path: String,
	},
}

fn bullet_list(paths: &[String]) -> String {
	paths
		.iter()
		.map(|path| format!("- {}", path))
		.collect::<Vec<_>>()
		.join("\n")
}

/// Collects configuration warnings.
#[derive(Debug, Clone)]
pub struct Diagnostics {
	enabled: bool,
	warnings: Vec<ConfigurationWarning>,
}

impl Default for Diagnostics {
	fn default() -> Self {
		Self::new(cfg!(debug_assertions))
	}
}

impl Diagnostics {
	/// Creates a sink that records warnings only when `enabled`.
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled,
			warnings: Vec::new(),
		}
	}

	/// A sink that always records, regardless of build profile.
	pub fn development() -> Self {
		Self::new(true)
	}

	/// A sink that discards everything.
	pub fn silent() -> Self {
		Self::new(false)
	}

	/// Whether warnings are being recorded.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Records a warning and logs it.
	pub fn warn(&mut self, warning: ConfigurationWarning) {
		if !self.enabled {
			return;
		}
		tracing::warn!(target: "reinhardt_route_map", "{}", warning);
		self.warnings.push(warning);
	}

	/// Warnings recorded so far.
	pub fn warnings(&self) -> &[ConfigurationWarning] {
		&self.warnings
	}

	/// Drains the recorded warnings.
	pub fn take(&mut self) -> Vec<ConfigurationWarning> {
		std::mem::take(&mut self.warnings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_silent_sink_drops_warnings() {
		let mut diagnostics = Diagnostics::silent();

		diagnostics.warn(ConfigurationWarning::AliasSameAsPath {
			path: "/a".to_string(),
		});

		assert!(diagnostics.warnings().is_empty());
	}

	#[rstest]
	fn test_development_sink_records_in_order() {
		let mut diagnostics = Diagnostics::development();

		diagnostics.warn(ConfigurationWarning::UnencodedPath {
			path: "/café".to_string(),
		});
		diagnostics.warn(ConfigurationWarning::DuplicateName {
			name: "home".to_string(),
			path: "/other".to_string(),
		});

		assert_eq!(diagnostics.warnings().len(), 2);
		assert!(matches!(
			diagnostics.take()[1],
			ConfigurationWarning::DuplicateName { .. }
		));
		assert!(diagnostics.warnings().is_empty());
	}

	#[rstest]
	fn test_missing_leading_slash_lists_every_path() {
		let warning = ConfigurationWarning::MissingLeadingSlash {
			paths: vec!["foo".to_string(), "bar/baz".to_string()],
		};

		let message = warning.to_string();
		assert!(message.contains("- foo\n- bar/baz"));
	}
}
