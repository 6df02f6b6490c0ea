//! Router options.
//!
//! Options are plain data and can be deserialized from JSON. Host
//! collaborators (environment, scroll behavior) are attached through
//! [`RouterBuilder`](crate::RouterBuilder) instead.

use reinhardt_route_map::Diagnostics;
use serde::{Deserialize, Serialize};

use crate::error::RouterResult;

/// Where the router persists the current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
	/// In the URL fragment (`/#/users/1`).
	#[default]
	Hash,
	/// In the address path, through `history.pushState`.
	History,
	/// In memory only.
	Abstract,
}

impl RouterMode {
	/// The serialized name of the mode.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hash => "hash",
			Self::History => "history",
			Self::Abstract => "abstract",
		}
	}
}

impl std::fmt::Display for RouterMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Router settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterOptions {
	/// Persistence mode
	#[serde(default)]
	pub mode: RouterMode,

	/// Application base path, such as `/app`
	#[serde(default)]
	pub base: String,

	/// Fall back to hash mode when history mode is requested on a host
	/// without push-state support
	#[serde(default = "default_fallback")]
	pub fallback: bool,

	/// Force configuration warnings on or off. Defaults to on in debug builds.
	#[serde(default)]
	pub diagnostics: Option<bool>,
}

fn default_fallback() -> bool {
	true
}

impl Default for RouterOptions {
	fn default() -> Self {
		Self {
			mode: RouterMode::default(),
			base: String::new(),
			fallback: default_fallback(),
			diagnostics: None,
		}
	}
}

impl RouterOptions {
	/// Default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses options from JSON.
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_navigation::{RouterMode, RouterOptions};
	///
	/// let options = RouterOptions::from_json_str(r#"{"mode": "history", "base": "/app"}"#).unwrap();
	/// assert_eq!(options.mode, RouterMode::History);
	/// assert!(options.fallback);
	/// ```
	pub fn from_json_str(json: &str) -> RouterResult<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Sets the persistence mode.
	pub fn with_mode(mut self, mode: RouterMode) -> Self {
		self.mode = mode;
		self
	}

	/// Sets the application base path.
	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.base = base.into();
		self
	}

	/// Enables or disables the hash-mode fallback.
	pub fn with_fallback(mut self, fallback: bool) -> Self {
		self.fallback = fallback;
		self
	}

	/// Forces configuration warnings on or off.
	pub fn with_diagnostics(mut self, enabled: bool) -> Self {
		self.diagnostics = Some(enabled);
		self
	}

	/// The warning sink these options ask for.
	pub fn resolve_diagnostics(&self) -> Diagnostics {
		match self.diagnostics {
			Some(true) => Diagnostics::development(),
			Some(false) => Diagnostics::silent(),
			None => Diagnostics::default(),
		}
	}
}
