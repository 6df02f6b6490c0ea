//! Resolved route snapshots.

use std::rc::Rc;

use crate::location::{Location, Query, full_path};
use crate::pattern::Params;
use crate::record::{Meta, RouteRecord};

/// The result of resolving a [`Location`] against the registry.
///
/// Routes are immutable snapshots; navigation replaces the current route
/// rather than changing it.
#[derive(Clone)]
pub struct Route {
	/// Name of the matched route, if any.
	pub name: Option<String>,
	/// Resolved path (without query or hash).
	pub path: String,
	/// Fragment including the leading `#`, or empty.
	pub hash: String,
	/// Query pairs.
	pub query: Query,
	/// Decoded path parameters.
	pub params: Params,
	/// `path + query + hash`.
	pub full_path: String,
	/// Matched records from the outermost parent to the leaf.
	pub matched: Vec<Rc<RouteRecord>>,
	/// Meta of the leaf record.
	pub meta: Meta,
	/// Full path of the location that redirected here.
	pub redirected_from: Option<String>,
	start: bool,
}

impl std::fmt::Debug for Route {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Route")
			.field("name", &self.name)
			.field("full_path", &self.full_path)
			.field("params", &self.params)
			.field(
				"matched",
				&self.matched.iter().map(|r| r.path()).collect::<Vec<_>>(),
			)
			.field("redirected_from", &self.redirected_from)
			.finish()
	}
}

impl Route {
	/// The initial route every backend starts from, before the first navigation.
	pub fn start() -> Self {
		Self {
			start: true,
			..Self::create(Vec::new(), &Location::path("/"), None)
		}
	}

	/// Builds a route from matched records and a normalized location.
	pub fn create(
		matched: Vec<Rc<RouteRecord>>,
		location: &Location,
		redirected_from: Option<&Location>,
	) -> Self {
		let leaf = matched.last();
		let path = match location.path.as_deref() {
			Some(path) if !path.is_empty() => path.to_string(),
			_ => "/".to_string(),
		};
		Self {
			name: location
				.name
				.clone()
				.or_else(|| leaf.and_then(|record| record.name().map(str::to_string))),
			full_path: full_path(&path, &location.query, &location.hash),
			path,
			hash: location.hash.clone(),
			query: location.query.clone(),
			params: location.params.clone(),
			meta: leaf.map(|record| record.meta().clone()).unwrap_or_default(),
			redirected_from: redirected_from.map(Location::full_path),
			matched,
			start: false,
		}
	}

	/// Whether this is the initial [`Route::start`] snapshot.
	pub fn is_start(&self) -> bool {
		self.start
	}

	/// Compares two routes by path (ignoring one trailing slash), hash and
	/// query; `only_path` restricts the comparison to the path.
	///
	/// The start route is only the same as itself.
	pub fn is_same(&self, other: &Route, only_path: bool) -> bool {
		if other.start || self.start {
			return other.start && self.start;
		}
		let trim = |path: &str| path.strip_suffix('/').unwrap_or(path).to_string();
		trim(&self.path) == trim(&other.path)
			&& (only_path || (self.hash == other.hash && self.query.same_pairs(&other.query)))
	}

	/// The leaf record, if the route matched anything.
	pub fn leaf(&self) -> Option<&Rc<RouteRecord>> {
		self.matched.last()
	}

	/// Converts the route back into a location targeting its full path.
	pub fn to_location(&self) -> Location {
		Location::path(self.full_path.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn route(raw: &str) -> Route {
		Route::create(Vec::new(), &Location::path(raw).normalize(None, false), None)
	}

	#[rstest]
	fn test_create_builds_full_path() {
		let route = route("/a/b?x=1#h");

		assert_eq!(route.path, "/a/b");
		assert_eq!(route.full_path, "/a/b?x=1#h");
		assert!(route.matched.is_empty());
	}

	#[rstest]
	fn test_same_route_ignores_trailing_slash() {
		assert!(route("/a/").is_same(&route("/a"), false));
		assert!(!route("/a?x=1").is_same(&route("/a?x=2"), false));
		assert!(route("/a?x=1").is_same(&route("/a?x=2"), true));
	}

	#[rstest]
	fn test_start_route_only_equals_itself() {
		let start = Route::start();

		assert!(start.is_start());
		assert!(start.is_same(&Route::start(), false));
		assert!(!route("/").is_same(&start, false));
		assert_eq!(start.full_path, "/");
	}

	#[rstest]
	fn test_redirected_from_records_original_full_path() {
		let original = Location::path("/old?x=1").normalize(None, false);
		let route = Route::create(
			Vec::new(),
			&Location::path("/new").normalize(None, false),
			Some(&original),
		);

		assert_eq!(route.redirected_from.as_deref(), Some("/old?x=1"));
	}
}
