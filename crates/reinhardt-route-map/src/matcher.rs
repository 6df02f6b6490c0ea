//! Resolving locations against a compiled registry.

use std::rc::Rc;

use crate::builder::{RouteMap, RouteMapBuilder};
use crate::config::{Redirect, RouteConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigResult, ConfigurationError};
use crate::location::Location;
use crate::path::resolve_path;
use crate::pattern::{Params, fill_params};
use crate::record::{RouteId, RouteRecord};
use crate::route::Route;

/// Redirect and alias hops allowed while resolving one location.
pub const MAX_REDIRECT_DEPTH: usize = 16;

/// Matches locations against a [`RouteMap`] and builds [`Route`] snapshots,
/// following redirects and aliases.
#[derive(Debug, Default)]
pub struct RouteMatcher {
	map: RouteMap,
	diagnostics: Diagnostics,
}

impl RouteMatcher {
	/// Compiles `configs` into a new matcher.
	///
	/// # Errors
	///
	/// See [`RouteMapBuilder::add_routes`].
	pub fn new(configs: &[RouteConfig]) -> ConfigResult<Self> {
		Self::with_diagnostics(configs, Diagnostics::default())
	}

	/// Compiles `configs`, recording warnings into `diagnostics`.
	///
	/// # Errors
	///
	/// See [`RouteMapBuilder::add_routes`].
	pub fn with_diagnostics(configs: &[RouteConfig], diagnostics: Diagnostics) -> ConfigResult<Self> {
		let mut matcher = Self {
			map: RouteMap::default(),
			diagnostics,
		};
		matcher.add_routes(configs)?;
		Ok(matcher)
	}

	/// Wraps an already compiled registry.
	pub fn from_map(map: RouteMap) -> Self {
		Self {
			map,
			diagnostics: Diagnostics::default(),
		}
	}

	/// Adds top-level routes. Existing paths and names are kept.
	///
	/// # Errors
	///
	/// See [`RouteMapBuilder::add_routes`]. On error the registry is unchanged.
	pub fn add_routes(&mut self, configs: &[RouteConfig]) -> ConfigResult<()> {
		self.extend(configs, None)
	}

	/// Adds one route, below the route named `parent` when given.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnknownParent`] if no route is named
	/// `parent`, otherwise see [`RouteMapBuilder::add_routes`].
	pub fn add_route(&mut self, parent: Option<&str>, config: RouteConfig) -> ConfigResult<()> {
		let parent = match parent {
			Some(name) => match self.map.by_name(name) {
				Some(record) => Some(record.id()),
				None => return Err(ConfigurationError::UnknownParent(name.to_string())),
			},
			None => None,
		};
		self.extend(&[config], parent)
	}

	fn extend(&mut self, configs: &[RouteConfig], parent: Option<RouteId>) -> ConfigResult<()> {
		let mut builder = RouteMapBuilder::from_seed(std::mem::take(&mut self.map))
			.with_diagnostics(std::mem::take(&mut self.diagnostics));
		let result = builder.add_routes(configs, parent).map(|_| ());
		(self.map, self.diagnostics) = builder.into_parts();
		result
	}

	/// Registered records in match priority order.
	pub fn routes(&self) -> Vec<Rc<RouteRecord>> {
		self.map.routes()
	}

	/// The underlying registry.
	pub fn route_map(&self) -> &RouteMap {
		&self.map
	}

	/// Warnings recorded while compiling.
	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Resolves `raw` into a route.
	///
	/// Relative locations resolve against `current`. An unmatched location
	/// yields a route with no matched records.
	pub fn match_location(
		&self,
		raw: impl Into<Location>,
		current: Option<&Route>,
		redirected_from: Option<&Location>,
	) -> Route {
		self.resolve(raw.into(), current, redirected_from, 0)
	}

	fn resolve(
		&self,
		raw: Location,
		current: Option<&Route>,
		redirected_from: Option<&Location>,
		depth: usize,
	) -> Route {
		let mut location = raw.normalize(current, false);

		if let Some(name) = location.name.clone() {
			let Some(record) = self.map.by_name(&name) else {
				tracing::warn!(target: "reinhardt_route_map", "no route named \"{}\"", name);
				return Route::create(Vec::new(), &location, None);
			};

			if let Some(current) = current {
				for key in record.pattern().keys().iter().filter(|key| !key.optional) {
					let key = key.name.key();
					if !location.params.contains_key(&key)
						&& let Some(value) = current.params.get(&key)
					{
						location.params.insert(key, value.clone());
					}
				}
			}
			location.path = Some(fill_or_warn(record.path(), &location.params, &name));
			return self.create_route(record, location, redirected_from, depth);
		}

		if let Some(path) = location.path.clone().filter(|path| !path.is_empty()) {
			for candidate in self.map.path_list() {
				let Some(record) = self.map.get(candidate) else {
					continue;
				};
				if let Some(params) = record.pattern().matches(&path) {
					location.params = params;
					return self.create_route(record, location, redirected_from, depth);
				}
			}
		}

		Route::create(Vec::new(), &location, None)
	}

	fn create_route(
		&self,
		record: &Rc<RouteRecord>,
		location: Location,
		redirected_from: Option<&Location>,
		depth: usize,
	) -> Route {
		if depth >= MAX_REDIRECT_DEPTH {
			tracing::warn!(
				target: "reinhardt_route_map",
				"stopped resolving \"{}\" after {} redirects",
				location.full_path(),
				MAX_REDIRECT_DEPTH
			);
			return Route::create(Vec::new(), &location, None);
		}
		if let Some(redirect) = record.redirect() {
			return self.redirect(record, redirect, redirected_from.unwrap_or(&location), depth);
		}
		if let Some(match_as) = record.match_as() {
			return self.alias(match_as, location, depth);
		}
		Route::create(self.map.ancestry(record.id()), &location, redirected_from)
	}

	fn redirect(
		&self,
		record: &Rc<RouteRecord>,
		redirect: &Redirect,
		original: &Location,
		depth: usize,
	) -> Route {
		let target = match redirect {
			Redirect::To(target) => target.clone(),
			Redirect::Computed(compute) => {
				let from = Route::create(self.map.ancestry(record.id()), original, None);
				compute(&from)
			}
		};

		let query = if target.query.is_empty() {
			original.query.clone()
		} else {
			target.query.clone()
		};
		let hash = if target.hash.is_empty() {
			original.hash.clone()
		} else {
			target.hash.clone()
		};
		let params = if target.params.is_empty() {
			original.params.clone()
		} else {
			target.params.clone()
		};

		let next = if let Some(name) = target.name {
			if !self.map.contains_name(&name) {
				tracing::warn!(target: "reinhardt_route_map", "redirect target: no route named \"{}\"", name);
			}
			Location {
				name: Some(name),
				params,
				query,
				hash,
				..Default::default()
			}
		} else if let Some(path) = target.path.filter(|path| !path.is_empty()) {
			let parent_path = record
				.parent()
				.and_then(|id| self.map.record(id))
				.map(|parent| parent.path().to_string())
				.unwrap_or_else(|| "/".to_string());
			let raw_path = resolve_path(&path, &parent_path, true);
			Location {
				path: Some(fill_or_warn(&raw_path, &params, &raw_path)),
				query,
				hash,
				..Default::default()
			}
		} else {
			tracing::warn!(target: "reinhardt_route_map", "invalid redirect option on route \"{}\"", record.path());
			return Route::create(Vec::new(), original, None);
		};

		self.resolve(next, None, Some(original), depth + 1)
	}

	fn alias(&self, match_as: &str, mut location: Location, depth: usize) -> Route {
		let aliased_path = fill_or_warn(match_as, &location.params, match_as);
		let aliased = self.resolve(Location::path(aliased_path), None, None, depth + 1);
		match aliased.leaf() {
			Some(leaf) => {
				location.params = aliased.params.clone();
				let leaf = Rc::clone(leaf);
				self.create_route(&leaf, location, None, depth + 1)
			}
			None => Route::create(Vec::new(), &location, None),
		}
	}
}

fn fill_or_warn(path: &str, params: &Params, context: &str) -> String {
	match fill_params(path, params) {
		Ok(filled) => filled,
		Err(e) => {
			tracing::warn!(target: "reinhardt_route_map", "{} ({})", e, context);
			String::new()
		}
	}
}
