//! Compiles route configuration trees into a flat registry.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::{ComponentSource, DEFAULT_SLOT, PropsSource, RouteConfig};
use crate::diagnostics::{ConfigurationWarning, Diagnostics};
use crate::error::{ConfigResult, ConfigurationError};
use crate::path::{clean_path, normalize_path};
use crate::pattern::{PathMatcher, PatternOptions};
use crate::record::{RouteId, RouteRecord};

/// Wildcard path, always matched last.
pub const WILDCARD: &str = "*";

/// The compiled registry: ordered path list plus path and name lookups.
///
/// Records live in an arena indexed by [`RouteId`]. `path_map` is the
/// authoritative owner of registered paths. A record that lost a path
/// collision stays in the arena only while its name or children still need
/// it; otherwise it is never stored.
#[derive(Debug, Clone, Default)]
pub struct RouteMap {
	records: Vec<Rc<RouteRecord>>,
	path_list: Vec<String>,
	path_map: HashMap<String, RouteId>,
	name_map: HashMap<String, RouteId>,
}

impl RouteMap {
	/// Paths in match priority order. Wildcards come last.
	pub fn path_list(&self) -> &[String] {
		&self.path_list
	}

	/// Record registered under `path`.
	pub fn get(&self, path: &str) -> Option<&Rc<RouteRecord>> {
		self.path_map.get(path).and_then(|id| self.record(*id))
	}

	/// Record registered under `name`.
	pub fn by_name(&self, name: &str) -> Option<&Rc<RouteRecord>> {
		self.name_map.get(name).and_then(|id| self.record(*id))
	}

	/// Record by id, registered or not.
	pub fn record(&self, id: RouteId) -> Option<&Rc<RouteRecord>> {
		self.records.get(id.0)
	}

	/// Whether `path` is registered.
	pub fn contains_path(&self, path: &str) -> bool {
		self.path_map.contains_key(path)
	}

	/// Whether `name` is registered.
	pub fn contains_name(&self, name: &str) -> bool {
		self.name_map.contains_key(name)
	}

	/// Registered names, in no particular order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.name_map.keys().map(String::as_str)
	}

	/// Registered records in match priority order.
	pub fn routes(&self) -> Vec<Rc<RouteRecord>> {
		self.path_list
			.iter()
			.filter_map(|path| self.get(path).cloned())
			.collect()
	}

	/// The record and its ancestors, outermost first.
	pub fn ancestry(&self, id: RouteId) -> Vec<Rc<RouteRecord>> {
		let mut chain = Vec::new();
		let mut cursor = self.record(id);
		while let Some(record) = cursor {
			chain.push(Rc::clone(record));
			cursor = record.parent.and_then(|parent| self.record(parent));
		}
		chain.reverse();
		chain
	}

	/// Number of registered paths.
	pub fn len(&self) -> usize {
		self.path_list.len()
	}

	/// Whether no path is registered.
	pub fn is_empty(&self) -> bool {
		self.path_list.is_empty()
	}
}

/// Builds or extends a [`RouteMap`].
///
/// # Example
///
/// ```ignore
/// let mut builder = RouteMapBuilder::new();
/// builder.add_routes(&routes, None)?;
/// let map = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct RouteMapBuilder {
	map: RouteMap,
	diagnostics: Diagnostics,
}

impl RouteMapBuilder {
	/// Starts from an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts from a previously built registry. Existing entries are kept and
	/// only new paths and names are added.
	pub fn from_seed(seed: RouteMap) -> Self {
		Self {
			map: seed,
			diagnostics: Diagnostics::default(),
		}
	}

	/// Replaces the warning sink.
	pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
		self.diagnostics = diagnostics;
		self
	}

	/// The registry as built so far.
	pub fn map(&self) -> &RouteMap {
		&self.map
	}

	/// Warnings recorded so far.
	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Compiles `configs` into the registry, below `parent` when given.
	///
	/// The configs are checked before anything is registered, and a pattern
	/// that fails to compile rolls the registry back, so an error leaves the
	/// builder as it was.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::MissingPath`] or
	/// [`ConfigurationError::ComponentIdentifier`] for malformed configs,
	/// [`ConfigurationError::UnknownParent`] if `parent` is not in the
	/// registry, and [`ConfigurationError::InvalidPattern`] for paths that
	/// cannot be compiled.
	pub fn add_routes(
		&mut self,
		configs: &[RouteConfig],
		parent: Option<RouteId>,
	) -> ConfigResult<&mut Self> {
		validate(configs)?;
		if let Some(parent) = parent
			&& self.map.record(parent).is_none()
		{
			return Err(ConfigurationError::UnknownParent(parent.0.to_string()));
		}

		let snapshot = (self.map.clone(), self.diagnostics.clone());
		for config in configs {
			if let Err(e) = self.add_route_record(config, parent, None) {
				(self.map, self.diagnostics) = snapshot;
				return Err(e);
			}
		}

		self.move_wildcards_last();
		self.check_leading_slashes();
		Ok(self)
	}

	/// Finishes building.
	pub fn build(self) -> RouteMap {
		self.map
	}

	/// Finishes building and hands back the recorded warnings.
	pub fn build_with_warnings(mut self) -> (RouteMap, Vec<ConfigurationWarning>) {
		let warnings = self.diagnostics.take();
		(self.map, warnings)
	}

	/// Splits the builder back into its registry and warning sink.
	pub fn into_parts(self) -> (RouteMap, Diagnostics) {
		(self.map, self.diagnostics)
	}

	fn add_route_record(
		&mut self,
		config: &RouteConfig,
		parent: Option<RouteId>,
		match_as: Option<&str>,
	) -> ConfigResult<RouteId> {
		let Some(path) = config.path.as_deref() else {
			return Err(ConfigurationError::MissingPath {
				name: config.name.clone(),
			});
		};

		if !path.is_ascii() {
			self.diagnostics.warn(ConfigurationWarning::UnencodedPath {
				path: path.to_string(),
			});
		}

		let mut options = config.pattern_options.unwrap_or_default();
		if let Some(sensitive) = config.case_sensitive {
			options.sensitive = sensitive;
		}

		let parent_path = parent
			.and_then(|id| self.map.record(id))
			.map(|record| record.path.clone());
		let normalized = normalize_path(path, parent_path.as_deref(), options.strict);
		let pattern = self.compile(&normalized, options)?;

		// A childless config whose path and name are both taken would never
		// be reachable, so it stays out of the arena.
		let taken = self.map.path_map.get(&normalized).copied();
		let unreachable = config.children.is_empty()
			&& config
				.name
				.as_ref()
				.is_none_or(|name| self.map.name_map.contains_key(name));
		if let Some(existing) = taken
			&& unreachable
		{
			self.register_aliases(config, path, &normalized, parent)?;
			self.register_name(config, existing, match_as, normalized);
			return Ok(existing);
		}

		let id = RouteId(self.map.records.len());
		let record = RouteRecord {
			id,
			path: normalized.clone(),
			pattern,
			components: components_of(config),
			alias: config.alias.clone(),
			name: config.name.clone(),
			parent,
			match_as: match_as.map(str::to_string),
			redirect: config.redirect.clone(),
			before_enter: config.before_enter.clone(),
			meta: config.meta.clone(),
			props: props_of(config),
		};
		self.map.records.push(Rc::new(record));

		if !config.children.is_empty() {
			if let Some(name) = &config.name
				&& config.redirect.is_none()
				&& config
					.children
					.iter()
					.any(|child| matches!(child.path.as_deref(), Some("" | "/")))
			{
				self.diagnostics
					.warn(ConfigurationWarning::NamedRouteWithDefaultChild { name: name.clone() });
			}
			for child in &config.children {
				let child_match_as = match_as.map(|canonical| {
					clean_path(&format!(
						"{}/{}",
						canonical,
						child.path.as_deref().unwrap_or_default()
					))
				});
				self.add_route_record(child, Some(id), child_match_as.as_deref())?;
			}
		}

		if !self.map.path_map.contains_key(&normalized) {
			self.map.path_list.push(normalized.clone());
			self.map.path_map.insert(normalized.clone(), id);
		}

		self.register_aliases(config, path, &normalized, parent)?;
		self.register_name(config, id, match_as, normalized);

		Ok(id)
	}

	fn register_aliases(
		&mut self,
		config: &RouteConfig,
		path: &str,
		normalized: &str,
		parent: Option<RouteId>,
	) -> ConfigResult<()> {
		for alias in &config.alias {
			if alias == path {
				self.diagnostics.warn(ConfigurationWarning::AliasSameAsPath {
					path: path.to_string(),
				});
				continue;
			}
			let canonical = if normalized.is_empty() { "/" } else { normalized };
			let alias_config = RouteConfig::alias_of(alias, &config.children);
			self.add_route_record(&alias_config, parent, Some(canonical))?;
		}
		Ok(())
	}

	fn register_name(
		&mut self,
		config: &RouteConfig,
		id: RouteId,
		match_as: Option<&str>,
		normalized: String,
	) {
		let Some(name) = &config.name else {
			return;
		};
		if !self.map.name_map.contains_key(name) {
			self.map.name_map.insert(name.clone(), id);
		} else if match_as.is_none() {
			self.diagnostics.warn(ConfigurationWarning::DuplicateName {
				name: name.clone(),
				path: normalized,
			});
		}
	}

	fn compile(&mut self, path: &str, options: PatternOptions) -> ConfigResult<PathMatcher> {
		let pattern = PathMatcher::compile(path, options)?;
		let keys = pattern.duplicate_keys();
		if !keys.is_empty() {
			self.diagnostics.warn(ConfigurationWarning::DuplicateParamKeys {
				path: path.to_string(),
				keys,
			});
		}
		Ok(pattern)
	}

	fn move_wildcards_last(&mut self) {
		let (regular, wildcards): (Vec<String>, Vec<String>) = std::mem::take(&mut self.map.path_list)
			.into_iter()
			.partition(|path| path != WILDCARD);
		self.map.path_list = regular;
		self.map.path_list.extend(wildcards);
	}

	fn check_leading_slashes(&mut self) {
		if !self.diagnostics.is_enabled() {
			return;
		}
		let paths: Vec<String> = self
			.map
			.path_list
			.iter()
			.filter(|path| !path.is_empty() && !path.starts_with('*') && !path.starts_with('/'))
			.cloned()
			.collect();
		if !paths.is_empty() {
			self.diagnostics
				.warn(ConfigurationWarning::MissingLeadingSlash { paths });
		}
	}
}

/// Compiles `configs` into a registry, optionally extending `seed` below
/// `parent`. Warnings go to the default sink.
///
/// # Errors
///
/// See [`RouteMapBuilder::add_routes`].
pub fn build_route_map(
	configs: &[RouteConfig],
	seed: Option<RouteMap>,
	parent: Option<RouteId>,
) -> ConfigResult<RouteMap> {
	let mut builder = RouteMapBuilder::from_seed(seed.unwrap_or_default());
	builder.add_routes(configs, parent)?;
	Ok(builder.build())
}

fn validate(configs: &[RouteConfig]) -> ConfigResult<()> {
	for config in configs {
		let Some(path) = config.path.as_deref() else {
			return Err(ConfigurationError::MissingPath {
				name: config.name.clone(),
			});
		};
		let identifier = config
			.component
			.iter()
			.chain(config.components.values())
			.find_map(|source| match source {
				ComponentSource::Identifier(id) => Some(id.clone()),
				ComponentSource::Component(_) => None,
			});
		if let Some(identifier) = identifier {
			return Err(ConfigurationError::ComponentIdentifier {
				route: path.to_string(),
				identifier,
			});
		}
		validate(&config.children)?;
	}
	Ok(())
}

fn components_of(config: &RouteConfig) -> HashMap<String, crate::guard::Component> {
	let sources: Vec<(&str, &ComponentSource)> = if config.components.is_empty() {
		config
			.component
			.iter()
			.map(|source| (DEFAULT_SLOT, source))
			.collect()
	} else {
		config
			.components
			.iter()
			.map(|(slot, source)| (slot.as_str(), source))
			.collect()
	};
	sources
		.into_iter()
		.filter_map(|(slot, source)| match source {
			ComponentSource::Component(component) => {
				Some((slot.to_string(), Rc::clone(component)))
			}
			ComponentSource::Identifier(_) => None,
		})
		.collect()
}

fn props_of(config: &RouteConfig) -> HashMap<String, crate::config::RouteProps> {
	match &config.props {
		None => HashMap::new(),
		Some(PropsSource::Single(props)) => HashMap::from([(DEFAULT_SLOT.to_string(), props.clone())]),
		Some(PropsSource::PerSlot(props)) => props.clone(),
	}
}
