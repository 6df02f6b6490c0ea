//! Declarative route configuration.
//!
//! A [`RouteConfig`] tree is the input of the route map builder. It is only
//! read, never modified, while the registry is compiled.
//!
//! # Example
//!
//! ```ignore
//! use reinhardt_route_map::RouteConfig;
//!
//! let routes = vec![
//!     RouteConfig::new("/users")
//!         .name("users")
//!         .component(user_list)
//!         .children(vec![RouteConfig::new(":id").name("user").component(user_detail)]),
//!     RouteConfig::new("*").redirect("/"),
//! ];
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::guard::{Component, NavigationGuard, Next};
use crate::location::Location;
use crate::pattern::PatternOptions;
use crate::record::Meta;
use crate::route::Route;

/// Default slot name for a single-component route.
pub const DEFAULT_SLOT: &str = "default";

/// How a route slot refers to its component.
#[derive(Clone)]
pub enum ComponentSource {
	/// An actual component.
	Component(Component),
	/// A string identifier. Rejected by the builder.
	Identifier(String),
}

impl std::fmt::Debug for ComponentSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Component(component) => f.debug_tuple("Component").field(&component.name()).finish(),
			Self::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
		}
	}
}

impl From<Component> for ComponentSource {
	fn from(component: Component) -> Self {
		Self::Component(component)
	}
}

impl From<&str> for ComponentSource {
	fn from(identifier: &str) -> Self {
		Self::Identifier(identifier.to_string())
	}
}

impl From<String> for ComponentSource {
	fn from(identifier: String) -> Self {
		Self::Identifier(identifier)
	}
}

/// Where a slot's component props come from.
#[derive(Clone)]
pub enum RouteProps {
	/// Pass the route parameters as props.
	Params,
	/// A fixed set of props.
	Static(HashMap<String, Value>),
	/// Props computed from the resolved route.
	Computed(Rc<dyn Fn(&Route) -> HashMap<String, Value>>),
}

impl RouteProps {
	/// Resolves the props for a route.
	pub fn resolve(&self, route: &Route) -> HashMap<String, Value> {
		match self {
			Self::Params => route
				.params
				.iter()
				.map(|(k, v)| (k.clone(), Value::String(v.clone())))
				.collect(),
			Self::Static(props) => props.clone(),
			Self::Computed(compute) => compute(route),
		}
	}
}

impl std::fmt::Debug for RouteProps {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Params => write!(f, "Params"),
			Self::Static(props) => f.debug_tuple("Static").field(props).finish(),
			Self::Computed(_) => write!(f, "Computed(..)"),
		}
	}
}

/// Props declared on a config: one source, or one per slot.
#[derive(Debug, Clone)]
pub enum PropsSource {
	/// Applies to the `default` slot.
	Single(RouteProps),
	/// Keyed by slot name.
	PerSlot(HashMap<String, RouteProps>),
}

/// A redirect declared on a route.
#[derive(Clone)]
pub enum Redirect {
	/// A fixed target (path or name). Relative paths resolve against the parent route.
	To(Location),
	/// A target computed from the route being redirected.
	Computed(Rc<dyn Fn(&Route) -> Location>),
}

impl std::fmt::Debug for Redirect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::To(location) => f.debug_tuple("To").field(location).finish(),
			Self::Computed(_) => write!(f, "Computed(..)"),
		}
	}
}

impl From<&str> for Redirect {
	fn from(path: &str) -> Self {
		Self::To(Location::path(path))
	}
}

impl From<String> for Redirect {
	fn from(path: String) -> Self {
		Self::To(Location::path(path))
	}
}

impl From<Location> for Redirect {
	fn from(location: Location) -> Self {
		Self::To(location)
	}
}

/// One node of the route configuration tree.
#[derive(Clone, Default)]
pub struct RouteConfig {
	pub(crate) path: Option<String>,
	pub(crate) name: Option<String>,
	pub(crate) component: Option<ComponentSource>,
	pub(crate) components: HashMap<String, ComponentSource>,
	pub(crate) alias: Vec<String>,
	pub(crate) redirect: Option<Redirect>,
	pub(crate) before_enter: Option<NavigationGuard>,
	pub(crate) meta: Meta,
	pub(crate) props: Option<PropsSource>,
	pub(crate) case_sensitive: Option<bool>,
	pub(crate) pattern_options: Option<PatternOptions>,
	pub(crate) children: Vec<RouteConfig>,
}

impl std::fmt::Debug for RouteConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteConfig")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("alias", &self.alias)
			.field("redirect", &self.redirect)
			.field("has_before_enter", &self.before_enter.is_some())
			.field("children", &self.children)
			.finish()
	}
}

impl RouteConfig {
	/// Creates a config for `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: Some(path.into()),
			..Default::default()
		}
	}

	/// Sets the route name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the component of the default slot.
	pub fn component(mut self, component: impl Into<ComponentSource>) -> Self {
		self.component = Some(component.into());
		self
	}

	/// Sets the component of a named slot.
	pub fn slot(mut self, slot: impl Into<String>, component: impl Into<ComponentSource>) -> Self {
		self.components.insert(slot.into(), component.into());
		self
	}

	/// Adds an alias path.
	pub fn alias(mut self, alias: impl Into<String>) -> Self {
		self.alias.push(alias.into());
		self
	}

	/// Adds several alias paths, in order.
	pub fn aliases<I, S>(mut self, aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.alias.extend(aliases.into_iter().map(Into::into));
		self
	}

	/// Redirects navigation away from this route.
	pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
		self.redirect = Some(redirect.into());
		self
	}

	/// Redirects to a location computed from the matched route.
	pub fn redirect_with<F>(mut self, redirect: F) -> Self
	where
		F: Fn(&Route) -> Location + 'static,
	{
		self.redirect = Some(Redirect::Computed(Rc::new(redirect)));
		self
	}

	/// Sets the route-level guard run before entering.
	pub fn before_enter<F>(mut self, guard: F) -> Self
	where
		F: Fn(&Route, &Route, Next) + 'static,
	{
		self.before_enter = Some(Rc::new(guard));
		self
	}

	/// Adds a meta entry.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Sets the props of the default slot.
	pub fn props(mut self, props: RouteProps) -> Self {
		self.props = Some(PropsSource::Single(props));
		self
	}

	/// Sets the props of a named slot.
	pub fn slot_props(mut self, slot: impl Into<String>, props: RouteProps) -> Self {
		let mut per_slot = match self.props.take() {
			Some(PropsSource::PerSlot(map)) => map,
			Some(PropsSource::Single(single)) => HashMap::from([(DEFAULT_SLOT.to_string(), single)]),
			None => HashMap::new(),
		};
		per_slot.insert(slot.into(), props);
		self.props = Some(PropsSource::PerSlot(per_slot));
		self
	}

	/// Overrides case sensitivity of the compiled pattern.
	pub fn case_sensitive(mut self, sensitive: bool) -> Self {
		self.case_sensitive = Some(sensitive);
		self
	}

	/// Sets the pattern compile options.
	pub fn pattern_options(mut self, options: PatternOptions) -> Self {
		self.pattern_options = Some(options);
		self
	}

	/// Sets the nested routes.
	pub fn children(mut self, children: Vec<RouteConfig>) -> Self {
		self.children = children;
		self
	}

	/// Adds one nested route.
	pub fn child(mut self, child: RouteConfig) -> Self {
		self.children.push(child);
		self
	}

	/// The configured path, if any.
	pub fn path_str(&self) -> Option<&str> {
		self.path.as_deref()
	}

	/// The configured name, if any.
	pub fn name_str(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// A config with only a path and children, as synthesized for aliases.
	pub(crate) fn alias_of(alias: &str, children: &[RouteConfig]) -> Self {
		Self {
			path: Some(alias.to_string()),
			children: children.to_vec(),
			..Default::default()
		}
	}
}
