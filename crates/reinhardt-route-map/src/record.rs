//! Compiled route records.

use std::collections::HashMap;

use crate::config::{Redirect, RouteProps};
use crate::guard::{Component, NavigationGuard};
use crate::pattern::PathMatcher;

/// Opaque per-route metadata.
pub type Meta = HashMap<String, serde_json::Value>;

/// Index of a record in its [`RouteMap`](crate::RouteMap).
///
/// Parent links are stored as ids rather than references, so records never
/// own each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
	/// Position of the record in the registry's arena.
	pub fn index(self) -> usize {
		self.0
	}
}

/// A compiled registry entry for one config node or one alias.
///
/// Records are immutable once built. Adding routes produces new records
/// rather than editing existing ones.
#[derive(Clone)]
pub struct RouteRecord {
	pub(crate) id: RouteId,
	pub(crate) path: String,
	pub(crate) pattern: PathMatcher,
	pub(crate) components: HashMap<String, Component>,
	pub(crate) alias: Vec<String>,
	pub(crate) name: Option<String>,
	pub(crate) parent: Option<RouteId>,
	pub(crate) match_as: Option<String>,
	pub(crate) redirect: Option<Redirect>,
	pub(crate) before_enter: Option<NavigationGuard>,
	pub(crate) meta: Meta,
	pub(crate) props: HashMap<String, RouteProps>,
}

impl RouteRecord {
	/// Registry id.
	pub fn id(&self) -> RouteId {
		self.id
	}

	/// Normalized absolute path; the registry key.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Compiled matcher for [`RouteRecord::path`].
	pub fn pattern(&self) -> &PathMatcher {
		&self.pattern
	}

	/// Components keyed by slot name.
	pub fn components(&self) -> &HashMap<String, Component> {
		&self.components
	}

	/// Component of a slot.
	pub fn component(&self, slot: &str) -> Option<&Component> {
		self.components.get(slot)
	}

	/// Declared alias paths, in order.
	pub fn alias(&self) -> &[String] {
		&self.alias
	}

	/// Route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Parent record id.
	pub fn parent(&self) -> Option<RouteId> {
		self.parent
	}

	/// Canonical path when this record was created for an alias.
	pub fn match_as(&self) -> Option<&str> {
		self.match_as.as_deref()
	}

	/// Whether this record was created for an alias.
	pub fn is_alias(&self) -> bool {
		self.match_as.is_some()
	}

	/// Declared redirect.
	pub fn redirect(&self) -> Option<&Redirect> {
		self.redirect.as_ref()
	}

	/// Route-level enter guard.
	pub fn before_enter(&self) -> Option<&NavigationGuard> {
		self.before_enter.as_ref()
	}

	/// Route metadata.
	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	/// Props source keyed by slot name.
	pub fn props(&self) -> &HashMap<String, RouteProps> {
		&self.props
	}
}

impl std::fmt::Debug for RouteRecord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteRecord")
			.field("id", &self.id)
			.field("path", &self.path)
			.field("name", &self.name)
			.field("parent", &self.parent)
			.field("match_as", &self.match_as)
			.field("alias", &self.alias)
			.field("slots", &self.components.keys().collect::<Vec<_>>())
			.field("redirect", &self.redirect)
			.finish()
	}
}
