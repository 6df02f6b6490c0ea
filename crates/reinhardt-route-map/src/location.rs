//! Navigation targets and query strings.

use crate::path::{encode_path, parse_path, resolve_path};
use crate::pattern::{Params, fill_params};
use crate::route::Route;

/// An ordered query string. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses `a=1&b=2`, with or without a leading `?`.
	///
	/// Malformed input yields an empty query.
	pub fn parse(raw: &str) -> Self {
		let raw = raw.trim().trim_start_matches(['?', '#', '&']);
		if raw.is_empty() {
			return Self::new();
		}
		match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
			Ok(pairs) => Self(pairs),
			Err(e) => {
				tracing::warn!(target: "reinhardt_route_map", "cannot parse query \"{}\": {}", raw, e);
				Self::new()
			}
		}
	}

	/// Appends a key/value pair.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.push((key.into(), value.into()));
	}

	/// Builder form of [`Query::append`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.append(key, value);
		self
	}

	/// First value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Every value for `key`, in order.
	pub fn get_all(&self, key: &str) -> Vec<&str> {
		self.0
			.iter()
			.filter(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
			.collect()
	}

	/// Returns whether the query has no pairs.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over the pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Replaces every key present in `overrides` with the override's values.
	pub fn merge(&mut self, overrides: &Query) {
		self.0
			.retain(|(key, _)| !overrides.0.iter().any(|(k, _)| k == key));
		self.0.extend(overrides.0.iter().cloned());
	}

	/// Order-insensitive comparison.
	pub fn same_pairs(&self, other: &Query) -> bool {
		let mut left = self.0.clone();
		let mut right = other.0.clone();
		left.sort();
		right.sort();
		left == right
	}

	/// Serializes to `?a=1&b=2`, or an empty string for an empty query.
	pub fn to_query_string(&self) -> String {
		if self.0.is_empty() {
			return String::new();
		}
		match serde_urlencoded::to_string(&self.0) {
			Ok(encoded) if !encoded.is_empty() => format!("?{}", encoded),
			_ => String::new(),
		}
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

/// A navigation target: a raw path (which may carry `?query` and `#hash`),
/// a route name, or only parameters relative to the current route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
	/// Target path.
	pub path: Option<String>,
	/// Target route name. Takes precedence over `path`.
	pub name: Option<String>,
	/// Parameters for named or relative navigation.
	pub params: Params,
	/// Extra query pairs, overriding those in `path`.
	pub query: Query,
	/// Fragment, with or without the leading `#`.
	pub hash: String,
	/// Resolve a relative `path` below the current path instead of beside it.
	pub append: bool,
	/// Replace the current history entry instead of pushing a new one.
	pub replace: bool,
}

impl Location {
	/// A location targeting a path.
	pub fn path(path: impl Into<String>) -> Self {
		Self {
			path: Some(path.into()),
			..Default::default()
		}
	}

	/// A location targeting a named route.
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Default::default()
		}
	}

	/// A location carrying only parameters, resolved against the current route.
	pub fn params<I, K, V>(params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::default().with_params(params)
	}

	/// Adds a parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}

	/// Adds several parameters.
	pub fn with_params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.params
			.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
		self
	}

	/// Sets the extra query.
	pub fn with_query(mut self, query: Query) -> Self {
		self.query = query;
		self
	}

	/// Sets the hash.
	pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
		self.hash = hash.into();
		self
	}

	/// Marks the location as a replacement of the current entry.
	pub fn replacing(mut self) -> Self {
		self.replace = true;
		self
	}

	/// Marks a relative path as appended to the current path.
	pub fn appending(mut self) -> Self {
		self.append = true;
		self
	}

	/// Resolves this location against the current route.
	///
	/// Named locations are returned as they are. Parameter-only locations
	/// inherit the current route's name (or its last matched template).
	/// Path locations are split into path, query and hash, with relative
	/// paths resolved against the current path. Path and hash come out
	/// percent-encoded as the address would store them.
	pub fn normalize(&self, current: Option<&Route>, append: bool) -> Location {
		if self.name.is_some() {
			return self.clone();
		}

		if self.path.is_none() && !self.params.is_empty() {
			if let Some(current) = current {
				return self.relative_to(current);
			}
		}

		let (raw_path, raw_query, raw_hash) = parse_path(self.path.as_deref().unwrap_or_default());
		let base_path = current
			.map(|route| route.path.as_str())
			.filter(|path| !path.is_empty())
			.unwrap_or("/");
		let path = if raw_path.is_empty() {
			base_path.to_string()
		} else {
			resolve_path(&raw_path, base_path, append || self.append)
		};

		let mut query = Query::parse(&raw_query);
		query.merge(&self.query);

		let hash = if self.hash.is_empty() { raw_hash } else { self.hash.clone() };
		let hash = if !hash.is_empty() && !hash.starts_with('#') {
			format!("#{}", hash)
		} else {
			hash
		};

		Location {
			path: Some(encode_path(&path)),
			name: None,
			params: Params::new(),
			query,
			hash: encode_path(&hash),
			append: false,
			replace: self.replace,
		}
	}

	fn relative_to(&self, current: &Route) -> Location {
		let mut params = current.params.clone();
		params.extend(self.params.clone());

		let mut next = self.clone();
		if let Some(name) = &current.name {
			next.name = Some(name.clone());
			next.params = params;
		} else if let Some(record) = current.matched.last() {
			match fill_params(record.path(), &params) {
				Ok(path) => next.path = Some(path),
				Err(e) => {
					tracing::warn!(target: "reinhardt_route_map", "cannot apply params relative to \"{}\": {}", current.path, e);
					next.path = Some(String::new());
				}
			}
			next.params = Params::new();
		} else {
			tracing::warn!(target: "reinhardt_route_map", "params-only navigation needs a current route");
		}
		next
	}

	/// Joins `path`, query and hash into the full form used for URLs.
	pub fn full_path(&self) -> String {
		full_path(
			self.path.as_deref().unwrap_or_default(),
			&self.query,
			&self.hash,
		)
	}
}

impl From<&str> for Location {
	fn from(path: &str) -> Self {
		Location::path(path)
	}
}

impl From<String> for Location {
	fn from(path: String) -> Self {
		Location::path(path)
	}
}

impl From<&String> for Location {
	fn from(path: &String) -> Self {
		Location::path(path.as_str())
	}
}

/// `path + ?query + #hash`, with an empty path rendered as `/`.
pub fn full_path(path: &str, query: &Query, hash: &str) -> String {
	let path = if path.is_empty() { "/" } else { path };
	format!("{}{}{}", path, query.to_query_string(), hash)
}
