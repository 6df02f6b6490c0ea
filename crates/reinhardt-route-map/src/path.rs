//! Path normalization helpers.
//!
//! These operate on raw route paths before pattern compilation and on
//! location paths before matching.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters the address bar escapes in a path or fragment. `%` is not in
/// the set, so existing escapes pass through unchanged.
const ADDRESS_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Collapses runs of `/` into a single separator.
pub fn clean_path(path: &str) -> String {
	let mut cleaned = String::with_capacity(path.len());
	let mut previous_slash = false;
	for c in path.chars() {
		if c == '/' {
			if previous_slash {
				continue;
			}
			previous_slash = true;
		} else {
			previous_slash = false;
		}
		cleaned.push(c);
	}
	cleaned
}

/// Resolves a configured route path against its parent's normalized path.
///
/// Without `strict`, one trailing slash is dropped (the root `/` is kept as
/// is). Paths starting with `/` are absolute and returned unchanged; relative
/// paths are joined to `parent` with a single separator.
pub fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
	let path = if !strict && path.len() > 1 {
		path.strip_suffix('/').unwrap_or(path)
	} else {
		path
	};

	if path.starts_with('/') {
		return path.to_string();
	}

	match parent {
		Some(parent) => clean_path(&format!("{}/{}", parent, path)),
		None => path.to_string(),
	}
}

/// Resolves `relative` against `base` the way a browser resolves links.
///
/// With `append`, `relative` is appended below `base` instead of replacing
/// its last segment.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
	if relative.starts_with('/') {
		return relative.to_string();
	}
	if relative.is_empty() || relative.starts_with('?') || relative.starts_with('#') {
		return format!("{}{}", base, relative);
	}

	let mut stack: Vec<&str> = base.split('/').collect();
	// The last segment of a non-appending base is the "file" being replaced.
	if !append || stack.last().is_some_and(|s| s.is_empty()) {
		stack.pop();
	}

	for segment in relative.trim_start_matches('/').split('/') {
		match segment {
			".." => {
				stack.pop();
			}
			"." => {}
			other => stack.push(other),
		}
	}

	if stack.first().is_none_or(|s| !s.is_empty()) {
		stack.insert(0, "");
	}

	stack.join("/")
}

/// Percent-encodes `path` the way the address stores it.
///
/// Non-ASCII characters and spaces are escaped; separators such as `/` and
/// `:` and already escaped sequences are kept.
pub fn encode_path(path: &str) -> String {
	utf8_percent_encode(path, ADDRESS_ESCAPES).to_string()
}

/// Splits a raw location into `(path, query, hash)`.
///
/// The hash keeps its leading `#`; the query is returned without `?`.
pub fn parse_path(raw: &str) -> (String, String, String) {
	let (rest, hash) = match raw.find('#') {
		Some(index) => (&raw[..index], raw[index..].to_string()),
		None => (raw, String::new()),
	};
	let (path, query) = match rest.find('?') {
		Some(index) => (&rest[..index], rest[index + 1..].to_string()),
		None => (rest, String::new()),
	};
	(path.to_string(), query, hash)
}
