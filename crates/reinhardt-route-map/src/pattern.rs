//! Path template compilation.
//!
//! Route paths use the Express-style template syntax:
//!
//! - `/users` - literal match
//! - `/users/:id` - a named segment (excludes the delimiter `/`)
//! - `/users/:id?` - an optional segment
//! - `/files/:path+` / `/files/:path*` - repeated segments (one or more / zero or more)
//! - `/users/:id(\\d+)` - a segment constrained by a custom expression
//! - `/(.*)` - an unnamed group, exposed under a positional key
//! - `*` - matches everything; exposed as `pathMatch`
//!
//! Matching always covers the full candidate path. Case sensitivity and
//! trailing-slash strictness are controlled by [`PatternOptions`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, ConfigurationError};

/// Parameters extracted from a path, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// Maximum allowed length of a path template in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of segments in a path template.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum size of a compiled pattern expression in bytes.
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Key under which the first unnamed group (and `*`) is exposed.
pub const PATH_MATCH_KEY: &str = "pathMatch";

/// Tokenizer for path templates.
///
/// Groups: 1 escaped char, 2 prefix, 3 name, 4 custom expression of a named
/// param, 5 unnamed group, 6 modifier, 7 bare asterisk.
static TEMPLATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(\\.)|([/.])?(?:(?::(\w+)(?:\(((?:\\.|[^\\()])+)\))?|\(((?:\\.|[^\\()])+)\))([+*?])?|(\*))",
	)
	.expect("template tokenizer is a valid expression")
});

/// Options for [`PathMatcher::compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
	/// When set, a trailing slash is significant.
	pub strict: bool,
	/// When set, matching is case sensitive.
	pub sensitive: bool,
}

/// The name of a path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamName {
	/// `:name`
	Named(String),
	/// An unnamed group or `*`, numbered from zero in template order.
	Index(usize),
}

impl ParamName {
	/// The key this parameter is stored under in [`Params`].
	pub fn key(&self) -> String {
		match self {
			Self::Named(name) => name.clone(),
			Self::Index(0) => PATH_MATCH_KEY.to_string(),
			Self::Index(index) => index.to_string(),
		}
	}
}

/// Describes one parameter of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
	/// The parameter name.
	pub name: ParamName,
	/// Delimiter character preceding the parameter, if any.
	pub prefix: Option<char>,
	/// Segment delimiter (the prefix, or `/`).
	pub delimiter: char,
	/// `?` or `*` modifier.
	pub optional: bool,
	/// `+` or `*` modifier.
	pub repeat: bool,
	/// The parameter is followed by something other than its prefix.
	pub partial: bool,
	/// Declared as a bare `*`.
	pub asterisk: bool,
	/// Expression a single segment must match.
	pub pattern: String,
}

#[derive(Debug, Clone)]
enum Token {
	Literal(String),
	Param(usize),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
	path: String,
	regex: Regex,
	tokens: Vec<Token>,
	keys: Vec<ParamDescriptor>,
	options: PatternOptions,
}

impl PathMatcher {
	/// Compiles a path template.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::InvalidPattern`] if the template is too
	/// long, has too many segments, or produces an expression the regex engine
	/// rejects.
	pub fn compile(path: &str, options: PatternOptions) -> ConfigResult<Self> {
		if path.len() > MAX_PATTERN_LENGTH {
			return Err(invalid(
				path,
				format!(
					"length {} exceeds maximum allowed length of {} bytes",
					path.len(),
					MAX_PATTERN_LENGTH
				),
			));
		}
		let segment_count = path.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(invalid(
				path,
				format!(
					"{} path segments, exceeding maximum of {}",
					segment_count, MAX_PATH_SEGMENTS
				),
			));
		}

		let (tokens, keys) = parse(path);
		let source = to_regex_source(&tokens, &keys, options);
		let regex = RegexBuilder::new(&source)
			.case_insensitive(!options.sensitive)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| invalid(path, e.to_string()))?;

		Ok(Self {
			path: path.to_string(),
			regex,
			tokens,
			keys,
			options,
		})
	}

	/// The template this matcher was compiled from.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// The compile options.
	pub fn options(&self) -> PatternOptions {
		self.options
	}

	/// Parameter descriptors in template order.
	pub fn keys(&self) -> &[ParamDescriptor] {
		&self.keys
	}

	/// Parameter names declared more than once, each listed once.
	pub fn duplicate_keys(&self) -> Vec<String> {
		let mut seen = Vec::new();
		let mut duplicates = Vec::new();
		for key in &self.keys {
			let name = key.name.key();
			if seen.contains(&name) {
				if !duplicates.contains(&name) {
					duplicates.push(name);
				}
			} else {
				seen.push(name);
			}
		}
		duplicates
	}

	/// Checks whether the candidate path matches.
	pub fn is_match(&self, candidate: &str) -> bool {
		self.regex.is_match(candidate)
	}

	/// Matches a candidate path, returning decoded parameters.
	///
	/// Unmatched optional parameters are absent. A name bound more than once
	/// keeps its first binding.
	pub fn matches(&self, candidate: &str) -> Option<Params> {
		let captures = self.regex.captures(candidate)?;
		let mut params = Params::new();
		for (index, key) in self.keys.iter().enumerate() {
			let Some(value) = captures.get(index + 1) else {
				continue;
			};
			params
				.entry(key.name.key())
				.or_insert_with(|| decode(value.as_str()));
		}
		Some(params)
	}

	/// Builds a concrete path by substituting `params` into the template.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::MissingParameter`] when a required
	/// parameter is absent and [`ConfigurationError::InvalidParameter`] when a
	/// value does not satisfy its segment expression.
	pub fn fill(&self, params: &Params) -> ConfigResult<String> {
		let mut result = String::new();
		for token in &self.tokens {
			let key = match token {
				Token::Literal(literal) => {
					result.push_str(literal);
					continue;
				}
				Token::Param(index) => &self.keys[*index],
			};
			let name = key.name.key();
			let value = match params.get(&name) {
				Some(value) if !value.is_empty() || !key.optional => value,
				_ if key.optional => {
					if let (true, Some(prefix)) = (key.partial, key.prefix) {
						result.push(prefix);
					}
					continue;
				}
				_ => {
					return Err(ConfigurationError::MissingParameter {
						path: self.path.clone(),
						param: name,
					});
				}
			};

			let segment = if key.asterisk || key.repeat {
				encode_segments(value)
			} else {
				urlencoding::encode(value).into_owned()
			};

			let checker = Regex::new(&segment_check_source(key)).map_err(|e| {
				invalid(&self.path, format!("param \"{}\": {}", name, e))
			})?;
			if !checker.is_match(&segment) {
				return Err(ConfigurationError::InvalidParameter {
					path: self.path.clone(),
					param: name,
					value: value.clone(),
				});
			}

			if let Some(prefix) = key.prefix {
				result.push(prefix);
			}
			result.push_str(&segment);
		}
		Ok(result)
	}
}

impl PartialEq for PathMatcher {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path && self.options == other.options
	}
}

impl Eq for PathMatcher {}

impl std::fmt::Display for PathMatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.path)
	}
}

/// Compiles `path` with default options and fills it with `params`.
pub fn fill_params(path: &str, params: &Params) -> ConfigResult<String> {
	PathMatcher::compile(path, PatternOptions::default())?.fill(params)
}

fn invalid(path: &str, reason: String) -> ConfigurationError {
	ConfigurationError::InvalidPattern {
		path: path.to_string(),
		reason,
	}
}

fn decode(value: &str) -> String {
	urlencoding::decode(value)
		.map(|decoded| decoded.into_owned())
		.unwrap_or_else(|_| value.to_string())
}

fn encode_segments(value: &str) -> String {
	value
		.split('/')
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<_>>()
		.join("/")
}

fn segment_check_source(key: &ParamDescriptor) -> String {
	if key.repeat {
		let delimiter = regex::escape(&key.delimiter.to_string());
		format!(
			"^(?:{pattern})(?:{delimiter}(?:{pattern}))*$",
			pattern = key.pattern,
			delimiter = delimiter
		)
	} else {
		format!("^(?:{})$", key.pattern)
	}
}

fn parse(template: &str) -> (Vec<Token>, Vec<ParamDescriptor>) {
	let mut tokens = Vec::new();
	let mut keys = Vec::new();
	let mut next_index = 0usize;
	let mut literal = String::new();
	let mut cursor = 0usize;

	for caps in TEMPLATE_TOKEN.captures_iter(template) {
		let Some(whole) = caps.get(0) else {
			continue;
		};
		literal.push_str(&template[cursor..whole.start()]);
		cursor = whole.end();

		if let Some(escaped) = caps.get(1) {
			literal.push_str(&escaped.as_str()[1..]);
			continue;
		}

		let following = template[cursor..].chars().next();
		let prefix = caps.get(2).and_then(|m| m.as_str().chars().next());
		let modifier = caps.get(6).map(|m| m.as_str());
		let asterisk = caps.get(7).is_some();

		if !literal.is_empty() {
			tokens.push(Token::Literal(std::mem::take(&mut literal)));
		}

		let name = match caps.get(3) {
			Some(name) => ParamName::Named(name.as_str().to_string()),
			None => {
				let name = ParamName::Index(next_index);
				next_index += 1;
				name
			}
		};
		let delimiter = prefix.unwrap_or('/');
		let pattern = match caps.get(4).or_else(|| caps.get(5)) {
			Some(custom) => custom.as_str().to_string(),
			None if asterisk => ".*".to_string(),
			None => format!("[^{}]+?", regex::escape(&delimiter.to_string())),
		};

		tokens.push(Token::Param(keys.len()));
		keys.push(ParamDescriptor {
			name,
			prefix,
			delimiter,
			optional: matches!(modifier, Some("?") | Some("*")),
			repeat: matches!(modifier, Some("+") | Some("*")),
			partial: prefix.is_some() && following.is_some_and(|c| Some(c) != prefix),
			asterisk,
			pattern,
		});
	}

	literal.push_str(&template[cursor..]);
	if !literal.is_empty() {
		tokens.push(Token::Literal(literal));
	}

	(tokens, keys)
}

fn to_regex_source(tokens: &[Token], keys: &[ParamDescriptor], options: PatternOptions) -> String {
	let mut route = String::new();

	for token in tokens {
		let key = match token {
			Token::Literal(literal) => {
				route.push_str(&regex::escape(literal));
				continue;
			}
			Token::Param(index) => &keys[*index],
		};

		let prefix = key
			.prefix
			.map(|c| regex::escape(&c.to_string()))
			.unwrap_or_default();
		let mut capture = format!("(?:{})", key.pattern);
		if key.repeat {
			capture = format!("{capture}(?:{prefix}{capture})*");
		}
		let capture = if key.optional {
			if key.partial {
				format!("{prefix}({capture})?")
			} else {
				format!("(?:{prefix}({capture}))?")
			}
		} else {
			format!("{prefix}({capture})")
		};
		route.push_str(&capture);
	}

	if !options.strict {
		if let Some(stripped) = route.strip_suffix('/') {
			route.truncate(stripped.len());
		}
		route.push_str("/?");
	}

	format!("^{}$", route)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn compile(path: &str) -> PathMatcher {
		PathMatcher::compile(path, PatternOptions::default()).unwrap()
	}

	fn params(pairs: &[(&str, &str)]) -> Params {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_literal_pattern() {
		let matcher = compile("/users");

		assert!(matcher.keys().is_empty());
		assert!(matcher.is_match("/users"));
		assert!(matcher.is_match("/users/"));
		assert!(!matcher.is_match("/users/1"));
	}

	#[rstest]
	fn test_named_param() {
		let matcher = compile("/users/:id");

		let matched = matcher.matches("/users/42").unwrap();
		assert_eq!(matched, params(&[("id", "42")]));
		assert!(!matcher.is_match("/users"));
		assert!(!matcher.is_match("/users/42/posts"));
	}

	#[rstest]
	fn test_param_value_is_decoded() {
		let matcher = compile("/tags/:tag");

		let matched = matcher.matches("/tags/caf%C3%A9%20bar").unwrap();
		assert_eq!(matched.get("tag"), Some(&"café bar".to_string()));
	}

	#[rstest]
	fn test_optional_param() {
		let matcher = compile("/users/:id?");

		assert!(matcher.keys()[0].optional);
		assert!(matcher.matches("/users").unwrap().is_empty());
		assert_eq!(
			matcher.matches("/users/7").unwrap(),
			params(&[("id", "7")])
		);
	}

	#[rstest]
	#[case("/files/:path+", "/files", false)]
	#[case("/files/:path+", "/files/a/b/c", true)]
	#[case("/files/:path*", "/files", true)]
	#[case("/files/:path*", "/files/a/b", true)]
	fn test_repeat_modifiers(#[case] template: &str, #[case] candidate: &str, #[case] expected: bool) {
		assert_eq!(compile(template).is_match(candidate), expected);
	}

	#[rstest]
	fn test_repeat_param_captures_all_segments() {
		let matcher = compile("/files/:path+");

		let matched = matcher.matches("/files/a/b/c").unwrap();
		assert_eq!(matched.get("path"), Some(&"a/b/c".to_string()));
	}

	#[rstest]
	fn test_custom_expression() {
		let matcher = compile(r"/users/:id(\d+)");

		assert!(matcher.is_match("/users/123"));
		assert!(!matcher.is_match("/users/abc"));
	}

	#[rstest]
	fn test_wildcard_exposes_path_match() {
		let matcher = compile("*");

		let matched = matcher.matches("/anything/at/all").unwrap();
		assert_eq!(
			matched.get(PATH_MATCH_KEY),
			Some(&"/anything/at/all".to_string())
		);
		assert!(matcher.keys()[0].asterisk);
	}

	#[rstest]
	fn test_unnamed_groups_are_numbered() {
		let matcher = compile("/a/(\\d+)/(\\w+)");

		let matched = matcher.matches("/a/12/xy").unwrap();
		assert_eq!(matched.get(PATH_MATCH_KEY), Some(&"12".to_string()));
		assert_eq!(matched.get("1"), Some(&"xy".to_string()));
	}

	#[rstest]
	fn test_case_sensitivity() {
		let insensitive = compile("/About");
		let sensitive = PathMatcher::compile(
			"/About",
			PatternOptions {
				sensitive: true,
				..Default::default()
			},
		)
		.unwrap();

		assert!(insensitive.is_match("/about"));
		assert!(sensitive.is_match("/About"));
		assert!(!sensitive.is_match("/about"));
	}

	#[rstest]
	fn test_strict_trailing_slash() {
		let strict = PathMatcher::compile(
			"/users/",
			PatternOptions {
				strict: true,
				..Default::default()
			},
		)
		.unwrap();

		assert!(strict.is_match("/users/"));
		assert!(!strict.is_match("/users"));
	}

	#[rstest]
	fn test_escaped_characters_are_literal() {
		let matcher = compile("/api/v1.0/\\:raw");

		assert!(matcher.is_match("/api/v1.0/:raw"));
		assert!(!matcher.is_match("/api/v1X0/:raw"));
		assert!(matcher.keys().is_empty());
	}

	#[rstest]
	fn test_duplicate_keys_first_binding_wins() {
		let matcher = compile("/:id/sub/:id");

		assert_eq!(matcher.duplicate_keys(), vec!["id".to_string()]);
		let matched = matcher.matches("/first/sub/second").unwrap();
		assert_eq!(matched.get("id"), Some(&"first".to_string()));
	}

	#[rstest]
	fn test_fill_named_params() {
		let matcher = compile("/users/:user_id/posts/:post_id");

		let filled = matcher
			.fill(&params(&[("user_id", "42"), ("post_id", "7")]))
			.unwrap();
		assert_eq!(filled, "/users/42/posts/7");
	}

	#[rstest]
	fn test_fill_skips_missing_optional() {
		let matcher = compile("/users/:id?");

		assert_eq!(matcher.fill(&Params::new()).unwrap(), "/users");
	}

	#[rstest]
	fn test_fill_missing_required_param() {
		let matcher = compile("/users/:id");

		let err = matcher.fill(&Params::new()).unwrap_err();
		assert!(matches!(err, ConfigurationError::MissingParameter { param, .. } if param == "id"));
	}

	#[rstest]
	fn test_fill_rejects_value_outside_expression() {
		let matcher = compile(r"/users/:id(\d+)");

		let err = matcher.fill(&params(&[("id", "abc")])).unwrap_err();
		assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
	}

	#[rstest]
	fn test_fill_encodes_values() {
		let matcher = compile("/tags/:tag");

		let filled = matcher.fill(&params(&[("tag", "a b")])).unwrap();
		assert_eq!(filled, "/tags/a%20b");
	}

	#[rstest]
	fn test_fill_wildcard_keeps_slashes() {
		let matcher = compile("/docs/*");

		let filled = matcher
			.fill(&params(&[(PATH_MATCH_KEY, "guide/intro")]))
			.unwrap();
		assert_eq!(filled, "/docs/guide/intro");
	}

	#[rstest]
	fn test_rejects_excessive_length() {
		// Arrange
		let long_pattern = "/".to_string() + &"a".repeat(1025);

		// Act
		let result = PathMatcher::compile(&long_pattern, PatternOptions::default());

		// Assert
		assert!(matches!(result, Err(ConfigurationError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_rejects_excessive_segments() {
		// Arrange
		let segments: Vec<&str> = (0..35).map(|_| "seg").collect();
		let pattern = format!("/{}", segments.join("/"));

		// Act
		let result = PathMatcher::compile(&pattern, PatternOptions::default());

		// Assert
		assert!(result.is_err());
	}

	#[rstest]
	fn test_rejects_unsupported_expression() {
		let result = PathMatcher::compile("/a/:id(?=x)", PatternOptions::default());

		assert!(matches!(result, Err(ConfigurationError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_options_deserialize_with_defaults() {
		let options: PatternOptions = serde_json::from_str(r#"{"sensitive": true}"#).unwrap();

		assert!(options.sensitive);
		assert!(!options.strict);
	}
}
