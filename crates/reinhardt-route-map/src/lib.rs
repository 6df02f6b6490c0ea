//! Route configuration compiler for Reinhardt client-side navigation.
//!
//! This crate turns a nested, declarative route configuration into a flat
//! registry and resolves locations against it:
//!
//! - **Path patterns**: `:param`, optional/repeatable modifiers, custom
//!   expressions and `*` wildcards
//! - **Registry**: ordered path list plus path and name lookups, with aliases,
//!   redirects and wildcard ordering
//! - **Matching**: locations (paths, names or bare params) into [`Route`]
//!   snapshots
//! - **Guards**: the [`Next`] continuation shared by every navigation guard
//!
//! # Quick Start
//!
//! ```rust
//! use reinhardt_route_map::{RouteConfig, RouteMatcher};
//!
//! let matcher = RouteMatcher::new(&[
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/users/:id").name("user"),
//!     RouteConfig::new("*").redirect("/"),
//! ])
//! .unwrap();
//!
//! let route = matcher.match_location("/users/42", None, None);
//! assert_eq!(route.params["id"], "42");
//! ```

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod guard;
pub mod location;
pub mod matcher;
pub mod path;
pub mod pattern;
pub mod record;
pub mod route;

// Re-export main types for convenience
pub use builder::{RouteMap, RouteMapBuilder, WILDCARD, build_route_map};
pub use config::{ComponentSource, DEFAULT_SLOT, PropsSource, Redirect, RouteConfig, RouteProps};
pub use diagnostics::{ConfigurationWarning, Diagnostics};
pub use error::{ConfigResult, ConfigurationError};
pub use guard::{
	AfterHook, Component, GuardDecision, NavigationGuard, Next, RouteComponent, guard,
};
pub use location::{Location, Query};
pub use matcher::{MAX_REDIRECT_DEPTH, RouteMatcher};
pub use path::{clean_path, encode_path, normalize_path, parse_path, resolve_path};
pub use pattern::{
	ParamDescriptor, ParamName, Params, PathMatcher, PatternOptions, fill_params,
};
pub use record::{Meta, RouteId, RouteRecord};
pub use route::Route;
