//! # Reinhardt Navigation
//!
//! Client-side navigation for Reinhardt front ends.
//!
//! ## Crates
//!
//! - [`route_map`]: compiles nested route configuration into a flat registry
//!   and matches locations against it
//! - [`history`]: the guard pipeline and the hash, push-state and in-memory
//!   history backends
//!
//! This crate ties both together behind [`Router`].
//!
//! ## Quick Start
//!
//! ```rust
//! use reinhardt_navigation::prelude::*;
//!
//! let router = Router::builder()
//!     .routes(vec![
//!         RouteConfig::new("/").name("home"),
//!         RouteConfig::new("/users/:id").name("user"),
//!     ])
//!     .options(RouterOptions::new().with_mode(RouterMode::Abstract))
//!     .build()
//!     .unwrap();
//!
//! let _guard = router.before_each(|to, _from, next| {
//!     if to.path == "/users/0" {
//!         next.redirect("/");
//!     } else {
//!         next.proceed();
//!     }
//! });
//!
//! router.push(Location::named("user").with_param("id", "7"));
//! assert_eq!(router.current_route().full_path, "/users/7");
//! ```

pub mod error;
pub mod options;
pub mod router;

pub use reinhardt_history as history;
pub use reinhardt_route_map as route_map;

// Re-export main types for convenience
pub use error::{RouterError, RouterResult};
pub use options::{RouterMode, RouterOptions};
pub use router::{Resolved, Router, RouterBuilder, create_href};

/// Commonly used types.
pub mod prelude {
	pub use crate::{Resolved, Router, RouterBuilder, RouterError, RouterMode, RouterOptions};
	pub use reinhardt_history::{
		BrowserEnvironment, HookHandle, MemoryEnvironment, NavigationBackend, NavigationFailure,
		NavigationFailureType, ScrollBehavior,
	};
	pub use reinhardt_route_map::{
		ConfigurationError, Location, Next, Query, Redirect, Route, RouteComponent, RouteConfig,
	};
}
