//! Navigation transitions and history backends for Reinhardt client-side
//! navigation.
//!
//! A [`TransitionController`] owns the committed [`Route`](reinhardt_route_map::Route)
//! and runs the guard pipeline. Backends persist the committed route into a
//! medium and translate external navigation into transitions:
//!
//! - [`HashBackend`]: the URL fragment (`/#/users/1`)
//! - [`Html5Backend`]: the address path through `history.pushState`
//! - [`MemoryBackend`]: an in-process stack
//!
//! Address access goes through [`BrowserEnvironment`]. [`MemoryEnvironment`]
//! implements it for tests and native hosts; `WindowEnvironment` wraps the
//! browser window on `wasm32`.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use reinhardt_history::{MemoryBackend, NavigationBackend, TransitionController};
//! use reinhardt_route_map::{Location, RouteConfig, RouteMatcher};
//!
//! let matcher = RouteMatcher::new(&[RouteConfig::new("/"), RouteConfig::new("/about")]).unwrap();
//! let controller = TransitionController::new(Rc::new(RefCell::new(matcher)));
//! let backend = MemoryBackend::new(controller, "");
//!
//! backend.push(Location::path("/about"), None, None);
//! assert_eq!(backend.current().path, "/about");
//! ```

pub mod backend;
pub mod env;
pub mod failure;
pub mod hash;
pub mod html5;
pub mod memory;
pub mod queue;
pub mod scroll;
pub mod transition;

pub use backend::{NavigationBackend, normalize_base};
#[cfg(target_arch = "wasm32")]
pub use env::WindowEnvironment;
pub use env::{BrowserEnvironment, EnvMutation, MemoryEnvironment, NavigationEvent, Teardown};
pub use failure::{NavigationFailure, NavigationFailureType};
pub use hash::{HashBackend, HashReadiness, get_hash};
pub use html5::{Html5Backend, get_location};
pub use memory::MemoryBackend;
pub use queue::{Advance, run_queue};
pub use scroll::ScrollBehavior;
pub use transition::{
	AbortCallback, BackendLink, CompleteCallback, HookHandle, TransitionController,
};
