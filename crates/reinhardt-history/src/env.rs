//! The address-bar environment backends persist locations into.
//!
//! [`BrowserEnvironment`] is the seam between the history backends and the
//! host. [`MemoryEnvironment`] is a deterministic stand-in for tests and
//! native hosts; on `wasm32` targets, [`WindowEnvironment`] drives the real
//! `window.location` and `window.history`.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

/// Releases a subscription or other setup when called.
pub type Teardown = Box<dyn FnOnce()>;

/// External navigation notifications a backend can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationEvent {
	/// History traversal (`popstate`).
	PopState,
	/// Fragment change (`hashchange`).
	HashChange,
}

impl NavigationEvent {
	/// The DOM event name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::PopState => "popstate",
			Self::HashChange => "hashchange",
		}
	}

	/// The channel to listen on, chosen once from the host's capabilities.
	pub fn for_environment(supports_push_state: bool) -> Self {
		if supports_push_state {
			Self::PopState
		} else {
			Self::HashChange
		}
	}
}

/// Host address state and navigation notifications.
pub trait BrowserEnvironment {
	/// The full current address.
	fn href(&self) -> String;

	/// Whether `push_state`/`replace_state` are available.
	fn supports_push_state(&self) -> bool;

	/// Adds a history entry for `url` without reloading.
	fn push_state(&self, url: &str);

	/// Replaces the current history entry with `url` without reloading.
	fn replace_state(&self, url: &str);

	/// Assigns the fragment, adding a history entry.
	fn assign_hash(&self, path: &str);

	/// Replaces the current address, reloading if more than the fragment changed.
	fn replace_location(&self, url: &str);

	/// Traverses history by `delta` entries.
	fn go(&self, delta: i32);

	/// Calls `handler` on every `event` until the returned teardown runs.
	fn subscribe(&self, event: NavigationEvent, handler: Rc<dyn Fn()>) -> Teardown;
}

/// An address mutation performed through a [`MemoryEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMutation {
	/// `push_state(url)`.
	PushState(String),
	/// `replace_state(url)`.
	ReplaceState(String),
	/// `assign_hash(path)`.
	AssignHash(String),
	/// `replace_location(url)`.
	ReplaceLocation(String),
	/// `go(delta)`.
	Go(i32),
}

struct Subscriber {
	id: u64,
	event: NavigationEvent,
	handler: Rc<dyn Fn()>,
}

struct MemoryState {
	entries: Vec<String>,
	index: usize,
	push_state: bool,
	mutations: Vec<EnvMutation>,
	subscribers: Vec<Subscriber>,
	next_id: u64,
}

/// An in-memory address bar with a history stack.
///
/// Every mutation is logged. Programmatic `push_state`/`replace_state` never
/// emit events, as in browsers; traversal with [`go`](BrowserEnvironment::go)
/// and [`navigate_externally`](MemoryEnvironment::navigate_externally) emit
/// `popstate`, plus `hashchange` when the fragment changed. Events are
/// delivered synchronously. Clones share the same state.
#[derive(Clone)]
pub struct MemoryEnvironment {
	state: Rc<RefCell<MemoryState>>,
}

impl std::fmt::Debug for MemoryEnvironment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("MemoryEnvironment")
			.field("entries", &state.entries)
			.field("index", &state.index)
			.field("push_state", &state.push_state)
			.field("subscribers", &state.subscribers.len())
			.finish()
	}
}

impl MemoryEnvironment {
	/// Starts at `href` with push-state support.
	pub fn new(href: impl Into<String>) -> Self {
		Self {
			state: Rc::new(RefCell::new(MemoryState {
				entries: vec![href.into()],
				index: 0,
				push_state: true,
				mutations: Vec::new(),
				subscribers: Vec::new(),
				next_id: 0,
			})),
		}
	}

	/// Starts at `href` without push-state support.
	pub fn legacy(href: impl Into<String>) -> Self {
		let env = Self::new(href);
		env.state.borrow_mut().push_state = false;
		env
	}

	/// Mutations performed so far, oldest first.
	pub fn mutations(&self) -> Vec<EnvMutation> {
		self.state.borrow().mutations.clone()
	}

	/// Forgets logged mutations.
	pub fn clear_mutations(&self) {
		self.state.borrow_mut().mutations.clear();
	}

	/// Every history entry, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.state.borrow().entries.clone()
	}

	/// Position of the current entry.
	pub fn index(&self) -> usize {
		self.state.borrow().index
	}

	/// Number of live subscriptions.
	pub fn subscription_count(&self) -> usize {
		self.state.borrow().subscribers.len()
	}

	/// Delivers `event` to its subscribers.
	pub fn fire(&self, event: NavigationEvent) {
		let handlers: Vec<Rc<dyn Fn()>> = self
			.state
			.borrow()
			.subscribers
			.iter()
			.filter(|s| s.event == event)
			.map(|s| Rc::clone(&s.handler))
			.collect();
		for handler in handlers {
			handler();
		}
	}

	/// Simulates the user typing `url` into the address bar.
	///
	/// A fragment-only change adds an entry and emits events; anything else
	/// is a full page load, which only replaces the address.
	pub fn navigate_externally(&self, url: &str) {
		let (before, after) = {
			let mut state = self.state.borrow_mut();
			let before = state.entries[state.index].clone();
			let after = resolve(&before, url);
			if strip_fragment(&before) != strip_fragment(&after) {
				let index = state.index;
				state.entries[index] = after;
				return;
			}
			push_entry(&mut state, after.clone());
			(before, after)
		};
		self.fire(NavigationEvent::PopState);
		if fragment(&before) != fragment(&after) {
			self.fire(NavigationEvent::HashChange);
		}
	}

	fn href_now(&self) -> String {
		let state = self.state.borrow();
		state.entries[state.index].clone()
	}
}

impl BrowserEnvironment for MemoryEnvironment {
	fn href(&self) -> String {
		self.href_now()
	}

	fn supports_push_state(&self) -> bool {
		self.state.borrow().push_state
	}

	fn push_state(&self, url: &str) {
		let mut state = self.state.borrow_mut();
		let next = resolve(&state.entries[state.index], url);
		state.mutations.push(EnvMutation::PushState(url.to_string()));
		push_entry(&mut state, next);
	}

	fn replace_state(&self, url: &str) {
		let mut state = self.state.borrow_mut();
		let index = state.index;
		state.entries[index] = resolve(&state.entries[index], url);
		state.mutations.push(EnvMutation::ReplaceState(url.to_string()));
	}

	fn assign_hash(&self, path: &str) {
		let mut state = self.state.borrow_mut();
		let next = format!("{}#{}", strip_fragment(&state.entries[state.index]), path);
		state.mutations.push(EnvMutation::AssignHash(path.to_string()));
		if next != state.entries[state.index] {
			push_entry(&mut state, next);
		}
	}

	fn replace_location(&self, url: &str) {
		let mut state = self.state.borrow_mut();
		let index = state.index;
		state.entries[index] = resolve(&state.entries[index], url);
		state.mutations.push(EnvMutation::ReplaceLocation(url.to_string()));
	}

	fn go(&self, delta: i32) {
		let moved = {
			let mut state = self.state.borrow_mut();
			state.mutations.push(EnvMutation::Go(delta));
			let target = state.index as i64 + i64::from(delta);
			if delta == 0 || target < 0 || target >= state.entries.len() as i64 {
				None
			} else {
				let before = state.entries[state.index].clone();
				state.index = target as usize;
				Some((before, state.entries[state.index].clone()))
			}
		};
		if let Some((before, after)) = moved {
			self.fire(NavigationEvent::PopState);
			if fragment(&before) != fragment(&after) {
				self.fire(NavigationEvent::HashChange);
			}
		}
	}

	fn subscribe(&self, event: NavigationEvent, handler: Rc<dyn Fn()>) -> Teardown {
		let id = {
			let mut state = self.state.borrow_mut();
			state.next_id += 1;
			let id = state.next_id;
			state.subscribers.push(Subscriber { id, event, handler });
			id
		};
		let state = Rc::downgrade(&self.state);
		Box::new(move || {
			if let Some(state) = state.upgrade() {
				state.borrow_mut().subscribers.retain(|s| s.id != id);
			}
		})
	}
}

fn push_entry(state: &mut MemoryState, href: String) {
	let keep = state.index + 1;
	state.entries.truncate(keep);
	state.entries.push(href);
	state.index = keep;
}

/// Resolves `url` against `base` the way the address bar does.
fn resolve(base: &str, url: &str) -> String {
	match Url::parse(base).and_then(|base| base.join(url)) {
		Ok(resolved) => resolved.to_string(),
		Err(e) => {
			tracing::warn!(target: "reinhardt_history", "cannot resolve \"{}\" against \"{}\": {}", url, base, e);
			url.to_string()
		}
	}
}

fn strip_fragment(href: &str) -> &str {
	href.split_once('#').map_or(href, |(before, _)| before)
}

fn fragment(href: &str) -> Option<&str> {
	href.split_once('#').map(|(_, after)| after)
}

#[cfg(target_arch = "wasm32")]
pub use web::WindowEnvironment;

#[cfg(target_arch = "wasm32")]
mod web {
	use std::rc::Rc;

	use wasm_bindgen::JsCast;
	use wasm_bindgen::JsValue;
	use wasm_bindgen::closure::Closure;
	use web_sys::Event;

	use super::{BrowserEnvironment, NavigationEvent, Teardown};

	/// The browser window.
	#[derive(Debug, Clone)]
	pub struct WindowEnvironment {
		window: web_sys::Window,
	}

	impl WindowEnvironment {
		/// Wraps the global `window`, if there is one.
		pub fn new() -> Option<Self> {
			web_sys::window().map(|window| Self { window })
		}

		fn report(action: &str, result: Result<(), JsValue>) {
			if let Err(e) = result {
				tracing::warn!(target: "reinhardt_history", "{} failed: {:?}", action, e);
			}
		}
	}

	impl BrowserEnvironment for WindowEnvironment {
		fn href(&self) -> String {
			self.window.location().href().unwrap_or_default()
		}

		fn supports_push_state(&self) -> bool {
			self.window.history().is_ok()
		}

		fn push_state(&self, url: &str) {
			let result = self
				.window
				.history()
				.and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(url)));
			Self::report("history.pushState", result);
		}

		fn replace_state(&self, url: &str) {
			let result = self
				.window
				.history()
				.and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url)));
			Self::report("history.replaceState", result);
		}

		fn assign_hash(&self, path: &str) {
			Self::report("location.hash", self.window.location().set_hash(path));
		}

		fn replace_location(&self, url: &str) {
			Self::report("location.replace", self.window.location().replace(url));
		}

		fn go(&self, delta: i32) {
			let result = self
				.window
				.history()
				.and_then(|history| history.go_with_delta(delta));
			Self::report("history.go", result);
		}

		fn subscribe(&self, event: NavigationEvent, handler: Rc<dyn Fn()>) -> Teardown {
			let closure = Closure::wrap(Box::new(move |_event: Event| handler()) as Box<dyn FnMut(_)>);
			let name = event.as_str();
			if let Err(e) = self
				.window
				.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
			{
				tracing::warn!(target: "reinhardt_history", "addEventListener({}) failed: {:?}", name, e);
			}
			let window = self.window.clone();
			Box::new(move || {
				let _ = window.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
				drop(closure);
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_push_state_resolves_against_current() {
		let env = MemoryEnvironment::new("https://x/app/#/a");

		env.push_state("https://x/app/#/b");
		env.push_state("/other");

		assert_eq!(env.href(), "https://x/other");
		assert_eq!(env.entries().len(), 3);
		assert!(env.mutations().iter().all(|m| matches!(m, EnvMutation::PushState(_))));
	}

	#[rstest]
	fn test_assign_same_hash_adds_no_entry() {
		let env = MemoryEnvironment::legacy("https://x/#/a");

		env.assign_hash("/a");
		env.assign_hash("/b");

		assert_eq!(env.entries(), vec!["https://x/#/a", "https://x/#/b"]);
	}

	#[rstest]
	fn test_go_emits_events() {
		// Arrange
		let env = MemoryEnvironment::new("https://x/#/a");
		env.push_state("https://x/#/b");
		let pops = Rc::new(Cell::new(0));
		let hashes = Rc::new(Cell::new(0));
		let pop_counter = Rc::clone(&pops);
		let hash_counter = Rc::clone(&hashes);
		let _pop = env.subscribe(
			NavigationEvent::PopState,
			Rc::new(move || pop_counter.set(pop_counter.get() + 1)),
		);
		let _hash = env.subscribe(
			NavigationEvent::HashChange,
			Rc::new(move || hash_counter.set(hash_counter.get() + 1)),
		);

		// Act
		env.go(-1);
		env.go(-1);

		// Assert
		assert_eq!(env.href(), "https://x/#/a");
		assert_eq!((pops.get(), hashes.get()), (1, 1));
	}

	#[rstest]
	fn test_teardown_unsubscribes() {
		let env = MemoryEnvironment::new("https://x/");
		let teardown = env.subscribe(NavigationEvent::PopState, Rc::new(|| {}));
		assert_eq!(env.subscription_count(), 1);

		teardown();

		assert_eq!(env.subscription_count(), 0);
	}

	#[rstest]
	fn test_external_navigation_outside_fragment_is_a_page_load() {
		let env = MemoryEnvironment::new("https://x/#/a");
		let fired = Rc::new(Cell::new(false));
		let flag = Rc::clone(&fired);
		let _sub = env.subscribe(NavigationEvent::PopState, Rc::new(move || flag.set(true)));

		env.navigate_externally("/elsewhere");

		assert_eq!(env.href(), "https://x/elsewhere");
		assert!(!fired.get());
	}
}
