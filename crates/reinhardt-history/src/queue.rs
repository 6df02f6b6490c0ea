//! Sequential execution of asynchronous guard steps.
//!
//! [`run_queue`] walks an ordered list of optional steps. Each present step is
//! handed to a `step` callback together with an [`Advance`] continuation; the
//! queue only moves on once that continuation is called, which may happen
//! synchronously or at any later point. Empty slots advance on their own.
//!
//! Synchronous advances are driven by a loop rather than by recursion, so the
//! call stack does not grow with the queue length.

use std::cell::RefCell;
use std::rc::Rc;

/// Continuation handed to each step. Calling it moves the queue forward.
///
/// Consumed on use, so a step can advance at most once. Dropping it without
/// calling it stalls the queue for good.
pub struct Advance {
	resume: Box<dyn FnOnce()>,
}

impl Advance {
	/// Moves on to the next step.
	pub fn advance(self) {
		(self.resume)()
	}
}

impl std::fmt::Debug for Advance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Advance").finish_non_exhaustive()
	}
}

struct Runner<T> {
	queue: std::vec::IntoIter<Option<T>>,
	step: Option<Box<dyn FnMut(T, Advance)>>,
	done: Option<Box<dyn FnOnce()>>,
	// A drive loop is on the stack.
	driving: bool,
	// The current step has advanced and the loop may take the next one.
	advanced: bool,
}

/// Runs `queue` one step at a time, then calls `done` exactly once.
///
/// An empty queue calls `done` before returning. The runner has no error
/// channel and no cancellation: a step that wants to stop the queue simply
/// never advances it.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use reinhardt_history::run_queue;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = Rc::clone(&seen);
/// run_queue(
///     vec![Some(1), None, Some(2)],
///     move |value, advance| {
///         log.borrow_mut().push(value);
///         advance.advance();
///     },
///     || {},
/// );
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub fn run_queue<T, S, D>(queue: Vec<Option<T>>, step: S, done: D)
where
	T: 'static,
	S: FnMut(T, Advance) + 'static,
	D: FnOnce() + 'static,
{
	let runner = Rc::new(RefCell::new(Runner {
		queue: queue.into_iter(),
		step: Some(Box::new(step)),
		done: Some(Box::new(done)),
		driving: false,
		advanced: false,
	}));
	drive(&runner);
}

fn drive<T: 'static>(runner: &Rc<RefCell<Runner<T>>>) {
	{
		let mut state = runner.borrow_mut();
		state.advanced = true;
		if state.driving {
			// Advanced synchronously from inside a step; the loop below picks it up.
			return;
		}
		state.driving = true;
	}

	loop {
		let next = {
			let mut state = runner.borrow_mut();
			if !state.advanced {
				state.driving = false;
				return;
			}
			state.advanced = false;
			state.queue.next()
		};

		match next {
			None => {
				let done = {
					let mut state = runner.borrow_mut();
					state.step = None;
					state.done.take()
				};
				if let Some(done) = done {
					done();
				}
				return;
			}
			Some(None) => {
				runner.borrow_mut().advanced = true;
			}
			Some(Some(item)) => {
				let handle = Rc::clone(runner);
				let advance = Advance {
					resume: Box::new(move || drive(&handle)),
				};
				let mut step = runner.borrow_mut().step.take();
				if let Some(step) = step.as_mut() {
					step(item, advance);
				}
				let mut state = runner.borrow_mut();
				if state.step.is_none() && state.done.is_some() {
					state.step = step;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_runs_in_order_skipping_empty_slots() {
		// Arrange
		let log = Rc::new(RefCell::new(Vec::new()));
		let step_log = Rc::clone(&log);
		let done_log = Rc::clone(&log);

		// Act
		run_queue(
			vec![Some("g1"), None, Some("g2")],
			move |guard, advance| {
				step_log.borrow_mut().push(guard);
				advance.advance();
			},
			move || done_log.borrow_mut().push("done"),
		);

		// Assert
		assert_eq!(*log.borrow(), vec!["g1", "g2", "done"]);
	}

	#[rstest]
	fn test_empty_queue_completes_synchronously() {
		let done = Rc::new(Cell::new(0));
		let counter = Rc::clone(&done);

		run_queue(Vec::<Option<u8>>::new(), |_, _| {}, move || counter.set(counter.get() + 1));

		assert_eq!(done.get(), 1);
	}

	#[rstest]
	fn test_waits_for_deferred_advance() {
		// Arrange
		let log = Rc::new(RefCell::new(Vec::new()));
		let parked: Rc<RefCell<Option<Advance>>> = Rc::new(RefCell::new(None));
		let step_log = Rc::clone(&log);
		let step_parked = Rc::clone(&parked);
		let done_log = Rc::clone(&log);

		// Act
		run_queue(
			vec![Some(1), Some(2)],
			move |value, advance| {
				step_log.borrow_mut().push(value);
				if value == 1 {
					*step_parked.borrow_mut() = Some(advance);
				} else {
					advance.advance();
				}
			},
			move || done_log.borrow_mut().push(0),
		);

		// Assert
		assert_eq!(*log.borrow(), vec![1]);
		let advance = parked.borrow_mut().take().unwrap();
		advance.advance();
		assert_eq!(*log.borrow(), vec![1, 2, 0]);
	}

	#[rstest]
	fn test_unadvanced_step_stalls_queue() {
		let done = Rc::new(Cell::new(false));
		let flag = Rc::clone(&done);

		run_queue(vec![Some(()), Some(())], |_, _advance| {}, move || flag.set(true));

		assert!(!done.get());
	}

	#[rstest]
	fn test_long_queue_does_not_grow_stack() {
		let count = Rc::new(Cell::new(0usize));
		let counter = Rc::clone(&count);
		let done = Rc::new(Cell::new(false));
		let flag = Rc::clone(&done);

		run_queue(
			(0..200_000).map(|i| (i % 3 != 0).then_some(i)).collect(),
			move |_, advance| {
				counter.set(counter.get() + 1);
				advance.advance();
			},
			move || flag.set(true),
		);

		assert!(done.get());
		assert_eq!(count.get(), 133_333);
	}
}
