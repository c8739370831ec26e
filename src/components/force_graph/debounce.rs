use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::set_timeout;

/// Coalesces bursts of triggers: only the last one scheduled within the delay
/// runs. Each trigger bumps a generation counter and pending callbacks check
/// they are still current before firing.
#[derive(Clone, Debug)]
pub struct Debouncer {
	generation: Rc<Cell<u64>>,
	delay: Duration,
}

impl Debouncer {
	pub fn new(delay: Duration) -> Self {
		Self {
			generation: Rc::new(Cell::new(0)),
			delay,
		}
	}

	fn trigger(&self) -> u64 {
		let next = self.generation.get().wrapping_add(1);
		self.generation.set(next);
		next
	}

	fn is_current(&self, token: u64) -> bool {
		self.generation.get() == token
	}

	/// Run `f` after the delay unless another call supersedes it first.
	pub fn schedule(&self, f: impl FnOnce() + 'static) {
		let token = self.trigger();
		let this = self.clone();
		set_timeout(
			move || {
				if this.is_current(token) {
					f();
				}
			},
			self.delay,
		);
	}

	/// Drop whatever is pending.
	pub fn cancel(&self) {
		self.trigger();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_the_latest_trigger_is_current() {
		let debouncer = Debouncer::new(Duration::from_millis(500));
		let first = debouncer.trigger();
		let second = debouncer.trigger();
		assert!(!debouncer.is_current(first));
		assert!(debouncer.is_current(second));
	}

	#[test]
	fn cancel_invalidates_pending_work() {
		let debouncer = Debouncer::new(Duration::from_millis(500));
		let pending = debouncer.trigger();
		debouncer.clone().cancel();
		assert!(!debouncer.is_current(pending));
	}
}
