//! Provider event listener infrastructure.
//!
//! Listeners live in an [`IndexMap`] keyed by [`ListenerId`] for O(1) removal
//! and stable insertion order, so events reach listeners in the order they
//! subscribed. A [`Subscription`] unregisters its listener on drop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use wallet_protocol::ProviderEvent;

/// Unique identifier for event listeners.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique listener ID.
pub fn next_listener_id() -> ListenerId {
	NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Callback invoked for every provider event.
pub type EventListener = Rc<dyn Fn(ProviderEvent)>;

type ListenerMap = Rc<RefCell<IndexMap<ListenerId, EventListener>>>;

/// Listener registry for provider implementations.
///
/// Providers embed one emitter and call [`emit`](Self::emit) whenever the
/// underlying wallet reports an event.
#[derive(Default, Clone)]
pub struct EventEmitter {
	listeners: ListenerMap,
}

impl EventEmitter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener`; it stays registered until the subscription drops.
	pub fn on(&self, listener: EventListener) -> Subscription {
		let id = next_listener_id();
		self.listeners.borrow_mut().insert(id, listener);

		let weak: Weak<RefCell<IndexMap<ListenerId, EventListener>>> = Rc::downgrade(&self.listeners);
		Subscription::new(id, move |id| {
			if let Some(map) = weak.upgrade() {
				map.borrow_mut().shift_remove(&id);
			}
		})
	}

	/// Delivers `event` to every listener in subscription order.
	///
	/// Listeners may subscribe or unsubscribe from inside the callback; the
	/// set notified is the one registered when `emit` was called.
	pub fn emit(&self, event: ProviderEvent) {
		let listeners: Vec<EventListener> = self.listeners.borrow().values().cloned().collect();
		for listener in listeners {
			listener(event.clone());
		}
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}
}

/// RAII handle that unregisters an event listener on drop.
///
/// Holds only what the dropper captured (typically a weak reference), so
/// dropping after the provider is gone is a no-op.
pub struct Subscription {
	id: ListenerId,
	dropper: Option<Box<dyn FnOnce(ListenerId)>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: ListenerId, dropper: impl FnOnce(ListenerId) + 'static) -> Self {
		Self {
			id,
			dropper: Some(Box::new(dropper)),
		}
	}

	/// A subscription that owns nothing to release.
	pub fn detached() -> Self {
		Self {
			id: next_listener_id(),
			dropper: None,
		}
	}

	/// Returns this subscription's listener ID.
	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			dropper(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			dropper(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	#[test]
	fn listeners_receive_events_until_dropped() {
		let emitter = EventEmitter::new();
		let seen = Rc::new(Cell::new(0));

		let counter = Rc::clone(&seen);
		let sub = emitter.on(Rc::new(move |_| counter.set(counter.get() + 1)));
		emitter.emit(ProviderEvent::ChainChanged(1));
		assert_eq!(seen.get(), 1);

		drop(sub);
		emitter.emit(ProviderEvent::ChainChanged(1));
		assert_eq!(seen.get(), 1);
		assert_eq!(emitter.listener_count(), 0);
	}

	#[test]
	fn delivery_follows_subscription_order() {
		let emitter = EventEmitter::new();
		let order = Rc::new(RefCell::new(Vec::new()));

		let first = Rc::clone(&order);
		let _a = emitter.on(Rc::new(move |_| first.borrow_mut().push("a")));
		let second = Rc::clone(&order);
		let _b = emitter.on(Rc::new(move |_| second.borrow_mut().push("b")));

		emitter.emit(ProviderEvent::AccountsChanged(vec![]));
		assert_eq!(*order.borrow(), vec!["a", "b"]);
	}

	#[test]
	fn dropping_after_emitter_is_gone_is_noop() {
		let emitter = EventEmitter::new();
		let sub = emitter.on(Rc::new(|_| {}));
		drop(emitter);
		sub.unsubscribe();
	}
}
