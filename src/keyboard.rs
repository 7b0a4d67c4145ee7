//! Window-wide key listeners.
//!
//! Components subscribe while mounted and get a [`KeyListener`] guard back;
//! dropping the guard removes exactly that listener. The hub is single-threaded
//! and lives on the event-loop thread.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;
use winit::keyboard::{Key, NamedKey};

use crate::events::NavKey;

type Callback = Rc<RefCell<dyn FnMut(NavKey)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Callback)>,
}

#[derive(Clone, Default)]
pub struct KeyboardHub {
    inner: Rc<RefCell<Registry>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl FnMut(NavKey) + 'static) -> KeyListener {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let callback: Callback = Rc::new(RefCell::new(callback));
        registry.listeners.push((id, callback));
        trace!(id, live = registry.listeners.len(), "key listener added");
        KeyListener {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver `key` to every live listener in subscription order.
    ///
    /// Listeners may subscribe or drop guards from inside a callback; a listener
    /// removed mid-dispatch is not called. Returns how many listeners ran.
    pub fn dispatch(&self, key: NavKey) -> usize {
        let snapshot: Vec<(u64, Callback)> = self.inner.borrow().listeners.clone();
        let mut called = 0;
        for (id, callback) in snapshot {
            let still_live = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(live, _)| *live == id);
            if !still_live {
                continue;
            }
            let mut callback = callback.borrow_mut();
            (&mut *callback)(key);
            called += 1;
        }
        called
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Subscription guard returned by [`KeyboardHub::subscribe`].
#[must_use = "dropping the guard unsubscribes the listener"]
pub struct KeyListener {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.borrow_mut();
            registry.listeners.retain(|(id, _)| *id != self.id);
            trace!(id = self.id, live = registry.listeners.len(), "key listener removed");
        }
    }
}

impl From<&Key> for NavKey {
    fn from(key: &Key) -> Self {
        match key {
            Key::Named(NamedKey::ArrowLeft) => Self::ArrowLeft,
            Key::Named(NamedKey::ArrowRight) => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dropping_guard_unsubscribes() {
        let hub = KeyboardHub::new();
        let hits = Rc::new(Cell::new(0));
        let guard = hub.subscribe({
            let hits = hits.clone();
            move |_| hits.set(hits.get() + 1)
        });
        assert_eq!(hub.listener_count(), 1);
        assert_eq!(hub.dispatch(NavKey::ArrowRight), 1);
        drop(guard);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.dispatch(NavKey::ArrowRight), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn guards_only_remove_their_own_listener() {
        let hub = KeyboardHub::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = hub.subscribe({
            let order = order.clone();
            move |_| order.borrow_mut().push("first")
        });
        let _second = hub.subscribe({
            let order = order.clone();
            move |_| order.borrow_mut().push("second")
        });
        hub.dispatch(NavKey::Other);
        drop(first);
        hub.dispatch(NavKey::Other);
        assert_eq!(*order.borrow(), vec!["first", "second", "second"]);
    }

    #[test]
    fn guard_outliving_hub_is_harmless() {
        let hub = KeyboardHub::new();
        let guard = hub.subscribe(|_| {});
        drop(hub);
        drop(guard);
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let hub = KeyboardHub::new();
        let victim: Rc<RefCell<Option<KeyListener>>> = Rc::new(RefCell::new(None));
        let victim_hits = Rc::new(Cell::new(0));
        let _killer = hub.subscribe({
            let victim = victim.clone();
            move |_| {
                victim.borrow_mut().take();
            }
        });
        *victim.borrow_mut() = Some(hub.subscribe({
            let hits = victim_hits.clone();
            move |_| hits.set(hits.get() + 1)
        }));
        assert_eq!(hub.dispatch(NavKey::ArrowLeft), 1);
        assert_eq!(victim_hits.get(), 0);
        assert_eq!(hub.listener_count(), 1);
    }

    #[test]
    fn maps_logical_arrow_keys() {
        assert_eq!(NavKey::from(&Key::Named(NamedKey::ArrowLeft)), NavKey::ArrowLeft);
        assert_eq!(NavKey::from(&Key::Named(NamedKey::ArrowRight)), NavKey::ArrowRight);
        assert_eq!(NavKey::from(&Key::Named(NamedKey::ArrowUp)), NavKey::Other);
        assert_eq!(NavKey::from(&Key::Character("a".into())), NavKey::Other);
    }
}
