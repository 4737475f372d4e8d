//! Observable value store with subscribe/notify.
//!
//! Process-wide settings (design system, tool mode) live in a [`Store`]
//! instead of ambient globals. Listeners run synchronously on every change,
//! in subscription order; setting an equal value is not a change.

use std::fmt;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(&T) + Send>;

/// A value plus the listeners interested in it.
pub struct Store<T> {
    value: T,
    revision: u64,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.value)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T> {
    /// Create a store holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            revision: 0,
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Number of changes so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a listener called after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.value);
        }
    }
}

impl<T: PartialEq> Store<T> {
    /// Replace the value. Returns true (and notifies) only if it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.notify();
        true
    }
}

impl<T: Clone + PartialEq> Store<T> {
    /// Update the value through a closure on a copy; notifies if it changed.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.value.clone();
        f(&mut next);
        self.set(next)
    }
}
