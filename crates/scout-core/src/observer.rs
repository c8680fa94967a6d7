//! Typed observer lists.
//!
//! Replaces a process-wide event bus: each publisher owns an `Observers<T>` and
//! hands out `Subscription` handles. Notification is synchronous and has no
//! backpressure or replay; a subscriber only sees values published after it
//! subscribed.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: 'static> Detach for Mutex<Registry<T>> {
    fn detach(&self, id: u64) {
        let mut registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        registry.callbacks.retain(|(callback_id, _)| *callback_id != id);
    }
}

/// A list of callbacks notified with values of type `T`.
pub struct Observers<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a callback; it stays registered until `Subscription::unsubscribe`.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        drop(registry);

        let weak: Weak<dyn Detach> = Arc::downgrade(&self.registry) as Weak<dyn Detach>;
        Subscription { id, registry: weak }
    }

    /// Push `value` to every live subscriber, in subscription order.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    /// Number of live subscribers
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Observers").finish_non_exhaustive()
    }
}

/// Handle returned by `Observers::subscribe`.
///
/// Dropping the handle does not unsubscribe; call `unsubscribe` explicitly.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove the callback. A no-op when the publisher is already gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
