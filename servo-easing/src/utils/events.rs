//! Defines the servo-easing event manager system.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Callback = Arc<Mutex<dyn FnMut(Arc<dyn Any + Send + Sync>) + Send>>;
type SyncedCallbackMap = Mutex<HashMap<String, Vec<CallbackWrapper>>>;
pub type EventHandler = usize;

/// Dispatches named events to registered callbacks.
///
/// Callbacks run synchronously, on the thread emitting the event: for motion events this is the
/// thread ticking the scheduler (possibly the background tick driver). Keep them short.
#[derive(Clone, Default)]
pub struct EventManager {
    callbacks: Arc<SyncedCallbackMap>,
    next_id: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct CallbackWrapper {
    id: EventHandler,
    callback: Callback,
}

impl EventManager {
    /// Registers a callback for a specific event name.
    ///
    /// # Parameters
    /// * `event`: the event name (any type that matches an `Into<String>`)
    /// * `callback`: a callback receiving the event payload. The payload type `T` must match the
    ///   emitted payload type exactly, otherwise the callback is skipped.
    ///
    /// # Return
    /// Returns an EventHandler that can be used by the `unregister()` method.
    pub fn on<S, F, T>(&self, event: S, mut callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) + Send + 'static,
    {
        let event_name = event.into();
        let callback_event = event_name.clone();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let boxed_callback: Callback = Arc::new(Mutex::new(
            move |arg: Arc<dyn Any + Send + Sync>| match arg.downcast::<T>() {
                Ok(arg) => (callback)((*arg).clone()),
                Err(_) => log::warn!(
                    "The callback for event '{}' was skipped: parameter type does not match",
                    callback_event
                ),
            },
        ));

        self.callbacks
            .lock()
            .entry(event_name)
            .or_default()
            .push(CallbackWrapper {
                id,
                callback: boxed_callback,
            });

        id
    }

    /// Invokes every callback registered for the event whose payload type matches.
    ///
    /// The registry is not locked while callbacks run: a callback may register new handlers.
    pub fn emit<S, T>(&self, event: S, payload: T)
    where
        S: Into<String>,
        T: 'static + Send + Sync,
    {
        let callbacks = match self.callbacks.lock().get(&event.into()) {
            None => return,
            Some(callbacks) => callbacks.clone(),
        };
        let payload: Arc<dyn Any + Send + Sync> = Arc::new(payload);
        for wrapper in callbacks {
            let mut callback = wrapper.callback.lock();
            (&mut *callback)(payload.clone());
        }
    }

    /// Unregisters a given handler if found.
    pub fn unregister(&self, handler: EventHandler) {
        self.callbacks
            .lock()
            .values_mut()
            .for_each(|callbacks| callbacks.retain(|wrapper| wrapper.id != handler));
    }

    /// Returns the number of callbacks registered for an event.
    pub fn count<S: Into<String>>(&self, event: S) -> usize {
        self.callbacks
            .lock()
            .get(&event.into())
            .map_or(0, |callbacks| callbacks.len())
    }
}

impl Debug for EventManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventManager [events={}]", self.callbacks.lock().len())
    }
}
