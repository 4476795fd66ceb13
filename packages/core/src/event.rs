//! Events, listener registries and abort signals.
//!
//! Listeners are reference-counted closures. Identity (for removal) is the
//! allocation behind the `Rc`, so the same `Listener` value must be passed
//! to `remove_event_listener` that was passed to `add_event_listener`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::{ShimError, Value};

/// Error a listener may return. It is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error>;

/// A registered event callback.
pub type Listener = Rc<dyn Fn(&mut Event) -> Result<(), ListenerError>>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&mut Event) -> Result<(), ListenerError> + 'static,
{
    Rc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// An event being dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    detail: Option<Value>,
}

impl Event {
    /// A non-cancelable event.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            cancelable: false,
            default_prevented: false,
            detail: None,
        }
    }

    /// A cancelable event.
    pub fn cancelable(event_type: impl Into<String>) -> Self {
        Self {
            cancelable: true,
            ..Self::new(event_type)
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Attach a payload, as a custom event would.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }

    /// Mark the default action as prevented. No effect unless cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// Invoke listeners in order, logging and skipping failures.
///
/// Returns `true` if the default action was not prevented.
fn invoke(listeners: &[Listener], event: &mut Event) -> bool {
    for (index, listener) in listeners.iter().enumerate() {
        if let Err(e) = listener(event) {
            tracing::warn!(
                event_type = %event.event_type,
                listener = index,
                error = %e,
                "event listener failed"
            );
        }
    }
    !event.default_prevented
}

/// Event type to ordered listener list.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    listeners: BTreeMap<String, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for an event type.
    pub fn add_event_listener(&mut self, event_type: impl Into<String>, listener: Listener) {
        self.listeners
            .entry(event_type.into())
            .or_default()
            .push(listener);
    }

    /// Remove the first registration of `listener` for `event_type`.
    ///
    /// Returns whether a registration was removed.
    pub fn remove_event_listener(&mut self, event_type: &str, listener: &Listener) -> bool {
        let Some(list) = self.listeners.get_mut(event_type) else {
            return false;
        };
        match list.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of listeners registered for an event type.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.get(event_type).map_or(0, Vec::len)
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Copy of the listeners currently registered for an event type.
    pub fn snapshot(&self, event_type: &str) -> Vec<Listener> {
        self.listeners.get(event_type).cloned().unwrap_or_default()
    }

    /// Dispatch an event to the listeners of its type.
    ///
    /// Listeners run in registration order. A failing listener is logged and
    /// the remaining listeners still run. Returns `true` unless a listener
    /// prevented the default action.
    pub fn dispatch(&self, event: &mut Event) -> bool {
        invoke(&self.snapshot(&event.event_type), event)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

/// A shared listener registry.
///
/// Clones refer to the same registry. The registry is not borrowed while
/// listeners run, so a listener may add or remove listeners (including
/// itself); such changes apply from the next dispatch on.
#[derive(Clone, Default, Debug)]
pub struct EventTarget {
    registry: Rc<RefCell<ListenerRegistry>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(&self, event_type: impl Into<String>, listener: Listener) {
        self.registry
            .borrow_mut()
            .add_event_listener(event_type, listener);
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) -> bool {
        self.registry
            .borrow_mut()
            .remove_event_listener(event_type, listener)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.registry.borrow().listener_count(event_type)
    }

    pub fn clear_listeners(&self) {
        self.registry.borrow_mut().clear();
    }

    /// See [`ListenerRegistry::dispatch`].
    pub fn dispatch_event(&self, event: &mut Event) -> bool {
        let listeners = self.registry.borrow().snapshot(&event.event_type);
        invoke(&listeners, event)
    }
}

#[derive(Default)]
struct AbortState {
    aborted: Cell<bool>,
    reason: RefCell<Option<String>>,
    target: EventTarget,
}

/// Read side of an abort: a flag plus `abort` notifications.
///
/// Aborting never interrupts work that was already scheduled; it only flips
/// the flag and notifies listeners.
#[derive(Clone, Default)]
pub struct AbortSignal {
    state: Rc<AbortState>,
}

impl AbortSignal {
    pub fn aborted(&self) -> bool {
        self.state.aborted.get()
    }

    pub fn reason(&self) -> Option<String> {
        self.state.reason.borrow().clone()
    }

    /// Listen for the `abort` event.
    pub fn add_event_listener(&self, event_type: impl Into<String>, listener: Listener) {
        self.state.target.add_event_listener(event_type, listener);
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) -> bool {
        self.state.target.remove_event_listener(event_type, listener)
    }

    /// Fail with a state error once aborted.
    pub fn throw_if_aborted(&self) -> Result<(), ShimError> {
        if self.aborted() {
            let reason = self.reason().unwrap_or_else(|| "signal is aborted".to_string());
            return Err(ShimError::state(reason));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.aborted())
            .finish()
    }
}

/// Write side of an abort.
#[derive(Clone, Default, Debug)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Set the abort flag and notify listeners once.
    ///
    /// Later calls do nothing.
    pub fn abort(&self, reason: Option<String>) {
        let state = &self.signal.state;
        if state.aborted.replace(true) {
            return;
        }
        *state.reason.borrow_mut() = reason;
        state.target.dispatch_event(&mut Event::new("abort"));
    }
}
