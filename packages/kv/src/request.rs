//! Pending results of key-value operations.

use std::cell::RefCell;
use std::rc::Rc;

use hostshim_core::{Event, EventTarget, Listener};

use crate::KvError;

/// Whether a request has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Pending,
    Done,
}

type SuccessCallback<T> = Box<dyn FnOnce(&T)>;
type ErrorCallback = Box<dyn FnOnce(&KvError)>;

struct RequestState<T> {
    ready_state: ReadyState,
    result: Option<T>,
    error: Option<KvError>,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
}

/// The handle returned by every store operation.
///
/// A request settles exactly once, when its deferred unit runs. Settling
/// calls the success or error callback first, then dispatches a `success`
/// or `error` event to the request's listeners. Callbacks and listeners
/// registered after settlement are never called. Clones share one request.
///
/// Listeners are dropped once the request settles, so a listener may hold a
/// clone of its own request without keeping it alive.
pub struct KvRequest<T> {
    state: Rc<RefCell<RequestState<T>>>,
    target: EventTarget,
}

impl<T> Clone for KvRequest<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            target: self.target.clone(),
        }
    }
}

impl<T: Clone + 'static> KvRequest<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RequestState {
                ready_state: ReadyState::Pending,
                result: None,
                error: None,
                on_success: None,
                on_error: None,
            })),
            target: EventTarget::new(),
        }
    }

    /// Set the success callback, replacing any previous one.
    pub fn on_success(&self, callback: impl FnOnce(&T) + 'static) {
        self.state.borrow_mut().on_success = Some(Box::new(callback));
    }

    /// Set the error callback, replacing any previous one.
    pub fn on_error(&self, callback: impl FnOnce(&KvError) + 'static) {
        self.state.borrow_mut().on_error = Some(Box::new(callback));
    }

    /// Register a listener. Ignored once the request has settled.
    pub fn add_event_listener(&self, event_type: impl Into<String>, listener: Listener) {
        if self.ready_state() == ReadyState::Done {
            return;
        }
        self.target.add_event_listener(event_type, listener);
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) -> bool {
        self.target.remove_event_listener(event_type, listener)
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    /// The result, once settled successfully.
    pub fn result(&self) -> Option<T> {
        self.state.borrow().result.clone()
    }

    /// The error, once settled with a failure.
    pub fn error(&self) -> Option<KvError> {
        self.state.borrow().error.clone()
    }

    /// The outcome, once settled.
    pub fn outcome(&self) -> Option<Result<T, KvError>> {
        let state = self.state.borrow();
        match (&state.result, &state.error) {
            (_, Some(error)) => Some(Err(error.clone())),
            (Some(result), None) => Some(Ok(result.clone())),
            (None, None) => None,
        }
    }

    pub(crate) fn succeed(&self, result: T) {
        let callback = {
            let mut state = self.state.borrow_mut();
            if state.ready_state == ReadyState::Done {
                return;
            }
            state.ready_state = ReadyState::Done;
            state.result = Some(result.clone());
            state.on_error = None;
            state.on_success.take()
        };
        if let Some(callback) = callback {
            callback(&result);
        }
        self.target.dispatch_event(&mut Event::new("success"));
        self.target.clear_listeners();
    }

    pub(crate) fn fail(&self, error: KvError) {
        tracing::debug!(error = %error, "key-value request failed");
        let callback = {
            let mut state = self.state.borrow_mut();
            if state.ready_state == ReadyState::Done {
                return;
            }
            state.ready_state = ReadyState::Done;
            state.error = Some(error.clone());
            state.on_success = None;
            state.on_error.take()
        };
        if let Some(callback) = callback {
            callback(&error);
        }
        self.target.dispatch_event(&mut Event::new("error"));
        self.target.clear_listeners();
    }

    pub(crate) fn settle(&self, outcome: Result<T, KvError>) {
        match outcome {
            Ok(result) => self.succeed(result),
            Err(error) => self.fail(error),
        }
    }
}

impl<T> std::fmt::Debug for KvRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvRequest")
            .field("ready_state", &self.state.borrow().ready_state)
            .finish()
    }
}
