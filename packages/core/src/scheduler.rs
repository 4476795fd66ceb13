//! Deferred execution and timers.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// A FIFO queue of deferred tasks.
///
/// Tasks never run inside the call that enqueued them. The host drives the
/// queue with [`run_next`](Self::run_next) or
/// [`run_until_idle`](Self::run_until_idle). Clones share one queue.
#[derive(Clone, Default)]
pub struct DeferredQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task behind everything already queued.
    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run the oldest task, if any. Returns whether a task ran.
    pub fn run_next(&self) -> bool {
        // Release the borrow before running; tasks may enqueue more work.
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks enqueued along
    /// the way. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(tasks = ran, "deferred queue drained");
        }
        ran
    }
}

impl std::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Handle returned by [`Timers`]. Distinct per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Timer facade.
///
/// This sandbox has no clock-driven event loop, so delays are not honored:
/// a timeout runs its callback synchronously inside `set_timeout`, and an
/// interval runs its callback exactly once. Clearing is accepted and does
/// nothing. Microtasks are deferred onto the shared [`DeferredQueue`].
#[derive(Clone, Debug)]
pub struct Timers {
    queue: DeferredQueue,
    next_id: Rc<Cell<u64>>,
}

impl Timers {
    pub fn new(queue: DeferredQueue) -> Self {
        Self {
            queue,
            next_id: Rc::new(Cell::new(1)),
        }
    }

    fn allocate(&self) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        TimerId(id)
    }

    fn fire<E: std::fmt::Display>(&self, id: TimerId, callback: impl FnOnce() -> Result<(), E>) {
        if let Err(e) = callback() {
            tracing::error!(timer = id.0, error = %e, "timer callback failed");
        }
    }

    /// Run `callback` now; `delay_ms` is ignored.
    pub fn set_timeout<E: std::fmt::Display>(
        &self,
        callback: impl FnOnce() -> Result<(), E>,
        delay_ms: u64,
    ) -> TimerId {
        let id = self.allocate();
        tracing::trace!(timer = id.0, delay_ms, "timeout fired immediately");
        self.fire(id, callback);
        id
    }

    /// Run `callback` once, now; `interval_ms` is ignored.
    pub fn set_interval<E: std::fmt::Display>(
        &self,
        callback: impl FnOnce() -> Result<(), E>,
        interval_ms: u64,
    ) -> TimerId {
        let id = self.allocate();
        tracing::trace!(timer = id.0, interval_ms, "interval fired once");
        self.fire(id, callback);
        id
    }

    pub fn clear_timeout(&self, _id: TimerId) {}

    pub fn clear_interval(&self, _id: TimerId) {}

    /// Defer `callback` to the shared queue.
    pub fn queue_microtask(&self, callback: impl FnOnce() + 'static) {
        self.queue.enqueue(callback);
    }
}
