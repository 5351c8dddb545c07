use crate::Scheduler;
use crate::clock::{Clock, SystemClock};
use crate::queue::{Task, TaskQueue};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Timer<C> {
    due: f64,
    seq: u64,
    task: Task<C>,
}

/// Cooperative scheduler for a single inspected page.
///
/// Nothing runs until [`LocalScheduler::tick`] is called with the context.
/// A tick drains microtasks, then runs every timer that was due when the tick
/// started (draining microtasks after each one). Timers scheduled during a
/// tick wait for the next tick, so a zero-delay retry loop cannot spin.
pub struct LocalScheduler<C> {
    clock: Rc<dyn Clock>,
    microtasks: TaskQueue<C>,
    timers: RefCell<Vec<Timer<C>>>,
    next_seq: Cell<u64>,
}

impl<C> LocalScheduler<C> {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            microtasks: TaskQueue::new(),
            timers: RefCell::new(Vec::new()),
            next_seq: Cell::new(0),
        }
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.timers.borrow().is_empty()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Runs one scheduling round. Returns true while work is still pending.
    pub fn tick(&self, ctx: &mut C) -> bool {
        self.microtasks.drain(ctx);

        let due = self.take_due(self.clock.now());
        if !due.is_empty() {
            tracing::trace!("Running {} due timer(s)", due.len());
        }
        for timer in due {
            (timer.task)(ctx);
            self.microtasks.drain(ctx);
        }

        !self.is_idle()
    }

    fn take_due(&self, now: f64) -> Vec<Timer<C>> {
        let mut timers = self.timers.borrow_mut();
        let (mut due, pending): (Vec<_>, Vec<_>) =
            timers.drain(..).partition(|timer| timer.due <= now);
        *timers = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due
    }
}

impl<C> Default for LocalScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> for LocalScheduler<C> {
    fn schedule_microtask(&self, task: Task<C>) {
        self.microtasks.push(task);
    }

    fn schedule_timeout(&self, delay_ms: f64, task: Task<C>) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            due: self.clock.now() + delay_ms.max(0.0),
            seq,
            task,
        });
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }
}
