pub mod clock;
pub mod queue;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::{Task, TaskQueue};
pub use scheduler::LocalScheduler;

/// Scheduling surface shared by the store and the listener.
///
/// Tasks receive the context they were scheduled for (`&mut C`) when they run,
/// so nothing needs to be captured behind shared ownership.
pub trait Scheduler<C> {
    /// Run `task` at the end of the current tick, before any timer.
    fn schedule_microtask(&self, task: Task<C>);

    /// Run `task` on the first tick at or after `now() + delay_ms`.
    fn schedule_timeout(&self, delay_ms: f64, task: Task<C>);

    /// Current time in milliseconds (monotonic).
    fn now(&self) -> f64;
}
