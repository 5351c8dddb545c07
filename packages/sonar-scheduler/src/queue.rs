use std::cell::RefCell;
use std::collections::VecDeque;

pub type Task<C> = Box<dyn FnOnce(&mut C)>;

/// FIFO of tasks for one context. Pushing through `&self` lets a running
/// task enqueue follow-up work.
pub struct TaskQueue<C> {
    tasks: RefCell<VecDeque<Task<C>>>,
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        Self {
            tasks: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, task: Task<C>) {
        self.tasks.borrow_mut().push_back(task);
    }

    pub fn pop(&self) -> Option<Task<C>> {
        self.tasks.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs tasks until the queue is empty, including tasks pushed while draining.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let mut ran = 0;
        // Pop one at a time so a running task can push more work.
        while let Some(task) = self.pop() {
            task(ctx);
            ran += 1;
        }
        ran
    }
}
