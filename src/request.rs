//! Deferred task requests
//!
//! A fixed-depth, interrupt-safe queue of start/restart requests. Any context
//! may push (main thread, another interrupt, or a task callback running inside
//! a dispatch pass); the scheduler drains the queue at the beginning of each
//! pass, so the registry walk never races a state change.

use core::cell::RefCell;

use heapless::Deque;

use crate::config::REQUEST_QUEUE_DEPTH;
use crate::error::{Error, Result};
use crate::sync::{self, Shared};
use crate::task::TaskHandle;

/// A state change to apply to a task before the next registry walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    Start(TaskHandle),
    Restart(TaskHandle),
}

impl Request {
    /// Task the request targets.
    pub fn task(&self) -> TaskHandle {
        match *self {
            Request::Start(task) | Request::Restart(task) => task,
        }
    }
}

/// Queue of pending [`Request`]s shared between contexts.
pub struct Requests {
    queue: Shared<Deque<Request, REQUEST_QUEUE_DEPTH>>,
}

impl Requests {
    pub const fn new() -> Self {
        Self {
            queue: critical_section::Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Queue a `start` for `task`.
    pub fn start(&self, task: TaskHandle) -> Result<()> {
        self.push(Request::Start(task))
    }

    /// Queue a `restart` for `task`.
    pub fn restart(&self, task: TaskHandle) -> Result<()> {
        self.push(Request::Restart(task))
    }

    pub fn push(&self, request: Request) -> Result<()> {
        sync::critical_section(|cs| {
            self.queue
                .borrow_ref_mut(cs)
                .push_back(request)
                .map_err(|_| Error::RequestQueueFull)
        })
    }

    /// Oldest pending request, if any.
    pub fn pop(&self) -> Option<Request> {
        sync::critical_section(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    pub fn len(&self) -> usize {
        sync::critical_section(|cs| self.queue.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending request.
    pub fn clear(&self) {
        sync::critical_section(|cs| self.queue.borrow_ref_mut(cs).clear());
    }
}

impl Default for Requests {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn handles() -> (TaskHandle, TaskHandle) {
        let mut registry: Registry<u8, 2> = Registry::new();
        let a = TaskHandle(registry.add(0).unwrap());
        let b = TaskHandle(registry.add(1).unwrap());
        (a, b)
    }

    #[test]
    fn test_fifo_order() {
        let requests = Requests::new();
        let (a, b) = handles();

        requests.start(a).unwrap();
        requests.restart(b).unwrap();
        assert_eq!(requests.len(), 2);

        assert_eq!(requests.pop(), Some(Request::Start(a)));
        assert_eq!(requests.pop(), Some(Request::Restart(b)));
        assert_eq!(requests.pop(), None);
        assert!(requests.is_empty());
    }

    #[test]
    fn test_overflow_is_reported() {
        let requests = Requests::new();
        let (a, _) = handles();

        for _ in 0..REQUEST_QUEUE_DEPTH {
            requests.start(a).unwrap();
        }
        assert_eq!(requests.start(a), Err(Error::RequestQueueFull));
        assert_eq!(requests.len(), REQUEST_QUEUE_DEPTH);

        requests.clear();
        assert!(requests.is_empty());
    }

    #[test]
    fn test_request_target() {
        let (a, b) = handles();
        assert_eq!(Request::Start(a).task(), a);
        assert_eq!(Request::Restart(b).task(), b);
    }
}
