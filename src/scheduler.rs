//! # Scheduler
//!
//! Owns the task registry and runs the dispatch pass bound to the periodic
//! interrupt.
//!
//! ## Dispatch Pass
//!
//! At each tick:
//! 1. **Drain requests**: apply queued `start`/`restart` requests, if a
//!    [`Requests`] queue is attached
//! 2. **Walk**: open a cursor at the head of the registry and call
//!    [`Task::process`] on every task, in registration order
//! 3. **Fire**: a task whose countdown elapses runs its callback right there,
//!    inside the interrupt
//!
//! A follow-up task sees its dependency's `Done` transition in the same pass
//! only if the dependency was registered first; otherwise one pass later.
//! [`Scheduler::define_previous`] warns about that ordering, it does not
//! reorder.
//!
//! ## Mutation Discipline
//!
//! Registration and every state change (`create_task`, `define_previous`,
//! `start`, `restart`) take a [`CriticalSection`] token, so the dispatcher
//! never observes a torn link. Code that cannot hold the scheduler (task
//! callbacks, other interrupts) goes through [`Requests`] instead.

use crate::config::{MAX_TASKS, MAX_TICK_PERIOD_MS, MIN_TICK_PERIOD_MS};
use crate::error::{Error, Result, TimerError};
use crate::log::{log_debug, log_error, log_info, log_warn};
use crate::registry::Registry;
use crate::request::{Request, Requests};
use crate::sync::CriticalSection;
use crate::task::{Callback, Task, TaskHandle, TaskKind, TaskState};
use crate::timer::{TickHandler, TickSource};

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The dispatcher state: the task registry plus tick bookkeeping.
///
/// Exactly one scheduler is bound to the tick interrupt; `kernel` holds that
/// instance. Standalone instances are used by host tests and simulations.
pub struct Scheduler<'a, const N: usize = MAX_TASKS> {
    /// Registered tasks, in dispatch order.
    tasks: Registry<Task<'a>, N>,

    /// Deferred requests drained at the start of every pass.
    requests: Option<&'a Requests>,

    /// Number of completed dispatch passes.
    tick_count: u64,

    /// Period the tick source was last attached with.
    tick_period_ms: Option<u32>,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    /// Create a scheduler with an empty registry and no request queue.
    pub const fn new() -> Self {
        Self {
            tasks: Registry::new(),
            requests: None,
            tick_count: 0,
            tick_period_ms: None,
        }
    }

    /// Create a scheduler that drains `requests` before every pass.
    pub const fn with_requests(requests: &'a Requests) -> Self {
        Self {
            tasks: Registry::new(),
            requests: Some(requests),
            tick_count: 0,
            tick_period_ms: None,
        }
    }

    /// Construct a task and append it to the registry.
    ///
    /// # Returns
    /// - `Ok(handle)`: the task is registered and will be processed from the
    ///   next pass on
    /// - `Err(Error::ZeroPeriod)`: `period` is 0
    /// - `Err(Error::RegistryFull)`: no free node; nothing was registered
    pub fn create_task(
        &mut self,
        _cs: CriticalSection<'_>,
        kind: TaskKind,
        period: u32,
        callback: &'a Callback<'a>,
    ) -> Result<TaskHandle> {
        if period == 0 {
            return Err(Error::ZeroPeriod);
        }

        match self.tasks.add(Task::new(kind, period, callback)) {
            Ok(node) => {
                log_debug!("task {} registered, period {} ticks", node.index(), period);
                Ok(TaskHandle(node))
            }
            Err(_) => {
                log_warn!("task registry full ({} tasks)", N);
                Err(Error::RegistryFull)
            }
        }
    }

    /// Gate `task` on `dependency` reaching `Done`.
    ///
    /// Rejects handles that do not resolve and any link that would let a task
    /// wait on itself. A dependency registered after its dependent is accepted
    /// but logged, since it is only observed one pass late.
    pub fn define_previous(
        &mut self,
        _cs: CriticalSection<'_>,
        task: TaskHandle,
        dependency: TaskHandle,
    ) -> Result<()> {
        if !self.tasks.contains(task.0) || !self.tasks.contains(dependency.0) {
            return Err(Error::UnknownTask);
        }
        if self.depends_on(dependency, task) {
            log_warn!(
                "task {} -> {} rejected: dependency cycle",
                task.0.index(),
                dependency.0.index()
            );
            return Err(Error::DependencyCycle);
        }
        if self.processes_before(task, dependency) == Some(true) {
            log_warn!(
                "task {} is processed before its dependency {}",
                task.0.index(),
                dependency.0.index()
            );
        }

        let entry = self.tasks.get_node_mut(task.0).ok_or(Error::UnknownTask)?;
        entry.define_previous(dependency);
        Ok(())
    }

    /// Arm a `Waiting` task. No-op for `Running`/`Done` tasks.
    pub fn start(&mut self, _cs: CriticalSection<'_>, task: TaskHandle) -> Result<()> {
        self.apply(Request::Start(task))
    }

    /// Re-arm a `Waiting` or `Running` task with a full countdown.
    pub fn restart(&mut self, _cs: CriticalSection<'_>, task: TaskHandle) -> Result<()> {
        self.apply(Request::Restart(task))
    }

    /// True if `first` is visited before `second` in a dispatch pass.
    /// `None` if either handle does not resolve.
    pub fn processes_before(&self, first: TaskHandle, second: TaskHandle) -> Option<bool> {
        let a = self.tasks.position(first.0)?;
        let b = self.tasks.position(second.0)?;
        Some(a < b)
    }

    pub fn task(&self, task: TaskHandle) -> Option<&Task<'a>> {
        self.tasks.get_node(task.0)
    }

    pub fn state(&self, task: TaskHandle) -> Option<TaskState> {
        self.task(task).map(Task::state)
    }

    /// Read-only view of the registry.
    pub fn registry(&self) -> &Registry<Task<'a>, N> {
        &self.tasks
    }

    pub fn requests(&self) -> Option<&'a Requests> {
        self.requests
    }

    /// Number of dispatch passes run so far.
    pub fn ticks(&self) -> u64 {
        self.tick_count
    }

    /// Period the tick source is attached with, if any.
    pub fn tick_period_ms(&self) -> Option<u32> {
        self.tick_period_ms
    }

    /// Configure `source` to call `handler` every `period_ms` milliseconds.
    ///
    /// An already attached source is detached first, so the period can be
    /// changed (or a failed attach retried with another period). Failure is
    /// reported, never retried; until a later call succeeds no task fires.
    pub fn set_tick_period<S: TickSource>(
        &mut self,
        source: &mut S,
        period_ms: u32,
        handler: TickHandler,
    ) -> Result<()> {
        if !(MIN_TICK_PERIOD_MS..=MAX_TICK_PERIOD_MS).contains(&period_ms) {
            log_error!("tick period {} ms out of range", period_ms);
            return Err(TimerError::PeriodOutOfRange.into());
        }

        if source.is_attached() {
            source.detach();
        }

        match source.attach(period_ms, handler) {
            Ok(()) => {
                self.tick_period_ms = Some(period_ms);
                log_info!("task timer set: {} ms", period_ms);
                Ok(())
            }
            Err(e) => {
                self.tick_period_ms = None;
                log_error!("setting task timer failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Detach `source` and forget the configured period. Tasks keep their
    /// state and resume on the next successful `set_tick_period`.
    pub fn stop<S: TickSource>(&mut self, source: &mut S) {
        source.detach();
        self.tick_period_ms = None;
        log_info!("task timer stopped");
    }

    /// One dispatch pass. Bound to the periodic interrupt.
    ///
    /// Does not block and does not allocate. Tasks appended ahead of the
    /// cursor during the pass are visited in the same pass.
    ///
    /// # Returns
    /// Number of callbacks that ran.
    pub fn dispatch(&mut self) -> usize {
        self.drain_requests();
        self.tick_count = self.tick_count.wrapping_add(1);

        let mut fired = 0;
        let mut cursor = self.tasks.cursor();
        while let Some(node) = self.tasks.advance_id(&mut cursor) {
            let dependency_state = self
                .tasks
                .get_node(node)
                .and_then(Task::dependency)
                .and_then(|dependency| self.tasks.get_node(dependency.0))
                .map(Task::state);

            if let Some(task) = self.tasks.get_node_mut(node) {
                if task.process(dependency_state) {
                    fired += 1;
                }
            }
        }
        fired
    }

    fn drain_requests(&mut self) {
        let Some(requests) = self.requests else {
            return;
        };
        while let Some(request) = requests.pop() {
            if self.apply(request).is_err() {
                log_warn!("dropped request for unknown task {}", request.task().0.index());
            }
        }
    }

    fn apply(&mut self, request: Request) -> Result<()> {
        let task = self
            .tasks
            .get_node_mut(request.task().0)
            .ok_or(Error::UnknownTask)?;
        match request {
            Request::Start(_) => task.start(),
            Request::Restart(_) => task.restart(),
        }
        Ok(())
    }

    /// True if following dependency links from `from` reaches `target`.
    fn depends_on(&self, from: TaskHandle, target: TaskHandle) -> bool {
        let mut current = Some(from);
        // Links are acyclic by construction, so a chain visits at most N tasks.
        for _ in 0..=N {
            match current {
                None => return false,
                Some(handle) if handle == target => return true,
                Some(handle) => {
                    current = self.tasks.get_node(handle.0).and_then(Task::dependency);
                }
            }
        }
        true
    }
}

impl<const N: usize> Default for Scheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
