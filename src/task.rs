//! # Task
//!
//! Defines the unit of work dispatched by the tick interrupt. Each task owns a
//! countdown that is decremented once per tick; when it elapses the callback
//! runs synchronously inside the dispatch pass.
//!
//! All timing is expressed in ticks, so reconfiguring the interrupt period
//! changes wall-clock behavior without touching task definitions.

use crate::registry::NodeId;

// ---------------------------------------------------------------------------
// Task kind and state machine
// ---------------------------------------------------------------------------

/// What happens after a task's countdown elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    /// Fires once, then is `Done`.
    OneShot,
    /// Fires every `period` ticks, forever.
    Cyclic,
    /// Like `OneShot`, but only counts down once its dependency is `Done`.
    FollowUpOneShot,
    /// Like `Cyclic`, but only counts down once its dependency is `Done`.
    FollowUpCyclic,
    /// Waits for `start`, fires once `period` ticks later, then waits again.
    TriggerOneShot,
}

impl TaskKind {
    /// True for kinds that may be gated on another task.
    #[inline]
    pub const fn is_follow_up(self) -> bool {
        matches!(self, TaskKind::FollowUpOneShot | TaskKind::FollowUpCyclic)
    }

    /// True for kinds that re-arm themselves after firing.
    #[inline]
    pub const fn is_cyclic(self) -> bool {
        matches!(self, TaskKind::Cyclic | TaskKind::FollowUpCyclic)
    }
}

/// Execution state of a task.
///
/// ```text
///                start() / restart()
///   ┌─────────┐ ──────────────────► ┌─────────┐   countdown elapsed   ┌──────┐
///   │ Waiting │                     │ Running │ ────────────────────► │ Done │
///   └─────────┘ ◄────────────────── └─────────┘   (one-shot kinds)    └──────┘
///         countdown elapsed (TriggerOneShot)   │  ▲
///                                              └──┘ countdown elapsed (cyclic kinds)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Armed only by `start`/`restart`; `process` is a no-op.
    Waiting,
    /// Counting down.
    Running,
    /// Terminal: the one-shot has fired.
    Done,
}

/// Handle to a task registered with a scheduler.
///
/// Stays valid for the lifetime of the scheduler that issued it. A handle
/// never keeps its task alive and never resolves in a different scheduler's
/// registry slot generation by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle(pub(crate) NodeId);

impl TaskHandle {
    /// Registry node backing this task.
    #[inline]
    pub const fn node(&self) -> NodeId {
        self.0
    }
}

/// Handler invoked when a task's countdown elapses.
///
/// Runs inside the tick interrupt: it must be short, must not block and
/// cannot allocate. `fn` items coerce to `&'static Callback<'static>`.
pub type Callback<'a> = dyn Fn() + Sync + 'a;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A schedulable unit of work.
pub struct Task<'a> {
    kind: TaskKind,
    state: TaskState,
    period: u32,
    counter: u32,
    dependency: Option<TaskHandle>,
    fired: u32,
    callback: &'a Callback<'a>,
}

impl<'a> Task<'a> {
    /// Create a task. `TriggerOneShot` starts `Waiting`, every other kind
    /// starts `Running` with a full countdown.
    ///
    /// `period` must be non-zero; the scheduler factory rejects zero.
    pub fn new(kind: TaskKind, period: u32, callback: &'a Callback<'a>) -> Self {
        let state = match kind {
            TaskKind::TriggerOneShot => TaskState::Waiting,
            _ => TaskState::Running,
        };
        Self {
            kind,
            state,
            period,
            counter: period,
            dependency: None,
            fired: 0,
            callback,
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// `dependency_state` is the current state of this task's dependency, as
    /// resolved by the caller (`None` when no dependency is set or it does not
    /// resolve). Returns `true` if the callback ran.
    pub fn process(&mut self, dependency_state: Option<TaskState>) -> bool {
        if self.state != TaskState::Running {
            return false;
        }

        if self.kind.is_follow_up()
            && self.dependency.is_some()
            && matches!(dependency_state, Some(state) if state != TaskState::Done)
        {
            return false;
        }

        self.counter = self.counter.saturating_sub(1);
        if self.counter > 0 {
            return false;
        }

        (self.callback)();
        self.fired = self.fired.wrapping_add(1);

        match self.kind {
            TaskKind::Cyclic | TaskKind::FollowUpCyclic => self.counter = self.period,
            TaskKind::TriggerOneShot => self.state = TaskState::Waiting,
            TaskKind::OneShot | TaskKind::FollowUpOneShot => self.state = TaskState::Done,
        }
        true
    }

    /// Arm a `Waiting` task with a full countdown. No-op otherwise.
    pub fn start(&mut self) {
        if self.state == TaskState::Waiting {
            self.state = TaskState::Running;
            self.counter = self.period;
        }
    }

    /// Re-arm a `Waiting` or `Running` task with a full countdown.
    /// No-op once `Done`.
    pub fn restart(&mut self) {
        if self.state != TaskState::Done {
            self.state = TaskState::Running;
            self.counter = self.period;
        }
    }

    /// Gate this task on `dependency` reaching `Done`.
    ///
    /// Only follow-up kinds consult the dependency. Validation (dangling
    /// handles, cycles) is the scheduler's job.
    pub fn define_previous(&mut self, dependency: TaskHandle) {
        self.dependency = Some(dependency);
    }

    #[inline]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Ticks left until the callback fires.
    #[inline]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    #[inline]
    pub fn dependency(&self) -> Option<TaskHandle> {
        self.dependency
    }

    /// Number of times the callback has run.
    #[inline]
    pub fn fired(&self) -> u32 {
        self.fired
    }
}

impl core::fmt::Debug for Task<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("period", &self.period)
            .field("counter", &self.counter)
            .field("dependency", &self.dependency)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
