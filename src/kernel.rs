//! # Kernel
//!
//! The process-wide scheduler instance and the public API around it.
//!
//! The kernel owns exactly one [`Scheduler`], wired to a [`Requests`] queue,
//! and binds [`on_tick`] to the periodic interrupt source.
//!
//! The instance sits behind an [`Exclusive`] lock. Calls from thread context
//! run with interrupts masked, so a tick never finds them half done. A
//! dispatch pass holds only the lock: other interrupts stay enabled while
//! task callbacks run, and any of them that reaches for the scheduler gets
//! [`Error::Busy`].
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::create_task()      ← Register tasks (×N)
//!         ├─► kernel::define_previous()  ← Wire follow-up dependencies
//!         └─► kernel::set_tick_period()  ← Attach on_tick() to the tick source
//!               └─► every tick: on_tick()
//!                     ├─► drain REQUESTS (start / restart)
//!                     └─► Task::process() for each task, in order
//! ```
//!
//! `start`/`restart` are always deferred through the request queue, so they
//! are safe from the main thread, other interrupts and task callbacks alike.

use crate::error::{Error, Result};
use crate::log::log_warn;
use crate::request::Requests;
use crate::scheduler::Scheduler;
use crate::sync::{self, CriticalSection, Exclusive};
use crate::task::{Callback, TaskHandle, TaskKind, TaskState};
use crate::timer::TickSource;

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Pending start/restart requests, drained at the beginning of every tick.
static REQUESTS: Requests = Requests::new();

/// Global scheduler instance. Constructed at compile time, never destroyed.
static SCHEDULER: Exclusive<Scheduler<'static>> =
    Exclusive::new(Scheduler::with_requests(&REQUESTS));

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Run `f` with exclusive access to the global scheduler.
///
/// # Returns
/// - `Ok(r)`: the closure's result.
/// - `Err(Error::Busy)`: a dispatch pass holds the scheduler, i.e. this was
///   called from a task callback or an interrupt that preempted one.
///
/// `f` runs inside a critical section; keep it short.
pub fn with_scheduler<F, R>(f: F) -> Result<R>
where
    F: FnOnce(CriticalSection<'_>, &mut Scheduler<'static>) -> R,
{
    sync::critical_section(|cs| {
        let mut scheduler = SCHEDULER.try_lock(cs).ok_or(Error::Busy)?;
        Ok(f(cs, &mut scheduler))
    })
}

/// Create a new task and register it with the scheduler.
///
/// # Parameters
/// - `kind`: One-shot, cyclic, follow-up or trigger behavior.
/// - `period`: Countdown length in ticks (must be non-zero).
/// - `callback`: Handler run from the tick interrupt when the countdown elapses.
///
/// # Example
/// ```ignore
/// fn blink() { /* toggle LED */ }
///
/// let led = kernel::create_task(TaskKind::Cyclic, 500, &blink)?;
/// ```
pub fn create_task(kind: TaskKind, period: u32, callback: &'static Callback<'static>) -> Result<TaskHandle> {
    with_scheduler(|cs, scheduler| scheduler.create_task(cs, kind, period, callback))?
}

/// Gate `task` on `dependency` reaching `Done`.
pub fn define_previous(task: TaskHandle, dependency: TaskHandle) -> Result<()> {
    with_scheduler(|cs, scheduler| scheduler.define_previous(cs, task, dependency))?
}

/// Arm a waiting task before the next tick.
pub fn start(task: TaskHandle) -> Result<()> {
    REQUESTS.start(task)
}

/// Re-arm a waiting or running task with a full countdown before the next tick.
pub fn restart(task: TaskHandle) -> Result<()> {
    REQUESTS.restart(task)
}

/// Current state of `task`; `None` for unknown handles or while busy.
pub fn task_state(task: TaskHandle) -> Option<TaskState> {
    with_scheduler(|_, scheduler| scheduler.state(task))
        .ok()
        .flatten()
}

/// Number of ticks dispatched so far.
pub fn ticks() -> u64 {
    with_scheduler(|_, scheduler| scheduler.ticks()).unwrap_or(0)
}

/// Attach [`on_tick`] to `source` with the given period.
///
/// Failure is returned to the caller: no task fires until a later call
/// succeeds.
pub fn set_tick_period<S: TickSource>(source: &mut S, period_ms: u32) -> Result<()> {
    with_scheduler(|_, scheduler| scheduler.set_tick_period(source, period_ms, on_tick))?
}

/// Detach the dispatcher from `source`. Tasks keep their state.
pub fn stop<S: TickSource>(source: &mut S) -> Result<()> {
    with_scheduler(|_, scheduler| scheduler.stop(source))
}

/// Tick handler bound to the periodic interrupt: one dispatch pass.
///
/// Interrupts are masked only while the lock is taken, not while callbacks
/// run. A tick arriving while the scheduler is locked is skipped.
pub fn on_tick() {
    let Some(mut scheduler) = sync::critical_section(|cs| SCHEDULER.try_lock(cs)) else {
        log_warn!("tick skipped, scheduler busy");
        return;
    };
    scheduler.dispatch();
}

/// Reset the global instance (for testing only).
#[cfg(test)]
fn reset() {
    with_scheduler(|_, scheduler| *scheduler = Scheduler::with_requests(&REQUESTS)).unwrap();
    REQUESTS.clear();
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimerError;
    use crate::timer::mock::MockTickSource;
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use serial_test::serial;

    static CYCLIC_HITS: AtomicU32 = AtomicU32::new(0);
    static TRIGGER_HITS: AtomicU32 = AtomicU32::new(0);
    static SAW_BUSY: AtomicBool = AtomicBool::new(false);

    fn count_cyclic() {
        CYCLIC_HITS.fetch_add(1, Ordering::Relaxed);
    }

    fn count_trigger() {
        TRIGGER_HITS.fetch_add(1, Ordering::Relaxed);
    }

    fn register_from_callback() {
        let result = create_task(TaskKind::OneShot, 1, &count_cyclic);
        SAW_BUSY.store(result == Err(Error::Busy), Ordering::Relaxed);
    }

    #[test]
    #[serial]
    fn test_ticks_drive_global_scheduler() {
        reset();
        CYCLIC_HITS.store(0, Ordering::Relaxed);

        create_task(TaskKind::Cyclic, 3, &count_cyclic).unwrap();

        let mut source = MockTickSource::new();
        set_tick_period(&mut source, 1).unwrap();
        source.fire(9);

        assert_eq!(CYCLIC_HITS.load(Ordering::Relaxed), 3);
        assert_eq!(ticks(), 9);

        stop(&mut source).unwrap();
        assert_eq!(with_scheduler(|_, s| s.tick_period_ms()), Ok(None));
        source.fire(9);
        assert_eq!(CYCLIC_HITS.load(Ordering::Relaxed), 3);
    }

    #[test]
    #[serial]
    fn test_deferred_start() {
        reset();
        TRIGGER_HITS.store(0, Ordering::Relaxed);

        let trigger = create_task(TaskKind::TriggerOneShot, 2, &count_trigger).unwrap();
        let mut source = MockTickSource::new();
        set_tick_period(&mut source, 1).unwrap();

        source.fire(5);
        assert_eq!(TRIGGER_HITS.load(Ordering::Relaxed), 0);
        assert_eq!(task_state(trigger), Some(TaskState::Waiting));

        start(trigger).unwrap();
        source.fire(1);
        assert_eq!(task_state(trigger), Some(TaskState::Running));
        source.fire(1);
        assert_eq!(TRIGGER_HITS.load(Ordering::Relaxed), 1);
        assert_eq!(task_state(trigger), Some(TaskState::Waiting));
    }

    #[test]
    #[serial]
    fn test_registration_from_callback_is_busy() {
        reset();
        SAW_BUSY.store(false, Ordering::Relaxed);

        create_task(TaskKind::OneShot, 1, &register_from_callback).unwrap();
        on_tick();

        assert!(SAW_BUSY.load(Ordering::Relaxed));
        assert_eq!(with_scheduler(|_, s| s.registry().count()), Ok(1));
    }

    #[test]
    #[serial]
    fn test_attach_failure_surfaced() {
        reset();
        let mut source = MockTickSource::failing(TimerError::Unavailable);

        assert_eq!(
            set_tick_period(&mut source, 1),
            Err(Error::Timer(TimerError::Unavailable))
        );
        assert_eq!(with_scheduler(|_, s| s.tick_period_ms()), Ok(None));
    }
}
