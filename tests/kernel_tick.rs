//! The global kernel instance driven by a mock tick source.
//!
//! Kept to a single test: the kernel instance lives for the whole binary.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tasktick::timer::mock::MockTickSource;
use tasktick::{kernel, Error, TaskKind, TaskState, TickSource, TimerError};

static C: AtomicU32 = AtomicU32::new(0);
static F: AtomicBool = AtomicBool::new(false);
static TRIGGERED: AtomicU32 = AtomicU32::new(0);

fn increment() {
    C.fetch_add(1, Ordering::Relaxed);
}

fn set_flag() {
    F.store(true, Ordering::Relaxed);
}

fn on_trigger() {
    TRIGGERED.fetch_add(1, Ordering::Relaxed);
}

#[test]
fn kernel_dispatches_on_mock_ticks() {
    let cyclic = kernel::create_task(TaskKind::Cyclic, 3, &increment).unwrap();
    let follow = kernel::create_task(TaskKind::FollowUpOneShot, 1, &set_flag).unwrap();
    kernel::define_previous(follow, cyclic).unwrap();
    let trigger = kernel::create_task(TaskKind::TriggerOneShot, 4, &on_trigger).unwrap();

    assert_eq!(
        kernel::create_task(TaskKind::Cyclic, 0, &increment),
        Err(Error::ZeroPeriod)
    );

    // A failed attach leaves scheduling stopped; a retry may succeed.
    let mut broken = MockTickSource::failing(TimerError::Unavailable);
    assert_eq!(
        kernel::set_tick_period(&mut broken, 1),
        Err(Error::Timer(TimerError::Unavailable))
    );

    let mut source = MockTickSource::new();
    kernel::set_tick_period(&mut source, 2).unwrap();
    assert_eq!(source.period_ms(), Some(2));

    source.fire(3);
    assert_eq!(C.load(Ordering::Relaxed), 1);
    assert!(!F.load(Ordering::Relaxed));

    kernel::start(trigger).unwrap();
    source.fire(3);
    assert_eq!(TRIGGERED.load(Ordering::Relaxed), 0);
    source.fire(1);
    assert_eq!(TRIGGERED.load(Ordering::Relaxed), 1);
    assert_eq!(kernel::task_state(trigger), Some(TaskState::Waiting));

    kernel::restart(trigger).unwrap();
    source.fire(4);
    assert_eq!(TRIGGERED.load(Ordering::Relaxed), 2);

    assert_eq!(kernel::ticks(), 11);
    assert_eq!(kernel::task_state(follow), Some(TaskState::Running));

    kernel::stop(&mut source).unwrap();
    assert!(!source.is_attached());
    assert_eq!(kernel::with_scheduler(|_, s| s.tick_period_ms()), Ok(None));
}
