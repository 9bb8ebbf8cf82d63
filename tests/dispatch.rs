//! Dispatch scenarios driven against a standalone scheduler.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tasktick::sync::critical_section;
use tasktick::{Registry, Scheduler, TaskKind, TaskState};

fn noop() {}

#[test]
fn cyclic_with_dependent_follow_up_never_releases_it() {
    let c = AtomicU32::new(0);
    let f = AtomicBool::new(false);
    let increment = || {
        c.fetch_add(1, Ordering::Relaxed);
    };
    let set_flag = || f.store(true, Ordering::Relaxed);

    let mut scheduler = Scheduler::<8>::new();
    let (cyclic, follow) = critical_section(|cs| {
        let cyclic = scheduler.create_task(cs, TaskKind::Cyclic, 3, &increment)?;
        let follow = scheduler.create_task(cs, TaskKind::FollowUpOneShot, 1, &set_flag)?;
        scheduler.define_previous(cs, follow, cyclic)?;
        Ok::<_, tasktick::Error>((cyclic, follow))
    })
    .unwrap();

    for _ in 0..3 {
        scheduler.dispatch();
    }

    assert_eq!(c.load(Ordering::Relaxed), 1);
    assert!(!f.load(Ordering::Relaxed));
    assert_eq!(scheduler.state(cyclic), Some(TaskState::Running));
    assert_eq!(scheduler.state(follow), Some(TaskState::Running));
}

#[test]
fn mixed_task_set_over_many_ticks() {
    let cyclic_hits = AtomicU32::new(0);
    let one_shot_hits = AtomicU32::new(0);
    let follow_hits = AtomicU32::new(0);
    let on_cyclic = || {
        cyclic_hits.fetch_add(1, Ordering::Relaxed);
    };
    let on_one_shot = || {
        one_shot_hits.fetch_add(1, Ordering::Relaxed);
    };
    let on_follow = || {
        follow_hits.fetch_add(1, Ordering::Relaxed);
    };

    let mut scheduler = Scheduler::<8>::new();
    critical_section(|cs| {
        scheduler.create_task(cs, TaskKind::Cyclic, 7, &on_cyclic)?;
        let gate = scheduler.create_task(cs, TaskKind::OneShot, 10, &on_one_shot)?;
        let follow = scheduler.create_task(cs, TaskKind::FollowUpCyclic, 5, &on_follow)?;
        scheduler.define_previous(cs, follow, gate)
    })
    .unwrap();

    for _ in 0..70 {
        scheduler.dispatch();
    }

    assert_eq!(cyclic_hits.load(Ordering::Relaxed), 10);
    assert_eq!(one_shot_hits.load(Ordering::Relaxed), 1);
    // Released at tick 10; fires at 14, then every 5 ticks up to 69.
    assert_eq!(follow_hits.load(Ordering::Relaxed), 12);
}

#[test]
fn registry_exposes_tasks_in_registration_order() {
    let mut scheduler = Scheduler::<4>::new();
    critical_section(|cs| {
        scheduler.create_task(cs, TaskKind::Cyclic, 1, &noop)?;
        scheduler.create_task(cs, TaskKind::TriggerOneShot, 2, &noop)?;
        scheduler.create_task(cs, TaskKind::OneShot, 3, &noop)
    })
    .unwrap();

    let kinds: Vec<TaskKind> = scheduler.registry().iter().map(|task| task.kind()).collect();
    assert_eq!(
        kinds,
        [TaskKind::Cyclic, TaskKind::TriggerOneShot, TaskKind::OneShot]
    );
    assert_eq!(
        scheduler.registry().find(|task| task.period() == 2).map(|task| task.state()),
        Some(TaskState::Waiting)
    );
}

#[test]
fn registry_positional_removal() {
    let mut registry: Registry<&str, 4> = Registry::new();
    registry.add("a").unwrap();
    registry.add("b").unwrap();
    registry.add("c").unwrap();

    assert_eq!(registry.remove(1), Some("b"));
    assert_eq!(registry.get(0), Some(&"a"));
    assert_eq!(registry.get(1), Some(&"c"));
    assert_eq!(registry.count(), 2);

    let mut first = registry.cursor();
    let mut second = registry.cursor();
    assert_eq!(registry.advance(&mut first), Some(&"a"));
    assert_eq!(registry.advance(&mut first), Some(&"c"));
    assert_eq!(registry.advance(&mut second), Some(&"a"));
    assert_eq!(registry.advance(&mut first), None);
    assert_eq!(registry.advance(&mut second), Some(&"c"));
}
