//! # Tasktick Example Firmware
//!
//! Demonstrates the dispatcher with four tasks covering every gating rule:
//!
//! | Task | Kind | Period | Behavior |
//! |------|------|--------|----------|
//! | `warm_up` | OneShot | 200 | Fires once after start-up |
//! | `after_warm_up` | FollowUpOneShot | 50 | Counts down only once `warm_up` is done |
//! | `heartbeat` | Cyclic | 1000 | Fires every second, kicks `report` every 5th beat |
//! | `report` | TriggerOneShot | 10 | Waits for a kick, fires 10 ticks later |
//!
//! At a 1 ms tick: `warm_up` at 200 ms, `after_warm_up` at 249 ms, a heartbeat
//! every second and a report 10 ms after every fifth heartbeat.

#![no_std]
#![no_main]

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::entry;
use critical_section::Mutex;
use defmt_rtt as _;
use panic_halt as _;

use tasktick::arch::cortex_m4::SysTickSource;
use tasktick::config::{DEFAULT_TICK_PERIOD_MS, SYSTEM_CLOCK_HZ};
use tasktick::{kernel, TaskHandle, TaskKind};

static BEATS: AtomicU32 = AtomicU32::new(0);

/// Handle of `report`, published once registration is done.
static REPORT: Mutex<Cell<Option<TaskHandle>>> = Mutex::new(Cell::new(None));

// ---------------------------------------------------------------------------
// Task callbacks
// ---------------------------------------------------------------------------

fn warm_up() {
    defmt::info!("warm-up done");
}

fn after_warm_up() {
    defmt::info!("follow-up after warm-up");
}

fn heartbeat() {
    let beats = BEATS.fetch_add(1, Ordering::Relaxed) + 1;
    defmt::info!("heartbeat {=u32}", beats);

    if beats % 5 == 0 {
        let report = critical_section::with(|cs| REPORT.borrow(cs).get());
        if let Some(report) = report {
            // Applied at the start of the next tick.
            if kernel::start(report).is_err() {
                defmt::warn!("report kick dropped");
            }
        }
    }
}

fn report() {
    defmt::info!("report: {=u32} beats", BEATS.load(Ordering::Relaxed));
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let Some(cp) = cortex_m::Peripherals::take() else {
        defmt::error!("core peripherals already taken");
        idle();
    };

    if let Err(e) = register_tasks() {
        defmt::error!("task registration failed: {}", e);
    }

    let mut systick = SysTickSource::new(cp.SYST, SYSTEM_CLOCK_HZ);
    match kernel::set_tick_period(&mut systick, DEFAULT_TICK_PERIOD_MS) {
        Ok(()) => defmt::info!("dispatcher running at {=u32} ms", DEFAULT_TICK_PERIOD_MS),
        Err(e) => defmt::error!("no tick source, tasks will not run: {}", e),
    }

    idle()
}

fn register_tasks() -> tasktick::Result<()> {
    let warm = kernel::create_task(TaskKind::OneShot, 200, &warm_up)?;
    let follow = kernel::create_task(TaskKind::FollowUpOneShot, 50, &after_warm_up)?;
    kernel::define_previous(follow, warm)?;

    kernel::create_task(TaskKind::Cyclic, 1000, &heartbeat)?;
    let trigger = kernel::create_task(TaskKind::TriggerOneShot, 10, &report)?;
    critical_section::with(|cs| REPORT.borrow(cs).set(Some(trigger)));
    Ok(())
}

fn idle() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
