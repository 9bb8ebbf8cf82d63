//! # Cortex-M4 Port Layer
//!
//! SysTick as the periodic interrupt source for the dispatcher.
//!
//! ## Tick Mechanism
//!
//! SysTick is a 24-bit down-counter clocked from the core clock. Attaching a
//! handler programs the reload value for the requested period and enables the
//! `SysTick` exception, which calls the handler once per period.
//!
//! ## Interrupt Priorities
//!
//! - SysTick: Priority 0xFF (lowest), never preempts application ISRs
//!
//! An exception does not preempt itself, so the handler is never re-entered.

use core::cell::Cell;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use critical_section::Mutex;

use crate::error::TimerError;
use crate::timer::{TickHandler, TickSource};

/// SysTick reload register is 24 bits wide.
const SYST_MAX_TICKS: u64 = 1 << 24;

/// Handler currently bound to the `SysTick` exception.
static HANDLER: Mutex<Cell<Option<TickHandler>>> = Mutex::new(Cell::new(None));

// ---------------------------------------------------------------------------
// SysTick tick source
// ---------------------------------------------------------------------------

/// Periodic interrupt source backed by the SysTick timer.
pub struct SysTickSource {
    syst: SYST,
    clock_hz: u32,
}

impl SysTickSource {
    /// Take ownership of SysTick, clocked at `clock_hz`.
    pub fn new(syst: SYST, clock_hz: u32) -> Self {
        Self { syst, clock_hz }
    }

    /// Release the peripheral. Detaches any handler first.
    pub fn free(mut self) -> SYST {
        self.detach();
        self.syst
    }

    /// Reload value producing `period_ms`, if SysTick can represent it.
    fn reload_for(&self, period_ms: u32) -> Option<u32> {
        let ticks = (self.clock_hz as u64 / 1000) * period_ms as u64;
        if ticks == 0 || ticks > SYST_MAX_TICKS {
            return None;
        }
        Some((ticks - 1) as u32)
    }
}

impl TickSource for SysTickSource {
    fn attach(&mut self, period_ms: u32, handler: TickHandler) -> Result<(), TimerError> {
        if self.is_attached() {
            return Err(TimerError::AlreadyAttached);
        }
        let reload = self
            .reload_for(period_ms)
            .ok_or(TimerError::PeriodOutOfRange)?;

        critical_section::with(|cs| HANDLER.borrow(cs).set(Some(handler)));
        set_interrupt_priority();

        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.enable_interrupt();
        self.syst.enable_counter();
        Ok(())
    }

    fn detach(&mut self) {
        self.syst.disable_interrupt();
        self.syst.disable_counter();
        critical_section::with(|cs| HANDLER.borrow(cs).set(None));
    }

    fn is_attached(&self) -> bool {
        critical_section::with(|cs| HANDLER.borrow(cs).get().is_some())
    }
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick to the lowest interrupt priority.
///
/// Dispatch passes then never delay application-level ISRs.
/// Uses priority 0xFF (lowest on Cortex-M4 with 4 priority bits = 0xF0).
fn set_interrupt_priority() {
    unsafe {
        // System Handler Priority Register 3 (SHPR3): 0xE000_ED20
        // Bits [31:24] = SysTick priority
        let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
        let val = core::ptr::read_volatile(shpr3);
        core::ptr::write_volatile(shpr3, val | (0xFF << 24));
    }
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler. Forwards to the attached tick handler.
#[exception]
fn SysTick() {
    let handler = critical_section::with(|cs| HANDLER.borrow(cs).get());
    if let Some(handler) = handler {
        handler();
    }
}
