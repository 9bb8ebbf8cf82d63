//! # Periodic Interrupt Source
//!
//! The only hardware capability the dispatcher needs: call a handler at a
//! fixed period. Register programming lives behind this trait (see
//! `arch::cortex_m4` for the SysTick port and [`mock`] for host tests).

use crate::error::TimerError;

/// Handler bound to the periodic interrupt. Must not be re-entered: an
/// implementation may not invoke it again before the previous call returns.
pub type TickHandler = fn();

/// A source of periodic interrupts.
pub trait TickSource {
    /// Invoke `handler` every `period_ms` milliseconds until detached.
    fn attach(&mut self, period_ms: u32, handler: TickHandler) -> Result<(), TimerError>;

    /// Stop invoking the handler. No-op if nothing is attached.
    fn detach(&mut self);

    /// True while a handler is attached.
    fn is_attached(&self) -> bool;
}

pub mod mock {
    //! Mock tick source for host testing

    use super::{TickHandler, TickSource};
    use crate::error::TimerError;

    /// Mock tick source
    ///
    /// Records the attached handler and period. Ticks are produced on demand
    /// with [`MockTickSource::fire`] instead of by hardware.
    #[derive(Debug, Default)]
    pub struct MockTickSource {
        handler: Option<TickHandler>,
        period_ms: Option<u32>,
        fail_with: Option<TimerError>,
        fired: u64,
    }

    impl MockTickSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// A source whose every `attach` fails with `error`.
        pub fn failing(error: TimerError) -> Self {
            Self {
                fail_with: Some(error),
                ..Self::default()
            }
        }

        /// Period of the attached handler.
        pub fn period_ms(&self) -> Option<u32> {
            self.period_ms
        }

        /// Total ticks delivered so far.
        pub fn fired(&self) -> u64 {
            self.fired
        }

        /// Deliver `ticks` interrupts to the attached handler, one after the
        /// other. Does nothing while detached.
        pub fn fire(&mut self, ticks: u32) {
            if let Some(handler) = self.handler {
                for _ in 0..ticks {
                    handler();
                    self.fired += 1;
                }
            }
        }
    }

    impl TickSource for MockTickSource {
        fn attach(&mut self, period_ms: u32, handler: TickHandler) -> Result<(), TimerError> {
            if let Some(error) = self.fail_with {
                return Err(error);
            }
            if self.handler.is_some() {
                return Err(TimerError::AlreadyAttached);
            }
            if period_ms == 0 {
                return Err(TimerError::PeriodOutOfRange);
            }
            self.handler = Some(handler);
            self.period_ms = Some(period_ms);
            Ok(())
        }

        fn detach(&mut self) {
            self.handler = None;
            self.period_ms = None;
        }

        fn is_attached(&self) -> bool {
            self.handler.is_some()
        }
    }

}
