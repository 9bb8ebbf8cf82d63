//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions.
//! All state shared between the tick interrupt and the main thread must be
//! accessed within a critical section to prevent the dispatcher from observing
//! a half-updated registry.
//!
//! The implementation comes from the `critical-section` crate: on target,
//! `cortex-m`'s `critical-section-single-core` masks interrupts; on the host,
//! `critical-section/std` uses a global lock.
//!
//! [`Exclusive`] covers state that must stay reachable for longer than an
//! interrupt may be masked: the lock flag is flipped inside a short critical
//! section, the value itself is used with interrupts enabled.

use core::cell::{Cell, RefCell, UnsafeCell};
use core::ops::{Deref, DerefMut};

pub use critical_section::CriticalSection;

/// State shared between interrupt and thread context.
///
/// Access requires a `CriticalSection` token: `shared.borrow_ref_mut(cs)`.
pub type Shared<T> = critical_section::Mutex<RefCell<T>>;

/// Execute a closure within a critical section (interrupts disabled).
///
/// This is the primary mechanism for safely accessing shared mutable state.
/// Interrupts are disabled on entry and restored on exit, ensuring
/// atomicity of the enclosed operation. Nesting is allowed.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     scheduler.start(cs, handle)
/// });
/// ```
///
/// Keep critical sections as short as possible to minimize interrupt latency.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// Value with a try-lock guard that does not mask interrupts while held.
///
/// A context that finds the value locked gets `None` back instead of
/// spinning, so a higher-priority interrupt can never deadlock on it.
pub struct Exclusive<T> {
    locked: critical_section::Mutex<Cell<bool>>,
    value: UnsafeCell<T>,
}

// SAFETY: `value` is only reachable through an `ExclusiveGuard`, and at most
// one guard exists at a time (`locked` is tested and set in one critical
// section).
unsafe impl<T: Send> Sync for Exclusive<T> {}

impl<T> Exclusive<T> {
    pub const fn new(value: T) -> Self {
        Self {
            locked: critical_section::Mutex::new(Cell::new(false)),
            value: UnsafeCell::new(value),
        }
    }

    /// Take the lock, or `None` if another context holds it.
    pub fn try_lock(&self, cs: CriticalSection<'_>) -> Option<ExclusiveGuard<'_, T>> {
        let locked = self.locked.borrow(cs);
        if locked.replace(true) {
            return None;
        }
        Some(ExclusiveGuard { owner: self })
    }

    /// True while a guard is alive.
    pub fn is_locked(&self) -> bool {
        critical_section(|cs| self.locked.borrow(cs).get())
    }
}

/// Access to the value of an [`Exclusive`]. Unlocks on drop.
pub struct ExclusiveGuard<'a, T> {
    owner: &'a Exclusive<T>,
}

impl<T> Deref for ExclusiveGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard is the only one alive.
        unsafe { &*self.owner.value.get() }
    }
}

impl<T> DerefMut for ExclusiveGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard is the only one alive.
        unsafe { &mut *self.owner.value.get() }
    }
}

impl<T> Drop for ExclusiveGuard<'_, T> {
    fn drop(&mut self) {
        critical_section(|cs| self.owner.locked.borrow(cs).set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COUNTER: Shared<u32> = critical_section::Mutex::new(RefCell::new(0));

    #[test]
    fn test_shared_state_mutation() {
        let value = critical_section(|cs| {
            let mut counter = COUNTER.borrow_ref_mut(cs);
            *counter += 1;
            *counter
        });
        assert!(value >= 1);
    }

    #[test]
    fn test_nested_sections() {
        let result = critical_section(|_outer| critical_section(|_inner| 42));
        assert_eq!(result, 42);
    }

    #[test]
    fn test_exclusive_single_holder() {
        let cell = Exclusive::new(0u32);

        let mut guard = critical_section(|cs| cell.try_lock(cs)).unwrap();
        *guard += 1;
        assert!(cell.is_locked());
        assert!(critical_section(|cs| cell.try_lock(cs)).is_none());

        drop(guard);
        assert!(!cell.is_locked());
        let guard = critical_section(|cs| cell.try_lock(cs)).unwrap();
        assert_eq!(*guard, 1);
    }

    #[test]
    fn test_exclusive_holder_leaves_interrupts_enabled() {
        use std::sync::mpsc;
        use std::time::Duration;

        let cell = Exclusive::new(());
        let _guard = critical_section(|cs| cell.try_lock(cs)).unwrap();

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            critical_section(|_| ());
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_ok());
    }
}
