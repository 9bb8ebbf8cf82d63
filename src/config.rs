//! # Tasktick Configuration
//!
//! Compile-time constants governing the dispatcher and its tick source.
//! All limits are fixed at compile time; no dynamic allocation.

/// Maximum number of tasks the kernel scheduler can hold.
/// This bounds the static registry arena. Each slot stores one `Task`
/// plus its two link indices and a generation counter.
pub const MAX_TASKS: usize = 16;

/// Depth of the deferred start/restart queue. Requests issued between two
/// dispatch passes beyond this depth are rejected with `RequestQueueFull`.
pub const REQUEST_QUEUE_DEPTH: usize = 8;

/// Tick period used by the demo firmware, in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u32 = 1;

/// Shortest tick period `set_tick_period` accepts, in milliseconds.
pub const MIN_TICK_PERIOD_MS: u32 = 1;

/// Longest tick period `set_tick_period` accepts, in milliseconds.
/// The SysTick port additionally bounds this by its 24-bit reload register.
pub const MAX_TICK_PERIOD_MS: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
