//! # Tasktick: Cooperative Tick Dispatcher
//!
//! A cooperative, interrupt-driven task dispatcher for microcontrollers
//! without an operating system.
//!
//! ## Overview
//!
//! Application code registers tasks, each with its own countdown measured in
//! ticks. A single periodic interrupt drives a dispatch pass that walks every
//! registered task in order and lets it advance its countdown; when a
//! countdown elapses the task's callback runs right there, inside the
//! interrupt.
//!
//! - **No preemption between tasks**: callbacks run to completion
//! - **No priorities**: tasks are processed in registration order
//! - **No wall-clock time inside tasks**: everything is counted in ticks
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Tasks                    │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   create_task() · define_previous() · start() · on_tick│
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Requests         │  Sync Primitives  │
//! │  scheduler.rs│   request.rs       │  sync.rs          │
//! │  ─ dispatch()│   ─ start()        │  ─ critical_section│
//! │  ─ register  │   ─ restart()      │  ─ Shared<T>      │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │   Task Model (task.rs)  ·  Ordered Registry (registry.rs)│
//! │   Kind · State · countdown · dependency · cursors        │
//! ├────────────────────────────────────────────────────────┤
//! │      Tick Source (timer.rs) · SysTick port (arch/)      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Task Kinds
//!
//! | Kind | Initial state | After firing |
//! |------|---------------|--------------|
//! | `OneShot` | Running | Done |
//! | `Cyclic` | Running | Running, countdown reset |
//! | `FollowUpOneShot` | Running (gated) | Done |
//! | `FollowUpCyclic` | Running (gated) | Running, countdown reset |
//! | `TriggerOneShot` | Waiting | Waiting |
//!
//! Follow-up kinds only count down once their dependency is `Done`.
//!
//! ## Memory Model
//!
//! - **No heap**: the registry is a fixed-capacity arena (`heapless`)
//! - **Stable handles**: tasks are addressed by slot index plus generation
//! - **Critical sections**: `critical_section::with()` for shared state
//! - **Unmasked dispatch**: a pass holds an `Exclusive` lock, not a critical
//!   section, so other interrupts run while callbacks do

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
mod log;
pub mod sync;
pub mod registry;
pub mod task;
pub mod request;
pub mod timer;
pub mod scheduler;
pub mod kernel;
pub mod arch;

pub use error::{Error, Result, TimerError};
pub use registry::{Cursor, NodeId, Registry};
pub use request::{Request, Requests};
pub use scheduler::Scheduler;
pub use task::{Callback, Task, TaskHandle, TaskKind, TaskState};
pub use timer::{TickHandler, TickSource};
