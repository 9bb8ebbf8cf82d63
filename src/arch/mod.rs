//! # Architecture Abstraction Layer
//!
//! Concrete periodic interrupt sources implementing
//! [`TickSource`](crate::timer::TickSource).
//! Currently implements the Cortex-M4 SysTick port; extensible to other
//! architectures by adding sibling modules. Only compiled for bare-metal ARM.

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m4;
