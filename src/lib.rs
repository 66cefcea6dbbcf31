//! Cooperative, priority-driven scheduler core for a simulated multi-process
//! kernel.
//!
//! Processes are `async` bodies multiplexed on one thread of control. They
//! suspend only inside [`Kernel::spawn`], [`Kernel::wait`] and
//! [`Kernel::exit`], and the dispatcher always hands the processor to the
//! highest-priority ready process, round-robin within a level. A watchdog at
//! the lowest priority halts the system once nothing can make progress.
//!
//! ```no_run
//! use threads_kernel::{Kernel, KernelConfig, MIN_STACK_SIZE};
//!
//! let kernel = Kernel::hosted(KernelConfig::default());
//! let halt = kernel.bootstrap(|k, _| async move {
//!     k.spawn("child", |_, _| async { 7 }, None, MIN_STACK_SIZE, 3).await.unwrap();
//!     let (_pid, code) = k.wait().await.unwrap();
//!     code
//! });
//! assert_eq!(halt.exit_status(), 0);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

/// `log::debug!` gated on the kernel's debug flag.
macro_rules! kdebug {
    ($config:expr, $($arg:tt)+) => {
        if $config.debug {
            ::log::debug!($($arg)+);
        }
    };
}

pub mod config;
pub mod error;
pub mod kernel;
pub mod platform;
pub mod process;
mod watchdog;

pub use config::{
    KernelConfig, DEFAULT_MAX_PROCESSES, HIGHEST_PRIORITY, LOWEST_PRIORITY, MAX_ARG, MAX_NAME,
    MIN_STACK_SIZE, NUM_PRIORITIES,
};
pub use error::{FatalError, Halt, QueueError, SpawnError, WaitError};
pub use kernel::Kernel;
pub use platform::{HostPlatform, Platform};
pub use process::{Priority, ProcessId, ProcessInfo, ProcessState, ProcessTableDump, SchedulerStats};
