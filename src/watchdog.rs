//! Watchdog process: detects clean completion and deadlock.
//!
//! The watchdog is spawned first, at `LOWEST_PRIORITY`, and never exits. It
//! only gets the processor when nothing else is ready, so each of its turns
//! is a chance to decide whether the system can still make progress:
//!
//! - outstanding I/O (per the platform) counts as progress; the watchdog
//!   offers the processor back to the dispatcher and checks again later;
//! - ready work other than the watchdog itself means every remaining
//!   process is stuck behind it: a deadlock;
//! - otherwise every process has finished and the system halts cleanly.

use alloc::string::String;
use log::error;

use crate::error::Halt;
use crate::kernel::{suspend, Kernel};
use crate::process::lifecycle::Resume;

/// Body of the watchdog process.
pub(crate) async fn watchdog(kernel: Kernel, _arg: String) -> i32 {
    kernel.with_state(|state| kdebug!(state.config, "watchdog(): called"));
    loop {
        kernel.check_deadlock().await;
    }
}

impl Kernel {
    /// One watchdog iteration. Returns only while I/O is outstanding.
    pub(crate) async fn check_deadlock(&self) {
        if self.platform().check_io() {
            let resume = self.with_state(|state| state.reschedule());
            // still hand control back to the run loop when nothing preempts
            let resume = match resume {
                Resume::Now => Resume::AfterSwitch,
                other => other,
            };
            suspend(resume).await;
            return;
        }

        let halt = self.with_state(|state| {
            if state.dispatcher.has_pending_work() {
                error!("check_deadlock(): ready processes remain but none can run");
                if state.config.debug {
                    log::debug!("{}", crate::process::ProcessTableDump(&state.snapshot()));
                }
                Halt::Deadlock
            } else {
                Halt::Completed
            }
        });
        match self.halt(halt).await {}
    }
}
