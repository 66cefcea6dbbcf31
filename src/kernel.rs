// Kernel handle: the process-facing API and the run loop
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::future::{self, Future};
use core::task::Poll;
use futures_util::future::FutureExt;
use log::info;
use spin::Mutex;

use crate::config::{KernelConfig, HIGHEST_PRIORITY, LOWEST_PRIORITY};
use crate::error::{FatalError, Halt, SpawnError, WaitError};
use crate::platform::{HostPlatform, Platform};
use crate::process::context::switch_context;
use crate::process::lifecycle::{KernelState, Resume, SchedulerStats, WaitStep};
use crate::process::pcb::{EntryPoint, Priority, ProcessId, ProcessInfo, ProcessState, Slot};
use crate::watchdog::watchdog;

struct Shared {
    state: Mutex<KernelState>,
    platform: Box<dyn Platform>,
}

/// Cheap, cloneable handle to one kernel instance.
///
/// Every process receives a clone as the first argument of its entry
/// function. `spawn`, `wait` and `exit` must be awaited one at a time by the
/// process that is currently running.
#[derive(Clone)]
pub struct Kernel {
    shared: Arc<Shared>,
}

impl Kernel {
    pub fn new<P>(config: KernelConfig, platform: P) -> Self
    where
        P: Platform + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(KernelState::new(config)),
                platform: Box::new(platform),
            }),
        }
    }

    /// Kernel on a platform without devices.
    pub fn hosted(config: KernelConfig) -> Self {
        Self::new(config, HostPlatform)
    }

    pub fn config(&self) -> KernelConfig {
        self.shared.state.lock().config
    }

    pub(crate) fn platform(&self) -> &dyn Platform {
        self.shared.platform.as_ref()
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut KernelState) -> R) -> R {
        let mut state = self.shared.state.lock();
        f(&mut state)
    }

    /// Seed the watchdog and the startup process, then schedule until the
    /// system halts.
    ///
    /// The startup process runs at `HIGHEST_PRIORITY` under the name
    /// "Scheduler" and is the root of every process it spawns.
    pub fn bootstrap<F, Fut>(self, startup: F) -> Halt
    where
        F: FnOnce(Kernel, String) -> Fut + Send + 'static,
        Fut: Future<Output = i32> + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock();
            let min_stack = state.config.min_stack_size;
            info!("bootstrap(): starting kernel, {} process slots", state.table.capacity());

            let seeded = state
                .create_process(
                    &self,
                    "watchdog",
                    "",
                    LOWEST_PRIORITY,
                    min_stack,
                    Box::new(|k, a| watchdog(k, a).boxed()),
                )
                .and_then(|_| {
                    state.create_process(
                        &self,
                        "Scheduler",
                        "",
                        HIGHEST_PRIORITY,
                        2 * min_stack,
                        boxed_entry(startup),
                    )
                });

            match seeded {
                Ok(_) => {
                    state.reschedule();
                }
                Err(err) => {
                    state.fail(FatalError::BootstrapSpawn(err));
                }
            }
        }
        self.run()
    }

    /// Resume the running process until the system halts.
    fn run(&self) -> Halt {
        let halt = loop {
            let (slot, pid, mut continuation) = {
                let mut state = self.shared.state.lock();
                if let Some(halt) = state.halted() {
                    break halt;
                }
                let slot = match state.dispatcher.running() {
                    Some(slot) => slot,
                    None => {
                        state.fail(FatalError::NoRunnableProcess);
                        continue;
                    }
                };
                let pid = state.table.pid_of(slot);
                match state.table.get_mut(slot).and_then(|p| p.context.take()) {
                    Some(continuation) => (slot, pid, continuation),
                    None => {
                        state.fail(FatalError::MissingContext(pid));
                        continue;
                    }
                }
            };

            if let Poll::Ready(never) = switch_context(&mut continuation) {
                match never {}
            }

            let mut state = self.shared.state.lock();
            if state.halted().is_some() {
                drop(state);
                drop(continuation);
                continue;
            }
            // a zombie's continuation is dropped here, after the lock
            if let Some(p) = state.table.get_mut(slot) {
                if p.pid == pid && p.state != ProcessState::Quit {
                    p.context.restore(continuation);
                }
            }
        };

        let released = self.shared.state.lock().release_contexts();
        drop(released);

        self.shared.platform.halt(halt.exit_status());
        halt
    }

    /// Create a child of the running process.
    ///
    /// A child with higher or equal priority runs before this returns.
    /// Returns the new pid. An over-long name or argument halts the system
    /// and this never resumes.
    pub async fn spawn<F, Fut>(
        &self,
        name: &str,
        entry: F,
        arg: Option<&str>,
        stack_size: usize,
        priority: Priority,
    ) -> Result<ProcessId, SpawnError>
    where
        F: FnOnce(Kernel, String) -> Fut + Send + 'static,
        Fut: Future<Output = i32> + Send + 'static,
    {
        let (pid, resume) = {
            let mut state = self.shared.state.lock();
            match state.create_process(self, name, arg.unwrap_or(""), priority, stack_size, boxed_entry(entry)) {
                Ok(pid) => (pid, state.reschedule()),
                Err(err) => match err.fatal() {
                    Some(fatal) => (0, state.fail(fatal)),
                    None => return Err(err),
                },
            }
        };
        suspend(resume).await;
        Ok(pid)
    }

    /// Reap one exited child, blocking until a child exits if none has.
    ///
    /// Returns the child's pid and exit code.
    pub async fn wait(&self) -> Result<(ProcessId, i32), WaitError> {
        loop {
            let step = self.shared.state.lock().wait_step()?;
            match step {
                WaitStep::Reaped { pid, exit_code } => return Ok((pid, exit_code)),
                WaitStep::Suspend(resume) => suspend(resume).await,
            }
        }
    }

    /// Terminate the running process with `code`. Never returns.
    ///
    /// Halts the system if the process still has children.
    pub async fn exit(&self, code: i32) -> Infallible {
        let resume = self.shared.state.lock().exit_process(code);
        suspend(resume).await;
        future::pending().await
    }

    /// Stop the system from inside a process.
    pub(crate) async fn halt(&self, halt: Halt) -> Infallible {
        self.shared.state.lock().halt(halt);
        future::pending().await
    }

    /// Pid of the running process.
    pub fn getpid(&self) -> Option<ProcessId> {
        self.shared.state.lock().running_pid()
    }

    /// Snapshot of every occupied process table slot.
    pub fn process_table(&self) -> Vec<ProcessInfo> {
        self.shared.state.lock().snapshot()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.shared.state.lock().stats()
    }

    pub fn halted(&self) -> Option<Halt> {
        self.shared.state.lock().halted()
    }
}

fn boxed_entry<F, Fut>(entry: F) -> EntryPoint
where
    F: FnOnce(Kernel, String) -> Fut + Send + 'static,
    Fut: Future<Output = i32> + Send + 'static,
{
    Box::new(move |kernel, args| entry(kernel, args).boxed())
}

/// Give up the processor according to `resume`.
pub(crate) async fn suspend(resume: Resume) {
    match resume {
        Resume::Now => {}
        Resume::AfterSwitch => futures_util::pending!(),
        Resume::Never => future::pending::<()>().await,
    }
}

/// Trampoline every process starts in: run the entry function with the
/// stored start argument, then exit with its result.
pub(crate) async fn launch(kernel: Kernel, slot: Slot) -> Infallible {
    let (entry, args, pid) = kernel.with_state(|state| match state.table.get_mut(slot) {
        Some(p) => {
            kdebug!(state.config, "launch(): started: {}", p.name);
            (p.entry.take(), p.args.clone(), p.pid)
        }
        None => (None, String::new(), 0),
    });

    let entry = match entry {
        Some(entry) => entry,
        None => return kernel.halt(Halt::Fatal(FatalError::MissingContext(pid))).await,
    };

    let code = entry(kernel.clone(), args).await;
    kernel.with_state(|state| kdebug!(state.config, "Process {} returned to launch", pid));
    kernel.exit(code).await
}
