// Process Control Block (PCB) - the scheduler's record of one process
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use futures_util::future::BoxFuture;

use crate::kernel::Kernel;
use crate::process::context::ExecutionContext;

/// Process ID type. 0 is never a valid pid.
pub type ProcessId = u64;

/// Scheduling priority; larger values win.
pub type Priority = i32;

/// Index of a record in the process table. All intra-table links use it.
pub type Slot = usize;

/// Entry function of a process, invoked once by the launch trampoline.
pub type EntryPoint = Box<dyn FnOnce(Kernel, String) -> BoxFuture<'static, i32> + Send + 'static>;

/// Process state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,   // On exactly one ready queue
    Running, // The single current process
    Blocked, // Waiting for a child to exit
    Quit,    // Exited; a zombie until its parent reaps it
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Quit => "QUIT",
        };
        f.pad(s)
    }
}

/// Process Control Block
pub struct ProcessControlBlock {
    pub pid: ProcessId,
    pub name: String,
    pub args: String,
    pub priority: Priority,
    pub state: ProcessState,
    /// Taken by the launch trampoline on first run.
    pub entry: Option<EntryPoint>,
    pub context: ExecutionContext,
    /// Meaningful only once `state` is `Quit`.
    pub exit_code: i32,
    /// Weak back-link; the parent outlives every unreaped child.
    pub parent: Option<Slot>,
    /// Unreaped children in spawn order.
    pub children: Vec<Slot>,
}

impl ProcessControlBlock {
    pub fn new(
        pid: ProcessId,
        name: &str,
        args: &str,
        priority: Priority,
        stack_size: usize,
        entry: EntryPoint,
    ) -> Self {
        Self {
            pid,
            name: String::from(name),
            args: String::from(args),
            priority,
            state: ProcessState::Ready,
            entry: Some(entry),
            context: ExecutionContext::empty(stack_size),
            exit_code: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Quit
    }
}

impl fmt::Debug for ProcessControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ProcessControlBlock")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("state", &self.state)
            .field("exit_code", &self.exit_code)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of one process table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
    pub priority: Priority,
    pub state: ProcessState,
    pub parent: Option<ProcessId>,
    pub children: usize,
    pub exit_code: Option<i32>,
    pub stack_size: usize,
}

/// Text rendering of a process table snapshot
pub struct ProcessTableDump<'a>(pub &'a [ProcessInfo]);

impl fmt::Display for ProcessTableDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "  PID  PARENT  PRI  STATE    CHILD  STACK  NAME")?;
        for info in self.0 {
            let parent = match info.parent {
                Some(ppid) => ppid as i64,
                None => -1,
            };
            write!(
                f,
                "  {:3}  {:6}  {:3}  {:<7}  {:5}  {:5}  {}",
                info.pid, parent, info.priority, info.state, info.children, info.stack_size, info.name
            )?;
            if let Some(code) = info.exit_code {
                write!(f, " (exit {})", code)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
