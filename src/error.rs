// Error and halt types for the scheduler core
use core::fmt;

use crate::process::pcb::ProcessId;

/// Recoverable spawn failures. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// Name was empty.
    NullName,
    /// The ready queue for the requested priority refused the record.
    EnqueueFailed,
    /// Requested stack is below the configured minimum.
    StackTooSmall,
    /// Priority outside `[LOWEST_PRIORITY, HIGHEST_PRIORITY]`.
    InvalidPriority,
    /// Every process table slot is in use.
    TableFull,
    /// Name is too long. Escalated to a system halt by the caller.
    NameTooLong,
    /// Start argument is too long. Escalated to a system halt by the caller.
    ArgsTooLong,
}

impl SpawnError {
    /// Stable negative code reported to callers.
    pub fn code(&self) -> i32 {
        match self {
            SpawnError::NullName => -1,
            SpawnError::EnqueueFailed => -2,
            SpawnError::StackTooSmall => -4,
            SpawnError::InvalidPriority => -5,
            SpawnError::TableFull => -6,
            SpawnError::NameTooLong => -7,
            SpawnError::ArgsTooLong => -8,
        }
    }

    /// Configuration-time mistakes that abort the whole run.
    pub fn fatal(&self) -> Option<FatalError> {
        match self {
            SpawnError::NameTooLong => Some(FatalError::NameTooLong),
            SpawnError::ArgsTooLong => Some(FatalError::ArgsTooLong),
            _ => None,
        }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpawnError::NullName => write!(f, "Name value is empty"),
            SpawnError::EnqueueFailed => write!(f, "Could not add process to its ready queue"),
            SpawnError::StackTooSmall => write!(f, "Stack size is too small"),
            SpawnError::InvalidPriority => write!(f, "Invalid priority"),
            SpawnError::TableFull => write!(f, "Process table is full"),
            SpawnError::NameTooLong => write!(f, "Process name is too long"),
            SpawnError::ArgsTooLong => write!(f, "Process arguments are too long"),
        }
    }
}

/// Recoverable wait failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The caller has no children, live or exited.
    NoChildren,
    /// Wait was called while no process is running.
    NoCurrentProcess,
}

impl WaitError {
    pub fn code(&self) -> i32 {
        match self {
            WaitError::NoChildren => -1,
            WaitError::NoCurrentProcess => -3,
        }
    }
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WaitError::NoChildren => write!(f, "Process has no children"),
            WaitError::NoCurrentProcess => write!(f, "No current process"),
        }
    }
}

/// Ready queue push failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    Full,
    PriorityMismatch,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "the queue is full"),
            QueueError::PriorityMismatch => write!(f, "process and queue priorities do not match"),
        }
    }
}

/// Invariant violations that stop the whole system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    NameTooLong,
    ArgsTooLong,
    /// A process tried to exit while it still had children.
    ExitWithChildren(ProcessId),
    /// The dispatcher found nothing to run.
    NoRunnableProcess,
    /// A preempted process could not be put back on its ready queue.
    RequeueFailed(ProcessId),
    /// The running record has no execution context to resume.
    MissingContext(ProcessId),
    /// A process-only operation was invoked with nothing running.
    NotInProcess,
    /// One of the two bootstrap processes could not be spawned.
    BootstrapSpawn(SpawnError),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FatalError::NameTooLong => write!(f, "process name is too long"),
            FatalError::ArgsTooLong => write!(f, "process arguments are too long"),
            FatalError::ExitWithChildren(pid) => {
                write!(f, "process {} exited with active children", pid)
            }
            FatalError::NoRunnableProcess => write!(f, "no process available to run"),
            FatalError::RequeueFailed(pid) => {
                write!(f, "could not requeue preempted process {}", pid)
            }
            FatalError::MissingContext(pid) => {
                write!(f, "process {} has no execution context", pid)
            }
            FatalError::NotInProcess => write!(f, "operation requires a running process"),
            FatalError::BootstrapSpawn(err) => {
                write!(f, "bootstrap spawn failed ({}): {}", err.code(), err)
            }
        }
    }
}

/// Why the kernel stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Every process finished and nothing is left to run.
    Completed,
    /// Ready work remains but nothing can make progress.
    Deadlock,
    Fatal(FatalError),
}

impl Halt {
    /// Status handed to the platform's `halt` hook.
    pub fn exit_status(&self) -> i32 {
        match self {
            Halt::Completed => 0,
            Halt::Deadlock | Halt::Fatal(_) => 1,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Halt::Completed => write!(f, "All processes completed."),
            Halt::Deadlock => write!(f, "Deadlock detected, stopping."),
            Halt::Fatal(err) => write!(f, "Fatal: {}", err),
        }
    }
}
