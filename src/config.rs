// Kernel configuration: fixed limits and runtime knobs

/// Priority of the watchdog; no process may be scheduled below it.
pub const LOWEST_PRIORITY: i32 = 0;

/// Priority of the startup process.
pub const HIGHEST_PRIORITY: i32 = 5;

/// Number of ready queues, one per priority level.
pub const NUM_PRIORITIES: usize = (HIGHEST_PRIORITY - LOWEST_PRIORITY + 1) as usize;

/// Process names must be strictly shorter than `MAX_NAME - 1` bytes.
pub const MAX_NAME: usize = 32;

/// Start arguments must be strictly shorter than `MAX_ARG` bytes.
pub const MAX_ARG: usize = 256;

/// Default process table capacity.
pub const DEFAULT_MAX_PROCESSES: usize = 50;

/// Smallest stack a process may request.
pub const MIN_STACK_SIZE: usize = 8192;

/// Runtime kernel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Capacity of the process table (and of each ready queue).
    pub max_processes: usize,
    /// Minimum stack size accepted by spawn.
    pub min_stack_size: usize,
    /// Emit per-operation diagnostics through `log::debug!`.
    pub debug: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            min_stack_size: MIN_STACK_SIZE,
            debug: false,
        }
    }
}

impl KernelConfig {
    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes;
        self
    }

    pub fn with_min_stack_size(mut self, min_stack_size: usize) -> Self {
        self.min_stack_size = min_stack_size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Queue index for a priority already validated to lie in range.
    pub(crate) fn queue_index(priority: i32) -> usize {
        (priority - LOWEST_PRIORITY) as usize
    }
}
