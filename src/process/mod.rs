// Process management: records, queues, table, dispatcher and lifecycle
pub mod context;
pub mod lifecycle;
pub mod pcb;
pub mod queue;
pub mod scheduler;
pub mod table;

pub use context::{switch_context, Continuation, ExecutionContext};
pub use lifecycle::{KernelState, Resume, SchedulerStats, WaitStep};
pub use pcb::{
    EntryPoint, Priority, ProcessControlBlock, ProcessId, ProcessInfo, ProcessState,
    ProcessTableDump, Slot,
};
pub use queue::ReadyQueue;
pub use scheduler::{Dispatch, Dispatcher};
pub use table::ProcessTable;
