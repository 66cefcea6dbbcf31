// Execution contexts for cooperatively scheduled processes
//
// A process's saved context is its launch trampoline future. Switching to a
// process means polling that future until the process suspends again.
use core::convert::Infallible;
use core::fmt;
use core::future::Future;
use core::task::{Context, Poll};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::task::noop_waker_ref;

/// The suspended remainder of a process. It never completes: the trampoline
/// ends in `exit`, which never returns.
pub type Continuation = BoxFuture<'static, Infallible>;

/// Saved execution state of one process
pub struct ExecutionContext {
    stack_size: usize,
    continuation: Option<Continuation>,
}

impl ExecutionContext {
    /// Context with no code attached yet.
    pub fn empty(stack_size: usize) -> Self {
        Self {
            stack_size,
            continuation: None,
        }
    }

    /// Prepare a fresh, not yet running context around `trampoline`.
    ///
    /// The trampoline is lazy: nothing in it runs before the first switch.
    pub fn initialize<F>(trampoline: F, stack_size: usize) -> Self
    where
        F: Future<Output = Infallible> + Send + 'static,
    {
        Self {
            stack_size,
            continuation: Some(trampoline.boxed()),
        }
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn is_initialized(&self) -> bool {
        self.continuation.is_some()
    }

    /// Detach the continuation so it can be resumed without holding the
    /// scheduler lock.
    pub fn take(&mut self) -> Option<Continuation> {
        self.continuation.take()
    }

    /// Park a continuation that suspended.
    pub fn restore(&mut self, continuation: Continuation) {
        self.continuation = Some(continuation);
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("stack_size", &self.stack_size)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Transfer control to `continuation` until it suspends.
///
/// Always returns `Poll::Pending` in practice; the output type is uninhabited.
pub fn switch_context(continuation: &mut Continuation) -> Poll<Infallible> {
    let mut cx = Context::from_waker(noop_waker_ref());
    continuation.as_mut().poll(&mut cx)
}
