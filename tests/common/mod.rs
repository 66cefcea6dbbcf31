// Shared helpers for the integration tests
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use spin::Mutex;
use threads_kernel::{Halt, Kernel, KernelConfig, Platform};

/// Ordered record of what processes did, shared between them.
#[derive(Clone)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Platform that reports pending I/O for the first `pending` polls and
/// remembers the halt status.
pub struct TestPlatform {
    pub pending: usize,
    pub polls: Arc<AtomicUsize>,
    pub halts: Arc<AtomicUsize>,
    pub status: Arc<AtomicI32>,
}

impl TestPlatform {
    pub fn new(pending: usize) -> Self {
        Self {
            pending,
            polls: Arc::new(AtomicUsize::new(0)),
            halts: Arc::new(AtomicUsize::new(0)),
            status: Arc::new(AtomicI32::new(-1)),
        }
    }
}

impl Platform for TestPlatform {
    fn check_io(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst) < self.pending
    }

    fn halt(&self, status: i32) {
        self.halts.fetch_add(1, Ordering::SeqCst);
        self.status.store(status, Ordering::SeqCst);
    }
}

/// Boot a hosted kernel with `startup` and return a handle for inspection
/// together with the halt reason.
pub fn boot<F, Fut>(config: KernelConfig, startup: F) -> (Kernel, Halt)
where
    F: FnOnce(Kernel, String) -> Fut + Send + 'static,
    Fut: Future<Output = i32> + Send + 'static,
{
    let kernel = Kernel::hosted(config);
    let halt = kernel.clone().bootstrap(startup);
    (kernel, halt)
}

/// Same as `boot`, on a caller-supplied platform.
pub fn boot_on<P, F, Fut>(config: KernelConfig, platform: P, startup: F) -> (Kernel, Halt)
where
    P: Platform + 'static,
    F: FnOnce(Kernel, String) -> Fut + Send + 'static,
    Fut: Future<Output = i32> + Send + 'static,
{
    let kernel = Kernel::new(config, platform);
    let halt = kernel.clone().bootstrap(startup);
    (kernel, halt)
}

pub fn config() -> KernelConfig {
    KernelConfig::default().with_max_processes(16)
}
