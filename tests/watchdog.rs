mod common;

use std::sync::atomic::Ordering;

use common::{boot, boot_on, config, TestPlatform, Trace};
use threads_kernel::{FatalError, Halt, ProcessState, SpawnError, LOWEST_PRIORITY, MIN_STACK_SIZE};

#[test]
fn clean_run_completes() {
    let platform = TestPlatform::new(0);
    let (polls, halts, status) = (platform.polls.clone(), platform.halts.clone(), platform.status.clone());

    let (_, halt) = boot_on(config(), platform, |_, _| async { 0 });

    assert_eq!(halt, Halt::Completed);
    assert_eq!(halt.to_string(), "All processes completed.");
    assert_eq!(polls.load(Ordering::SeqCst), 1);
    assert_eq!(halts.load(Ordering::SeqCst), 1);
    assert_eq!(status.load(Ordering::SeqCst), 0);
}

#[test]
fn stranded_lowest_priority_work_is_deadlock() {
    let trace = Trace::new();
    let t = trace.clone();
    let platform = TestPlatform::new(0);
    let status = platform.status.clone();

    let (_, halt) = boot_on(config(), platform, move |k, _| async move {
        let t1 = t.clone();
        k.spawn(
            "stuck",
            move |k, _| async move {
                for name in ["c1", "c2"] {
                    let t = t1.clone();
                    k.spawn(
                        name,
                        move |_, _| async move {
                            t.push(name);
                            0
                        },
                        None,
                        MIN_STACK_SIZE,
                        LOWEST_PRIORITY,
                    )
                    .await
                    .unwrap();
                }
                k.wait().await.unwrap();
                k.wait().await.unwrap();
                0
            },
            None,
            MIN_STACK_SIZE,
            2,
        )
        .await
        .unwrap();
        k.wait().await.unwrap();
        0
    });

    assert_eq!(halt, Halt::Deadlock);
    assert_eq!(status.load(Ordering::SeqCst), 1);
    // the watchdog is ahead of both children on the lowest queue
    assert!(trace.events().is_empty());
}

#[test]
fn single_stranded_lowest_entry_is_deadlock() {
    let trace = Trace::new();
    let t = trace.clone();
    let (kernel, halt) = boot(config(), move |k, _| async move {
        k.spawn(
            "parent",
            move |k, _| async move {
                k.spawn(
                    "pending",
                    move |_, _| async move {
                        t.push("pending");
                        0
                    },
                    None,
                    MIN_STACK_SIZE,
                    LOWEST_PRIORITY,
                )
                .await
                .unwrap();
                k.wait().await.unwrap();
                0
            },
            None,
            MIN_STACK_SIZE,
            2,
        )
        .await
        .unwrap();
        k.wait().await.unwrap();
        0
    });

    assert_eq!(halt, Halt::Deadlock);
    assert!(trace.events().is_empty());

    let table = kernel.process_table();
    let pending = table.iter().find(|p| p.name == "pending").unwrap();
    assert_eq!(pending.state, ProcessState::Ready);
    let blocked = table.iter().filter(|p| p.state == ProcessState::Blocked).count();
    assert_eq!(blocked, 2);
    assert_eq!(kernel.stats().ready, [1, 0, 0, 0, 0, 0]);
}

#[test]
fn pending_io_keeps_the_system_alive() {
    let platform = TestPlatform::new(3);
    let polls = platform.polls.clone();

    let (kernel, halt) = boot_on(config(), platform, |_, _| async { 0 });

    assert_eq!(halt, Halt::Completed);
    assert_eq!(polls.load(Ordering::SeqCst), 4);
    // the watchdog kept the processor between polls
    assert_eq!(kernel.stats().context_switches, 2);
}

#[test]
fn pending_io_lets_lowest_priority_work_run() {
    let trace = Trace::new();
    let t = trace.clone();
    let platform = TestPlatform::new(1);

    let (_, halt) = boot_on(config(), platform, move |k, _| async move {
        let t1 = t.clone();
        k.spawn(
            "parent",
            move |k, _| async move {
                let t2 = t1.clone();
                k.spawn(
                    "background",
                    move |_, _| async move {
                        t2.push("background");
                        0
                    },
                    None,
                    MIN_STACK_SIZE,
                    LOWEST_PRIORITY,
                )
                .await
                .unwrap();
                k.wait().await.unwrap();
                t1.push("parent");
                0
            },
            None,
            MIN_STACK_SIZE,
            2,
        )
        .await
        .unwrap();
        k.wait().await.unwrap();
        0
    });

    assert_eq!(halt, Halt::Completed);
    assert_eq!(trace.events(), vec!["background", "parent"]);
}

#[test]
fn bootstrap_needs_two_slots() {
    let platform = TestPlatform::new(0);
    let (halts, status) = (platform.halts.clone(), platform.status.clone());
    let trace = Trace::new();
    let t = trace.clone();

    let (_, halt) = boot_on(config().with_max_processes(1), platform, move |_, _| async move {
        t.push("startup");
        0
    });

    assert_eq!(halt, Halt::Fatal(FatalError::BootstrapSpawn(SpawnError::TableFull)));
    assert_eq!(halts.load(Ordering::SeqCst), 1);
    assert_eq!(status.load(Ordering::SeqCst), 1);
    assert!(trace.events().is_empty());
}

#[test]
fn configured_minimum_stack_applies_to_spawn() {
    let (_, halt) = boot(
        config().with_min_stack_size(2 * MIN_STACK_SIZE),
        |k, _| async move {
            let err = k
                .spawn("small", |_, _| async { 0 }, None, MIN_STACK_SIZE, 1)
                .await
                .unwrap_err();
            err.code()
        },
    );
    // the startup process exits with -4 but the run itself completes
    assert_eq!(halt, Halt::Completed);
}
