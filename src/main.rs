// Hosted demo: boots the kernel and runs a small process tree
use std::str::FromStr;

use log::{info, Level, LevelFilter, Log, Metadata, Record};
use threads_kernel::{Kernel, KernelConfig, ProcessTableDump, MIN_STACK_SIZE};

macro_rules! color_fmt {
    ($color_code:expr, $($arg:tt)*) => {
        format_args!("\u{1B}[{}m{}\u{1B}[m", $color_code as u8, format_args!($($arg)*))
    };
}

#[repr(u8)]
enum AnsiColor {
    Red = 31,
    Green = 32,
    Yellow = 33,
    Cyan = 36,
    BrightBlack = 90,
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => AnsiColor::Red,
            Level::Warn => AnsiColor::Yellow,
            Level::Info => AnsiColor::Green,
            Level::Debug => AnsiColor::Cyan,
            Level::Trace => AnsiColor::BrightBlack,
        };
        println!(
            "{}",
            color_fmt!(
                color,
                "[{:>5} {}:{}] {}",
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                record.args()
            )
        );
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console logger. The level comes from `KERNEL_LOG`, default `info`.
fn init_logger() -> LevelFilter {
    let level = std::env::var("KERNEL_LOG")
        .ok()
        .and_then(|s| LevelFilter::from_str(&s).ok())
        .unwrap_or(LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
    level
}

async fn child(kernel: Kernel, arg: String) -> i32 {
    info!("child {:?}: running with argument {:?}", kernel.getpid(), arg);
    7
}

async fn parent(kernel: Kernel, arg: String) -> i32 {
    info!("parent {:?}: started with argument {:?}", kernel.getpid(), arg);

    // higher priority: runs to completion before spawn returns
    let pid = match kernel.spawn("child", child, Some("hello"), MIN_STACK_SIZE, 5).await {
        Ok(pid) => pid,
        Err(err) => return err.code(),
    };
    info!("parent: spawned child {}", pid);

    match kernel.wait().await {
        Ok((pid, code)) => {
            info!("parent: child {} quit with status {}", pid, code);
            0
        }
        Err(err) => err.code(),
    }
}

async fn startup(kernel: Kernel, _arg: String) -> i32 {
    if let Err(err) = kernel.spawn("parent", parent, Some("demo"), MIN_STACK_SIZE, 3).await {
        return err.code();
    }
    println!("{}", ProcessTableDump(&kernel.process_table()));

    let status = match kernel.wait().await {
        Ok((_, code)) => code,
        Err(err) => err.code(),
    };
    let stats = kernel.stats();
    info!(
        "startup: {} spawned, {} reaped, {} context switches",
        stats.spawned, stats.reaped, stats.context_switches
    );
    status
}

fn main() {
    let level = init_logger();
    let config = KernelConfig::default().with_debug(level >= LevelFilter::Debug);

    let halt = Kernel::hosted(config).bootstrap(startup);
    println!("{}", halt);
    std::process::exit(halt.exit_status());
}
