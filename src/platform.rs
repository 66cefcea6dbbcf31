// Hooks the scheduler core needs from the surrounding system

/// Services provided by the environment the kernel runs in.
///
/// Console output goes through the `log` facade instead of this trait.
pub trait Platform: Send + Sync {
    /// Whether outstanding I/O could still make a blocked process ready.
    fn check_io(&self) -> bool;

    /// Called exactly once when the kernel stops, with 0 for a clean run.
    fn halt(&self, _status: i32) {}
}

/// Hosted platform with no devices: I/O is never pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn check_io(&self) -> bool {
        false
    }
}
