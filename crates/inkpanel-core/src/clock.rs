//! Time sources.

use chrono::NaiveDateTime;

/// Millisecond tick counter. Wraps; callers use wrapping arithmetic.
///
/// Implementations must be callable from interrupt context.
pub trait Monotonic: Send + Sync {
    fn now_ms(&self) -> u32;
}

/// Local wall-clock time for the clock screen. `None` until the time source
/// has synchronised.
pub trait WallClock: Send + Sync {
    fn now(&self) -> Option<NaiveDateTime>;
}
