//! Compile-time constants and the immutable runtime configuration.

use core::time::Duration;

use crate::button::ButtonMap;

/// Panel dimensions (landscape, 2.9" UC8151 class panel).
pub const DISPLAY_WIDTH: u32 = 296;
pub const DISPLAY_HEIGHT: u32 = 128;

/// Command queue depth.
pub const QUEUE_DEPTH: usize = 5;

/// Inbox size in bytes, framing included.
pub const INBOX_BYTES: usize = 2048;

pub const BLINK_PERIOD: Duration = Duration::from_millis(500);
pub const CLOCK_PERIOD: Duration = Duration::from_secs(60);

/// Clock ticks between weather polls.
pub const WEATHER_POLL_TICKS: u32 = 10;

/// Clock ticks the clock screen stays away after content was shown.
pub const CLOCK_GRACE_TICKS: u32 = 2;

pub const NEW_CONTENT_BLINKS: u32 = 10;
pub const BOOT_BLINKS: u32 = 5;

/// Sleep applied by the agent loop when an iteration found no work.
pub const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// NVS key holding the last accepted reminders/calendar payload.
pub const PERSIST_KEY: &str = "jsons";

pub const CONFIRMATION_TEXT: &str =
    "New events and reminders. Press A to see reminders and B to see events";

/// Press duration thresholds in milliseconds.
///
/// `d < short_min_ms` is bounce, `d >= max_valid_ms` is a stuck contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceTiming {
    pub short_min_ms: u32,
    pub long_min_ms: u32,
    pub max_valid_ms: u32,
}

impl DebounceTiming {
    pub const SHORT_MIN_MS: u32 = 50;
    pub const LONG_MIN_MS: u32 = 1000;
    pub const MAX_VALID_MS: u32 = 5000;
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self {
            short_min_ms: Self::SHORT_MIN_MS,
            long_min_ms: Self::LONG_MIN_MS,
            max_valid_ms: Self::MAX_VALID_MS,
        }
    }
}

/// Lookup tables and timing for one panel, built once at startup.
#[derive(Clone, Debug)]
pub struct PanelConfig {
    pub buttons: ButtonMap,
    pub debounce: DebounceTiming,
    pub blink_period: Duration,
    pub clock_period: Duration,
    pub weather_poll_ticks: u32,
    pub clock_grace_ticks: u32,
    pub new_content_blinks: u32,
    pub boot_blinks: u32,
}

impl PanelConfig {
    pub fn new(buttons: ButtonMap) -> Self {
        Self {
            buttons,
            debounce: DebounceTiming::default(),
            blink_period: BLINK_PERIOD,
            clock_period: CLOCK_PERIOD,
            weather_poll_ticks: WEATHER_POLL_TICKS,
            clock_grace_ticks: CLOCK_GRACE_TICKS,
            new_content_blinks: NEW_CONTENT_BLINKS,
            boot_blinks: BOOT_BLINKS,
        }
    }

    pub fn debounce(mut self, timing: DebounceTiming) -> Self {
        self.debounce = timing;
        self
    }

    pub fn weather_poll_ticks(mut self, ticks: u32) -> Self {
        self.weather_poll_ticks = ticks.max(1);
        self
    }

    pub fn clock_grace_ticks(mut self, ticks: u32) -> Self {
        self.clock_grace_ticks = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_is_ordered() {
        let t = DebounceTiming::default();
        assert!(t.short_min_ms < t.long_min_ms);
        assert!(t.long_min_ms < t.max_valid_ms);
    }

    #[test]
    fn weather_cadence_never_zero() {
        let config = PanelConfig::new(ButtonMap::empty()).weather_poll_ticks(0);
        assert_eq!(config.weather_poll_ticks, 1);
    }
}
