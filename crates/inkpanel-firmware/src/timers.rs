//! ESP timer service adapters.

use core::time::Duration;

use esp_idf_svc::sys;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};
use inkpanel_core::{Monotonic, PeriodicTimer, TimerCallback, TimerError, TimerService};

/// Periodic timers whose callbacks run on the ESP timer task.
pub struct EspTimers {
    service: EspTaskTimerService,
}

impl EspTimers {
    pub fn new() -> Result<Self, TimerError> {
        let service = EspTaskTimerService::new().map_err(|err| TimerError::Create {
            name: "esp-timer-service",
            reason: err.to_string(),
        })?;
        Ok(Self { service })
    }
}

impl TimerService for EspTimers {
    fn periodic(
        &mut self,
        name: &'static str,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, TimerError> {
        let timer = self
            .service
            .timer(callback)
            .map_err(|err| TimerError::Create {
                name,
                reason: err.to_string(),
            })?;
        log::debug!("Created timer {}", name);
        Ok(Box::new(EspPeriodic { name, timer }))
    }
}

struct EspPeriodic {
    name: &'static str,
    timer: EspTimer<'static>,
}

impl PeriodicTimer for EspPeriodic {
    fn start(&mut self, period: Duration) -> Result<(), TimerError> {
        // esp_timer refuses to start a running timer.
        if self.is_active() {
            self.cancel()?;
        }
        self.timer.every(period).map_err(|err| TimerError::Start {
            name: self.name,
            reason: err.to_string(),
        })
    }

    fn cancel(&mut self) -> Result<(), TimerError> {
        self.timer
            .cancel()
            .map(|_| ())
            .map_err(|err| TimerError::Cancel {
                name: self.name,
                reason: err.to_string(),
            })
    }

    fn is_active(&self) -> bool {
        self.timer.is_scheduled().unwrap_or(false)
    }
}

/// Milliseconds since boot from the high-resolution timer. Safe in ISRs.
pub struct EspMonotonic;

impl Monotonic for EspMonotonic {
    fn now_ms(&self) -> u32 {
        let micros = unsafe { sys::esp_timer_get_time() };
        (micros / 1_000) as u32
    }
}
