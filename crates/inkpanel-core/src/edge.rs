//! Pin-level interrupt fan-out.
//!
//! The GPIO ISR calls [`EdgeDemultiplexer::on_edge`] on the process-wide
//! instance, which forwards to the observer registered for that pin. This is
//! the only code that runs in interrupt context: no allocation, no logging,
//! no blocking. The table is a const-initialised static so there is no init
//! race between the first interrupt and registration.

use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;

use crate::error::ConfigError;

/// ESP32-S3 exposes GPIO0..=GPIO48.
pub const MAX_PINS: usize = 49;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// Edge that produced `level` (true = high).
    pub fn from_level(level: bool) -> Self {
        if level {
            Self::Rising
        } else {
            Self::Falling
        }
    }
}

/// Receiver of raw edges for one pin. Called in interrupt context.
pub trait EdgeObserver: Send + Sync {
    fn on_edge(&self, pin: u8, edge: Edge);
}

type Slot = Option<Arc<dyn EdgeObserver>>;

const EMPTY_SLOT: Slot = None;

pub struct EdgeDemultiplexer {
    slots: Mutex<RefCell<[Slot; MAX_PINS]>>,
}

static GLOBAL: EdgeDemultiplexer = EdgeDemultiplexer::new();

impl EdgeDemultiplexer {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([EMPTY_SLOT; MAX_PINS])),
        }
    }

    /// The instance the GPIO ISR forwards into.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Route edges on `pin` to `observer`. The last registration wins.
    pub fn register(&self, pin: u8, observer: Arc<dyn EdgeObserver>) -> Result<(), ConfigError> {
        let index = pin as usize;
        if index >= MAX_PINS {
            return Err(ConfigError::PinOutOfRange(pin));
        }
        let previous = critical_section::with(|cs| {
            self.slots.borrow(cs).borrow_mut()[index].replace(observer)
        });
        if previous.is_some() {
            log::info!("Edge observer for pin {} replaced", pin);
        }
        Ok(())
    }

    pub fn unregister(&self, pin: u8) {
        let index = pin as usize;
        if index < MAX_PINS {
            // Dropped outside the critical section.
            let _previous =
                critical_section::with(|cs| self.slots.borrow(cs).borrow_mut()[index].take());
        }
    }

    pub fn is_registered(&self, pin: u8) -> bool {
        let index = pin as usize;
        index < MAX_PINS
            && critical_section::with(|cs| self.slots.borrow(cs).borrow()[index].is_some())
    }

    /// ISR entry point. Unknown pins are ignored.
    pub fn on_edge(&self, pin: u8, edge: Edge) {
        let index = pin as usize;
        if index >= MAX_PINS {
            return;
        }
        critical_section::with(|cs| {
            if let Some(observer) = self.slots.borrow(cs).borrow()[index].as_ref() {
                observer.on_edge(pin, edge);
            }
        });
    }
}

impl Default for EdgeDemultiplexer {
    fn default() -> Self {
        Self::new()
    }
}
