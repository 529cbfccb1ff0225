//! Per-pin switch debounce and press classification.
//!
//! A [`Debouncer`] sees every raw edge of one switch. The arming edge records
//! a timestamp; the releasing edge classifies the held duration and notifies
//! the press observer. Runs in interrupt context.

use core::cell::Cell;
use std::sync::Arc;

use critical_section::Mutex;
use heapless::Vec as FixedVec;

use crate::button::{ButtonMap, BUTTON_COUNT};
use crate::clock::Monotonic;
use crate::config::DebounceTiming;
use crate::edge::{Edge, EdgeDemultiplexer, EdgeObserver};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Short,
    Long,
}

/// Switch wiring. Active-low switches pull the pin to ground when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    fn arming_edge(self) -> Edge {
        match self {
            Self::ActiveLow => Edge::Falling,
            Self::ActiveHigh => Edge::Rising,
        }
    }
}

/// Receiver of classified presses. Called in interrupt context.
pub trait PressObserver: Send + Sync {
    fn on_short_press(&self, pin: u8);
    fn on_long_press(&self, pin: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchState {
    Idle,
    Armed { since_ms: u32 },
}

pub struct Debouncer {
    pin: u8,
    polarity: Polarity,
    timing: DebounceTiming,
    clock: Arc<dyn Monotonic>,
    observer: Arc<dyn PressObserver>,
    state: Mutex<Cell<SwitchState>>,
}

impl Debouncer {
    pub fn new(
        pin: u8,
        polarity: Polarity,
        timing: DebounceTiming,
        clock: Arc<dyn Monotonic>,
        observer: Arc<dyn PressObserver>,
    ) -> Self {
        Self {
            pin,
            polarity,
            timing,
            clock,
            observer,
            state: Mutex::new(Cell::new(SwitchState::Idle)),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| {
            matches!(self.state.borrow(cs).get(), SwitchState::Armed { .. })
        })
    }

    /// Classify a held duration. `None` for bounce and stuck contacts.
    pub fn classify(timing: &DebounceTiming, held_ms: u32) -> Option<PressKind> {
        if held_ms < timing.short_min_ms || held_ms >= timing.max_valid_ms {
            None
        } else if held_ms < timing.long_min_ms {
            Some(PressKind::Short)
        } else {
            Some(PressKind::Long)
        }
    }

    fn handle(&self, edge: Edge) -> Option<PressKind> {
        let now = self.clock.now_ms();
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);
            if edge == self.polarity.arming_edge() {
                // A repeated arming edge re-arms with the newer timestamp.
                state.set(SwitchState::Armed { since_ms: now });
                return None;
            }
            match state.replace(SwitchState::Idle) {
                SwitchState::Idle => None,
                SwitchState::Armed { since_ms } => {
                    Self::classify(&self.timing, now.wrapping_sub(since_ms))
                }
            }
        })
    }
}

impl EdgeObserver for Debouncer {
    fn on_edge(&self, pin: u8, edge: Edge) {
        if pin != self.pin {
            return;
        }
        match self.handle(edge) {
            Some(PressKind::Short) => self.observer.on_short_press(self.pin),
            Some(PressKind::Long) => self.observer.on_long_press(self.pin),
            None => {}
        }
    }
}

/// The debouncers for every bound button, owned as a fixed set.
pub struct SwitchBank {
    switches: FixedVec<Arc<Debouncer>, BUTTON_COUNT>,
}

impl SwitchBank {
    pub fn new(
        buttons: &ButtonMap,
        polarity: Polarity,
        timing: DebounceTiming,
        clock: Arc<dyn Monotonic>,
        observer: Arc<dyn PressObserver>,
    ) -> Self {
        let mut switches = FixedVec::new();
        for (_, pin) in buttons.iter() {
            let debouncer = Debouncer::new(pin, polarity, timing, clock.clone(), observer.clone());
            // ButtonMap holds at most BUTTON_COUNT pins.
            let _ = switches.push(Arc::new(debouncer));
        }
        Self { switches }
    }

    /// Register every debouncer with `demux`.
    pub fn register(&self, demux: &EdgeDemultiplexer) -> Result<(), ConfigError> {
        for switch in &self.switches {
            demux.register(switch.pin(), switch.clone())?;
        }
        log::info!("Registered {} switch debouncers", self.switches.len());
        Ok(())
    }

    pub fn pins(&self) -> impl Iterator<Item = u8> + '_ {
        self.switches.iter().map(|switch| switch.pin())
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}
