//! Deterministic collaborators for tests, the scenario harness and the
//! simulator.
//!
//! Every mock is a cheap clone over shared state, so a test can hand one
//! clone to the agent and keep another for assertions.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;

use crate::clock::{Monotonic, WallClock};
use crate::error::{StoreError, TimerError, WeatherError};
use crate::led::StatusLed;
use crate::store::KeyValueStore;
use crate::timer::{PeriodicTimer, TimerCallback, TimerService};
use crate::weather::{WeatherReport, WeatherSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct StoreState {
    live: BTreeMap<String, String>,
    committed: BTreeMap<String, String>,
    commits: usize,
    fail_writes: bool,
}

/// In-memory key-value store. Writes become durable on `commit()`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a committed entry.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        {
            let mut state = lock(&self.state);
            state.live.insert(key.to_owned(), value.to_owned());
            state.committed.insert(key.to_owned(), value.to_owned());
        }
        self
    }

    /// Make every write fail, as a full NVS partition would.
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Current value, committed or not.
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.state).live.get(key).cloned()
    }

    /// Value that would survive a power cycle.
    pub fn committed_value(&self, key: &str) -> Option<String> {
        lock(&self.state).committed.get(key).cloned()
    }

    pub fn commit_count(&self) -> usize {
        lock(&self.state).commits
    }

    /// Drop uncommitted writes, as a reboot would.
    pub fn power_cycle(&self) {
        let mut state = lock(&self.state);
        state.live = state.committed.clone();
    }
}

impl KeyValueStore for MemoryStore {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.state).live.contains_key(key))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.value(key))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(StoreError::Write {
                key: key.to_owned(),
                reason: "write failure injected".to_owned(),
            });
        }
        state.live.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn erase(&mut self, key: &str) -> Result<(), StoreError> {
        lock(&self.state).live.remove(key);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.committed = state.live.clone();
        state.commits += 1;
        Ok(())
    }
}

struct TimerSlot {
    name: &'static str,
    callback: TimerCallback,
    period: Option<Duration>,
    starts: usize,
    cancels: usize,
}

/// Timer service whose timers only fire when a test says so.
#[derive(Clone, Default)]
pub struct ManualTimers {
    slots: Arc<Mutex<Vec<Arc<Mutex<TimerSlot>>>>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Option<Arc<Mutex<TimerSlot>>> {
        lock(&self.slots)
            .iter()
            .rev()
            .find(|slot| lock(slot).name == name)
            .cloned()
    }

    /// Run the callback of the named timer if it is active.
    pub fn fire(&self, name: &str) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };
        let mut slot = lock(&slot);
        if slot.period.is_none() {
            return false;
        }
        (slot.callback)();
        true
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.period(name).is_some()
    }

    pub fn period(&self, name: &str) -> Option<Duration> {
        self.slot(name).and_then(|slot| lock(&slot).period)
    }

    pub fn start_count(&self, name: &str) -> usize {
        self.slot(name).map_or(0, |slot| lock(&slot).starts)
    }

    pub fn cancel_count(&self, name: &str) -> usize {
        self.slot(name).map_or(0, |slot| lock(&slot).cancels)
    }
}

struct ManualTimer {
    slot: Arc<Mutex<TimerSlot>>,
}

impl PeriodicTimer for ManualTimer {
    fn start(&mut self, period: Duration) -> Result<(), TimerError> {
        let mut slot = lock(&self.slot);
        slot.period = Some(period);
        slot.starts += 1;
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), TimerError> {
        let mut slot = lock(&self.slot);
        slot.period = None;
        slot.cancels += 1;
        Ok(())
    }

    fn is_active(&self) -> bool {
        lock(&self.slot).period.is_some()
    }
}

impl TimerService for ManualTimers {
    fn periodic(
        &mut self,
        name: &'static str,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, TimerError> {
        let slot = Arc::new(Mutex::new(TimerSlot {
            name,
            callback,
            period: None,
            starts: 0,
            cancels: 0,
        }));
        lock(&self.slots).push(slot.clone());
        Ok(Box::new(ManualTimer { slot }))
    }
}

/// Weather source that replays queued responses.
#[derive(Clone, Default)]
pub struct ScriptedWeather {
    responses: Arc<Mutex<VecDeque<Result<WeatherReport, WeatherError>>>>,
    polls: Arc<AtomicU32>,
}

impl ScriptedWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<WeatherReport, WeatherError>) {
        lock(&self.responses).push_back(response);
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for ScriptedWeather {
    fn poll(&mut self) -> Result<WeatherReport, WeatherError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        lock(&self.responses)
            .pop_front()
            .unwrap_or(Err(WeatherError::NotConfigured))
    }
}

/// LED that records every `set()`.
#[derive(Clone, Default)]
pub struct RecordingLed {
    history: Arc<Mutex<Vec<bool>>>,
}

impl RecordingLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<bool> {
        lock(&self.history).clone()
    }

    pub fn is_on(&self) -> bool {
        lock(&self.history).last().copied().unwrap_or(false)
    }

    /// Number of on/off changes, starting from off.
    pub fn toggles(&self) -> usize {
        let mut state = false;
        let mut toggles = 0;
        for on in lock(&self.history).iter() {
            if *on != state {
                toggles += 1;
                state = *on;
            }
        }
        toggles
    }
}

impl StatusLed for RecordingLed {
    fn set(&mut self, on: bool) {
        lock(&self.history).push(on);
    }
}

/// Millisecond counter advanced by hand.
#[derive(Debug, Default)]
pub struct ManualMonotonic {
    now_ms: AtomicU32,
}

impl ManualMonotonic {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now_ms: AtomicU32::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u32) {
        // fetch_add wraps on overflow.
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u32) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Monotonic for ManualMonotonic {
    fn now_ms(&self) -> u32 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Wall clock frozen at a settable time.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: Mutex<Option<NaiveDateTime>>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(Some(now)),
        }
    }

    /// A clock that has never synchronised.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn set(&self, now: NaiveDateTime) {
        *lock(&self.now) = Some(now);
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> Option<NaiveDateTime> {
        *lock(&self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_commit_makes_writes_durable() {
        let mut store = MemoryStore::new();
        store.set_string("k", "v").unwrap();
        assert_eq!(store.value("k").as_deref(), Some("v"));
        assert_eq!(store.committed_value("k"), None);
        store.power_cycle();
        assert_eq!(store.value("k"), None);

        store.set_string("k", "v").unwrap();
        store.commit().unwrap();
        store.power_cycle();
        assert_eq!(store.get_string("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn injected_write_failure_surfaces() {
        let mut store = MemoryStore::new();
        store.fail_writes(true);
        assert!(matches!(
            store.set_string("k", "v"),
            Err(StoreError::Write { .. })
        ));
    }

    #[test]
    fn manual_timer_fires_only_while_active() {
        let mut timers = ManualTimers::new();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let mut timer = timers
            .periodic(
                "t",
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert!(!timers.fire("t"));
        timer.start(Duration::from_millis(500)).unwrap();
        assert!(timers.fire("t"));
        timer.cancel().unwrap();
        assert!(!timers.fire("t"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(timers.start_count("t"), 1);
        assert_eq!(timers.cancel_count("t"), 1);
    }

    #[test]
    fn led_toggle_count_ignores_repeats() {
        let mut led = RecordingLed::new();
        led.set(false);
        led.set(true);
        led.set(true);
        led.set(false);
        assert_eq!(led.toggles(), 2);
        assert!(!led.is_on());
    }
}
