//! Collaborators backed by the host OS, used by the desktop simulator.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};

use crate::actor::{self, ActorHandle, ActorSpec};
use crate::clock::{Monotonic, WallClock};
use crate::error::TimerError;
use crate::timer::{PeriodicTimer, TimerCallback, TimerService};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Entry {
    id: u64,
    name: &'static str,
    // `None` while stopped.
    schedule: Option<(Duration, Instant)>,
    callback: Arc<Mutex<TimerCallback>>,
}

#[derive(Default)]
struct Shared {
    entries: Mutex<Vec<Entry>>,
    wake: Condvar,
    next_id: AtomicU64,
}

impl Shared {
    /// Wait for the earliest deadline and run every due callback.
    fn run_once(&self) {
        let mut due = Vec::new();
        {
            let mut entries = lock(&self.entries);
            let now = Instant::now();
            let next = entries
                .iter()
                .filter_map(|entry| entry.schedule.map(|(_, at)| at))
                .min();
            match next {
                None => {
                    let _guard = self
                        .wake
                        .wait(entries)
                        .unwrap_or_else(PoisonError::into_inner);
                    return;
                }
                Some(at) if at > now => {
                    let _guard = self
                        .wake
                        .wait_timeout(entries, at - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    return;
                }
                Some(_) => {}
            }
            for entry in entries.iter_mut() {
                if let Some((period, at)) = entry.schedule {
                    if at <= now {
                        entry.schedule = Some((period, at + period));
                        due.push((entry.name, entry.callback.clone()));
                    }
                }
            }
        }
        // Callbacks run unlocked so they may start or cancel timers.
        for (name, callback) in due {
            log::trace!("Timer {} fired", name);
            let mut callback = lock(&callback);
            (*callback)();
        }
    }
}

/// Periodic timers driven by one service thread, like the ESP timer task.
pub struct ThreadTimerService {
    shared: Arc<Shared>,
    _thread: ActorHandle,
}

impl ThreadTimerService {
    const SPEC: ActorSpec = ActorSpec {
        name: c"timer-svc",
        priority: 10,
        stack_words: 4 * 1024,
        core: None,
    };

    pub fn new() -> Result<Self, TimerError> {
        let shared = Arc::new(Shared::default());
        let worker = shared.clone();
        let thread = actor::spawn(Self::SPEC, move || worker.run_once()).map_err(|err| {
            TimerError::Create {
                name: "timer-svc",
                reason: err.to_string(),
            }
        })?;
        Ok(Self {
            shared,
            _thread: thread,
        })
    }
}

impl TimerService for ThreadTimerService {
    fn periodic(
        &mut self,
        name: &'static str,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, TimerError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.entries).push(Entry {
            id,
            name,
            schedule: None,
            callback: Arc::new(Mutex::new(callback)),
        });
        Ok(Box::new(ThreadTimer {
            shared: self.shared.clone(),
            id,
            active: AtomicBool::new(false),
        }))
    }
}

struct ThreadTimer {
    shared: Arc<Shared>,
    id: u64,
    active: AtomicBool,
}

impl ThreadTimer {
    fn reschedule(&self, schedule: Option<(Duration, Instant)>) {
        let mut entries = lock(&self.shared.entries);
        if let Some(entry) = entries.iter_mut().find(|entry| entry.id == self.id) {
            entry.schedule = schedule;
        }
        self.active.store(schedule.is_some(), Ordering::Relaxed);
        self.shared.wake.notify_all();
    }
}

impl PeriodicTimer for ThreadTimer {
    fn start(&mut self, period: Duration) -> Result<(), TimerError> {
        self.reschedule(Some((period, Instant::now() + period)));
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), TimerError> {
        self.reschedule(None);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        lock(&self.shared.entries).retain(|entry| entry.id != self.id);
        self.shared.wake.notify_all();
    }
}

/// Milliseconds since construction, wrapping at `u32::MAX`.
pub struct StdMonotonic {
    origin: Instant,
}

impl StdMonotonic {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdMonotonic {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for StdMonotonic {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// System time shifted to a fixed UTC offset.
pub struct SystemWallClock {
    offset: FixedOffset,
}

impl SystemWallClock {
    /// Offset in seconds east of UTC. Out-of-range offsets fall back to UTC.
    pub fn new(offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| {
            log::warn!("Invalid UTC offset {}s, using UTC", offset_secs);
            Utc.fix()
        });
        Self { offset }
    }
}

impl WallClock for SystemWallClock {
    fn now(&self) -> Option<NaiveDateTime> {
        Some(Utc::now().with_timezone(&self.offset).naive_local())
    }
}
