//! Named, prioritised units of concurrent execution.
//!
//! Every long-running subsystem (panel agent, network router) runs as an
//! actor: one thread executing its loop body forever. On ESP-IDF the spawn
//! spec goes through `ThreadSpawnConfiguration` so the FreeRTOS task gets the
//! requested name, priority, stack and core. Pinning cannot be changed after
//! the pthread exists, so it is part of the spec.

use core::ffi::CStr;
use std::thread::{self, JoinHandle};

use crate::error::ActorError;

/// FreeRTOS stack depth is counted in 32-bit words.
const WORD_BYTES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Core {
    Core0,
    Core1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorSpec {
    pub name: &'static CStr,
    pub priority: u8,
    pub stack_words: usize,
    pub core: Option<Core>,
}

impl ActorSpec {
    pub const fn stack_bytes(&self) -> usize {
        self.stack_words * WORD_BYTES
    }

    fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// A concrete actor type. Stack and scheduling are declared per type.
pub trait Actor: Send + 'static {
    const NAME: &'static CStr;
    const PRIORITY: u8;
    const STACK_WORDS: usize;
    const CORE: Option<Core> = None;

    fn spec() -> ActorSpec {
        ActorSpec {
            name: Self::NAME,
            priority: Self::PRIORITY,
            stack_words: Self::STACK_WORDS,
            core: Self::CORE,
        }
    }

    /// One pass of the actor loop.
    fn step(&mut self);
}

/// Handle to a running actor. Dropping it detaches the thread.
#[derive(Debug)]
pub struct ActorHandle {
    spec: ActorSpec,
    thread: JoinHandle<()>,
}

impl ActorHandle {
    pub fn spec(&self) -> &ActorSpec {
        &self.spec
    }

    pub fn thread(&self) -> &thread::Thread {
        self.thread.thread()
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Spawn `body` as an actor. `body` is called repeatedly until the process
/// ends.
pub fn spawn<F>(spec: ActorSpec, mut body: F) -> Result<ActorHandle, ActorError>
where
    F: FnMut() + Send + 'static,
{
    let name = spec.display_name();
    platform::configure(&spec)?;

    let spawned = thread::Builder::new()
        .name(name.clone())
        .stack_size(spec.stack_bytes())
        .spawn(move || loop {
            body();
        });
    platform::reset();

    let thread = spawned.map_err(|err| ActorError::Spawn {
        name: name.clone(),
        reason: err.to_string(),
    })?;

    log::info!(
        "Actor {} started: priority={} stack={}B core={:?}",
        name,
        spec.priority,
        spec.stack_bytes(),
        spec.core
    );
    Ok(ActorHandle { spec, thread })
}

/// Spawn an [`Actor`] using its declared spec.
pub fn spawn_actor<A: Actor>(mut actor: A) -> Result<ActorHandle, ActorError> {
    spawn(A::spec(), move || actor.step())
}

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_svc::hal::cpu::Core as HalCore;
    use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;

    use super::{ActorSpec, Core};
    use crate::error::ActorError;

    pub(super) fn configure(spec: &ActorSpec) -> Result<(), ActorError> {
        let mut config = ThreadSpawnConfiguration::default();
        config.name = Some(spec.name.to_bytes_with_nul());
        config.stack_size = spec.stack_bytes();
        config.priority = spec.priority;
        config.inherit = false;
        config.pin_to_core = spec.core.map(|core| match core {
            Core::Core0 => HalCore::Core0,
            Core::Core1 => HalCore::Core1,
        });

        config.set().map_err(|err| ActorError::Configure {
            name: spec.display_name(),
            reason: err.to_string(),
        })
    }

    pub(super) fn reset() {
        if let Err(err) = ThreadSpawnConfiguration::default().set() {
            log::warn!("Failed to reset pthread spawn configuration: {}", err);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::ActorSpec;
    use crate::error::ActorError;

    pub(super) fn configure(spec: &ActorSpec) -> Result<(), ActorError> {
        log::debug!(
            "Host thread {}: priority {} and core {:?} not applied",
            spec.display_name(),
            spec.priority,
            spec.core
        );
        Ok(())
    }

    pub(super) fn reset() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::{Duration, Instant};

    struct Counter {
        hits: Arc<AtomicUsize>,
    }

    impl Actor for Counter {
        const NAME: &'static CStr = c"counter";
        const PRIORITY: u8 = 3;
        const STACK_WORDS: usize = 4096;
        const CORE: Option<Core> = Some(Core::Core1);

        fn step(&mut self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_for(hits: &AtomicUsize, at_least: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if hits.load(Ordering::SeqCst) >= at_least {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn actor_spec_comes_from_associated_consts() {
        let spec = Counter::spec();
        assert_eq!(spec.name, c"counter");
        assert_eq!(spec.priority, 3);
        assert_eq!(spec.stack_bytes(), 16 * 1024);
        assert_eq!(spec.core, Some(Core::Core1));
    }

    #[test]
    fn spawned_actor_runs_body_repeatedly() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = spawn_actor(Counter { hits: hits.clone() }).unwrap();
        assert!(wait_for(&hits, 3));
        assert!(handle.is_running());
        assert_eq!(handle.thread().name(), Some("counter"));
    }

    #[test]
    fn closure_actor_gets_named_thread() {
        let (tx, rx) = mpsc::sync_channel(1);
        let spec = ActorSpec {
            name: c"named-worker",
            priority: 1,
            stack_words: 2048,
            core: None,
        };
        let _handle = spawn(spec, move || {
            let name = thread::current().name().map(str::to_owned);
            let _ = tx.try_send(name);
            thread::sleep(Duration::from_millis(5));
        })
        .unwrap();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("named-worker"));
    }
}
