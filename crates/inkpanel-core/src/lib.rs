//! Core library for the inkpanel e-ink information panel.
//! Runs on ESP-IDF and on the desktop, where it is driven by the simulator
//! and the scenario harness.

#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

pub mod action;
pub mod actor;
pub mod agent;
pub mod button;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod display;
pub mod edge;
pub mod error;
#[cfg(any(test, feature = "std"))]
pub mod host;
pub mod inbox;
pub mod json;
pub mod led;
#[cfg(any(test, feature = "std"))]
pub mod mock;
pub mod queue;
pub mod record;
pub mod store;
#[cfg(any(test, feature = "std"))]
pub mod test_display;
pub mod timer;
pub mod views;
pub mod weather;

pub use action::Action;
pub use actor::{spawn, spawn_actor, Actor, ActorHandle, ActorSpec, Core};
pub use agent::{Mailboxes, PanelAgent, PanelHandle, PanelParts};
pub use button::{ButtonId, ButtonMap};
pub use clock::{Monotonic, WallClock};
pub use config::{DebounceTiming, PanelConfig, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use debounce::{Debouncer, Polarity, PressKind, PressObserver, SwitchBank};
pub use display::EinkPanel;
pub use edge::{Edge, EdgeDemultiplexer, EdgeObserver};
pub use error::{
    ActorError, ConfigError, Error, InboxError, StoreError, TimerError, WeatherError,
};
pub use inbox::Inbox;
pub use json::{extract_fields, records_from, JsonFieldFlags, JsonFields};
pub use led::StatusLed;
pub use queue::CommandQueue;
pub use record::{RecordKind, ReminderRecord};
pub use store::KeyValueStore;
#[cfg(any(test, feature = "std"))]
pub use test_display::TestDisplay;
pub use timer::{PeriodicTimer, TimerCallback, TimerService};
pub use views::{ContentView, MainScreen, ScrollDirection, ViewKind, ViewSet};
pub use weather::{WeatherReport, WeatherSource};
