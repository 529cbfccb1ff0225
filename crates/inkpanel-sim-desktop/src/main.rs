//! Desktop SDL simulator for the inkpanel.
//!
//! Runs the real panel agent on its own actor thread with host collaborators.
//! Keyboard keys drive the switch debouncers through the global edge
//! demultiplexer, and every line typed on stdin is routed as a JSON payload.

mod file_store;
mod sim_panel;

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use embedded_graphics_simulator::{sdl2::Keycode, OutputSettingsBuilder, SimulatorEvent, Window};
use inkpanel_core::host::{StdMonotonic, SystemWallClock, ThreadTimerService};
use inkpanel_core::{
    spawn, spawn_actor, ActorSpec, ButtonId, ButtonMap, Edge, EdgeDemultiplexer, PanelAgent,
    PanelConfig, PanelHandle, PanelParts, Polarity, StatusLed, SwitchBank, WeatherError,
    WeatherReport, WeatherSource,
};
use tracing_subscriber::EnvFilter;

use crate::file_store::FileStore;
use crate::sim_panel::SharedFrame;

const DEFAULT_STORE: &str = "inkpanel-nvs.json";

const STDIN_ROUTER: ActorSpec = ActorSpec {
    name: c"stdin-router",
    priority: 5,
    stack_words: 4 * 1024,
    core: None,
};

fn main() -> anyhow::Result<()> {
    init_logging();

    let buttons = ButtonMap::empty()
        .bind(ButtonId::Up, 15)
        .and_then(|map| map.bind(ButtonId::Down, 11))
        .and_then(|map| map.bind(ButtonId::A, 12))
        .and_then(|map| map.bind(ButtonId::B, 13))
        .and_then(|map| map.bind(ButtonId::C, 14))?;
    let mut config = PanelConfig::new(buttons.clone());
    if let Some(secs) = env_number::<u64>("INKPANEL_CLOCK_SECS") {
        config.clock_period = Duration::from_secs(secs.max(1));
    }

    let store_path = std::env::var("INKPANEL_STORE").unwrap_or_else(|_| DEFAULT_STORE.to_string());
    let store = FileStore::open(&store_path).with_context(|| format!("opening {}", store_path))?;
    let offset_hours = env_number::<i32>("INKPANEL_UTC_OFFSET").unwrap_or(0);

    let frame = SharedFrame::new();
    let mut agent = PanelAgent::new(
        config.clone(),
        PanelParts {
            panel: frame.panel(),
            store: Box::new(store),
            timers: Box::new(ThreadTimerService::new()?),
            weather: Box::new(CannedWeather),
            led: Box::new(ConsoleLed),
            clock: Arc::new(SystemWallClock::new(offset_hours * 3600)),
        },
    );
    let handle = agent.handle();

    let switches = SwitchBank::new(
        &buttons,
        Polarity::ActiveLow,
        config.debounce,
        Arc::new(StdMonotonic::new()),
        Arc::new(handle.clone()),
    );
    switches.register(EdgeDemultiplexer::global())?;

    agent.start()?;
    let _agent = spawn_actor(agent)?;
    let _router = spawn_stdin_router(handle)?;

    let output_settings = OutputSettingsBuilder::new().scale(3).build();
    let mut window = Window::new("inkpanel", &output_settings);
    frame.present_if_dirty(|display| window.update(display));

    println!("inkpanel simulator");
    println!("Controls:");
    println!("  Up / W       - Scroll up");
    println!("  Down / S     - Scroll down");
    println!("  1 / A        - Reminders");
    println!("  2 / B        - Events");
    println!("  3 / H        - Home");
    println!("  Escape       - Quit");
    println!("Type a JSON payload on stdin and press enter to deliver it.");

    loop {
        let events = window.events().collect::<Vec<_>>();

        for event in events {
            match event {
                SimulatorEvent::Quit => return Ok(()),
                SimulatorEvent::KeyDown {
                    keycode: Keycode::Escape,
                    ..
                } => return Ok(()),
                SimulatorEvent::KeyDown {
                    keycode,
                    repeat: false,
                    ..
                } => feed_key(&buttons, keycode, Edge::Falling),
                SimulatorEvent::KeyUp { keycode, .. } => feed_key(&buttons, keycode, Edge::Rising),
                _ => {}
            }
        }

        frame.present_if_dirty(|display| window.update(display));
        thread::sleep(Duration::from_millis(16));
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The default tracing-log bridge picks up the core crate's `log` records.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

/// Keys are wired active-low: key down pulls the pin low.
fn feed_key(buttons: &ButtonMap, keycode: Keycode, edge: Edge) {
    if let Some(pin) = keycode_to_button(keycode).and_then(|button| buttons.pin_for(button)) {
        EdgeDemultiplexer::global().on_edge(pin, edge);
    }
}

fn keycode_to_button(keycode: Keycode) -> Option<ButtonId> {
    match keycode {
        Keycode::Up | Keycode::W => Some(ButtonId::Up),
        Keycode::Down | Keycode::S => Some(ButtonId::Down),
        Keycode::Num1 | Keycode::A => Some(ButtonId::A),
        Keycode::Num2 | Keycode::B => Some(ButtonId::B),
        Keycode::Num3 | Keycode::H => Some(ButtonId::C),
        _ => None,
    }
}

/// Route stdin lines into the agent inbox, as the MQTT router does on device.
fn spawn_stdin_router(handle: PanelHandle) -> anyhow::Result<inkpanel_core::ActorHandle> {
    let stdin = io::stdin();
    let mut line = String::new();
    let router = spawn(STDIN_ROUTER, move || {
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => {
                log::info!("stdin closed, payload routing stopped");
                thread::park();
            }
            Ok(_) => {
                let payload = line.trim();
                if !payload.is_empty() {
                    // Rejections are logged by the handle.
                    let _ = handle.submit_payload(payload.as_bytes());
                }
            }
            Err(err) => log::error!("stdin read failed: {}", err),
        }
    })?;
    Ok(router)
}

/// Fixed report so the clock screen has something to show offline.
struct CannedWeather;

impl WeatherSource for CannedWeather {
    fn poll(&mut self) -> Result<WeatherReport, WeatherError> {
        Ok(WeatherReport {
            temp: 64.4,
            temp_min: 58.0,
            temp_max: 70.0,
            description: "simulated sun".to_string(),
            location: "Desktop".to_string(),
        })
    }
}

struct ConsoleLed;

impl StatusLed for ConsoleLed {
    fn set(&mut self, on: bool) {
        log::debug!("LED {}", if on { "on" } else { "off" });
    }
}
