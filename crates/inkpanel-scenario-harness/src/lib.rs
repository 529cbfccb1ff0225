//! Host-side scenario test harness for scripted panel flows.
//!
//! Couples a [`PanelAgent`] with the deterministic collaborators from
//! `inkpanel_core::mock`. Button presses travel the same path as on the
//! device: raw edges into an [`EdgeDemultiplexer`], through the per-pin
//! debouncers, then front-inserted into the command queue.

use std::sync::Arc;

use chrono::NaiveDateTime;
use embedded_graphics::pixelcolor::BinaryColor;
use inkpanel_core::agent::{BLINK_TIMER, CLOCK_TIMER};
use inkpanel_core::mock::{
    FixedClock, ManualMonotonic, ManualTimers, MemoryStore, RecordingLed, ScriptedWeather,
};
use inkpanel_core::{
    Action, ButtonId, ButtonMap, ContentView, Edge, EdgeDemultiplexer, InboxError, PanelAgent,
    PanelConfig, PanelHandle, PanelParts, Polarity, SwitchBank, TestDisplay, ViewSet,
};

/// Hold time classified as a short press.
pub const SHORT_PRESS_MS: u32 = 120;
/// Hold time classified as a long press.
pub const LONG_PRESS_MS: u32 = 1500;

/// Pin layout of the reference board.
pub fn default_buttons() -> ButtonMap {
    ButtonMap::empty()
        .bind(ButtonId::Up, 15)
        .and_then(|map| map.bind(ButtonId::Down, 11))
        .and_then(|map| map.bind(ButtonId::A, 12))
        .and_then(|map| map.bind(ButtonId::B, 13))
        .and_then(|map| map.bind(ButtonId::C, 14))
        .expect("reference pin layout is valid")
}

/// Small helper that couples agent, mocks and the input path for scenario tests.
pub struct ScenarioHarness {
    agent: PanelAgent<TestDisplay>,
    handle: PanelHandle,
    demux: EdgeDemultiplexer,
    _switches: SwitchBank,
    monotonic: Arc<ManualMonotonic>,
    clock: Arc<FixedClock>,
    store: MemoryStore,
    timers: ManualTimers,
    weather: ScriptedWeather,
    led: RecordingLed,
}

impl ScenarioHarness {
    /// Fresh panel with empty storage and an unset wall clock.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Panel booting from caller-provided storage, e.g. one that survived a
    /// previous harness.
    pub fn with_store(store: MemoryStore) -> Self {
        Self::with_config(PanelConfig::new(default_buttons()), store)
    }

    pub fn with_config(config: PanelConfig, store: MemoryStore) -> Self {
        let timers = ManualTimers::new();
        let weather = ScriptedWeather::new();
        let led = RecordingLed::new();
        let clock = Arc::new(FixedClock::unset());
        let monotonic = Arc::new(ManualMonotonic::new(0));
        let timing = config.debounce;
        let buttons = config.buttons.clone();

        let agent = PanelAgent::new(
            config,
            PanelParts {
                panel: TestDisplay::default_size(),
                store: Box::new(store.clone()),
                timers: Box::new(timers.clone()),
                weather: Box::new(weather.clone()),
                led: Box::new(led.clone()),
                clock: clock.clone(),
            },
        );
        let handle = agent.handle();

        let demux = EdgeDemultiplexer::new();
        let switches = SwitchBank::new(
            &buttons,
            Polarity::ActiveLow,
            timing,
            monotonic.clone(),
            Arc::new(handle.clone()),
        );
        switches
            .register(&demux)
            .expect("reference pins fit the edge table");

        Self {
            agent,
            handle,
            demux,
            _switches: switches,
            monotonic,
            clock,
            store,
            timers,
            weather,
            led,
        }
    }

    /// Run agent startup and pump the queued work.
    pub fn boot(&mut self) -> usize {
        self.agent.start().expect("scenario startup should succeed");
        self.pump_until_idle()
    }

    /// Feed raw edges for a press of `button` held for `held_ms`.
    pub fn press_for(&mut self, button: ButtonId, held_ms: u32) {
        let pin = self
            .handle
            .buttons()
            .pin_for(button)
            .expect("button is bound in the scenario layout");
        self.demux.on_edge(pin, Edge::Falling);
        self.monotonic.advance(held_ms);
        self.demux.on_edge(pin, Edge::Rising);
        // Gap between presses.
        self.monotonic.advance(200);
    }

    pub fn press(&mut self, button: ButtonId) {
        self.press_for(button, SHORT_PRESS_MS);
    }

    pub fn long_press(&mut self, button: ButtonId) {
        self.press_for(button, LONG_PRESS_MS);
    }

    /// Press and pump until the agent is idle.
    pub fn press_and_settle(&mut self, button: ButtonId) -> usize {
        self.press(button);
        self.pump_until_idle()
    }

    /// Hand a payload to the inbox, as the network router would.
    pub fn submit(&self, payload: &str) -> Result<(), InboxError> {
        self.handle.submit_payload(payload.as_bytes())
    }

    /// Pump agent iterations until idle or a safety cap is reached.
    pub fn pump_until_idle(&mut self) -> usize {
        const MAX_PUMPS: usize = 64;
        let mut steps = 0;

        for _ in 0..MAX_PUMPS {
            if !self.agent.poll_once() {
                break;
            }
            steps += 1;
        }

        steps
    }

    /// Fire the minute timer once and pump.
    pub fn clock_tick(&mut self) -> bool {
        let fired = self.timers.fire(CLOCK_TIMER);
        self.pump_until_idle();
        fired
    }

    /// Fire the LED blink timer once and pump.
    pub fn blink_tick(&mut self) -> bool {
        let fired = self.timers.fire(BLINK_TIMER);
        self.pump_until_idle();
        fired
    }

    /// Run blink ticks until the blink timer stops. Returns ticks fired.
    pub fn finish_blinking(&mut self) -> usize {
        const MAX_TICKS: usize = 64;
        let mut ticks = 0;
        while ticks < MAX_TICKS && self.blink_tick() {
            ticks += 1;
        }
        ticks
    }

    pub fn set_time(&self, now: NaiveDateTime) {
        self.clock.set(now);
    }

    /// Queued actions in dequeue order.
    pub fn pending_actions(&self) -> Vec<Action> {
        self.handle.pending_actions()
    }

    pub fn next_action(&self) -> Option<Action> {
        self.pending_actions().first().copied()
    }

    pub fn current_view(&self) -> ContentView<'_> {
        self.agent.views().current()
    }

    /// Access the agent for assertions.
    pub fn agent(&self) -> &PanelAgent<TestDisplay> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut PanelAgent<TestDisplay> {
        &mut self.agent
    }

    pub fn views(&self) -> &ViewSet {
        self.agent.views()
    }

    /// Access the display for render assertions.
    pub fn display(&self) -> &TestDisplay {
        self.agent.panel()
    }

    pub fn handle(&self) -> &PanelHandle {
        &self.handle
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn timers(&self) -> &ManualTimers {
        &self.timers
    }

    pub fn weather(&self) -> &ScriptedWeather {
        &self.weather
    }

    pub fn led(&self) -> &RecordingLed {
        &self.led
    }

    /// Dump the framebuffer as text, `#` for black. Handy in failure output.
    pub fn ascii_frame(&self) -> String {
        let display = self.display();
        let (width, height) = display.dimensions();
        let mut out = String::with_capacity(((width + 1) * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let black = display.pixel(x, y) == Some(BinaryColor::On);
                out.push(if black { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for ScenarioHarness {
    fn default() -> Self {
        Self::new()
    }
}
