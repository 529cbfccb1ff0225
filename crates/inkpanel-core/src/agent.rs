//! The panel agent: command queue, inbox and timer-driven dispatch.
//!
//! [`PanelHandle`] is the cloneable producer side. Button presses (from
//! interrupt context), timer callbacks and the network router only ever push
//! into its mailboxes. [`PanelAgent`] is the single consumer; it owns the
//! views, counters and collaborators and is the only code that mutates them.

use core::ffi::CStr;
use core::fmt::Debug;
use std::sync::Arc;
use std::thread;

use crate::action::Action;
use crate::actor::{Actor, Core};
use crate::button::ButtonMap;
use crate::clock::WallClock;
use crate::config::{
    PanelConfig, CONFIRMATION_TEXT, IDLE_BACKOFF, INBOX_BYTES, PERSIST_KEY, QUEUE_DEPTH,
};
use crate::debounce::PressObserver;
use crate::display::EinkPanel;
use crate::error::{Error, InboxError, TimerError};
use crate::inbox::Inbox;
use crate::json::{extract_fields, parse_payload, records_from, JsonFields};
use crate::led::StatusLed;
use crate::queue::CommandQueue;
use crate::record::RecordKind;
use crate::store::KeyValueStore;
use crate::timer::{PeriodicTimer, TimerService};
use crate::views::{MainScreen, ScrollDirection, ViewKind, ViewSet};
use crate::weather::WeatherSource;

pub const CLOCK_TIMER: &str = "clock";
pub const BLINK_TIMER: &str = "blink";

/// Cross-thread state shared by every [`PanelHandle`] and the agent.
pub struct Mailboxes {
    commands: CommandQueue<QUEUE_DEPTH>,
    inbox: Inbox<INBOX_BYTES>,
    buttons: ButtonMap,
}

#[derive(Clone)]
pub struct PanelHandle {
    mailboxes: Arc<Mailboxes>,
}

impl PanelHandle {
    pub fn new(buttons: ButtonMap) -> Self {
        Self {
            mailboxes: Arc::new(Mailboxes {
                commands: CommandQueue::new(),
                inbox: Inbox::new(),
                buttons,
            }),
        }
    }

    /// Copy a raw JSON payload into the inbox. Never blocks.
    pub fn submit_payload(&self, payload: &[u8]) -> Result<(), InboxError> {
        let result = self.mailboxes.inbox.push(payload);
        match &result {
            Ok(()) => log::debug!("Queued {} byte payload", payload.len()),
            Err(err @ InboxError::Oversize { .. }) => log::error!("Rejected payload: {}", err),
            Err(err @ InboxError::Full { .. }) => log::warn!("Dropped payload: {}", err),
        }
        result
    }

    /// Routine back insert.
    pub fn enqueue(&self, action: Action) -> bool {
        self.mailboxes.commands.push_back(action)
    }

    /// Priority front insert.
    pub fn enqueue_front(&self, action: Action) -> bool {
        self.mailboxes.commands.push_front(action)
    }

    /// Queued actions in dequeue order.
    pub fn pending_actions(&self) -> Vec<Action> {
        self.mailboxes.commands.snapshot().into_iter().collect()
    }

    pub fn buttons(&self) -> &ButtonMap {
        &self.mailboxes.buttons
    }

    fn press(&self, pin: u8) {
        // Interrupt context: no logging, drops are counted by the queue.
        if let Some(action) = self.mailboxes.buttons.action_for_pin(pin) {
            self.mailboxes.commands.push_front(action);
        }
    }
}

impl PressObserver for PanelHandle {
    fn on_short_press(&self, pin: u8) {
        self.press(pin);
    }

    fn on_long_press(&self, pin: u8) {
        self.press(pin);
    }
}

/// Collaborators handed to the agent at construction.
pub struct PanelParts<P> {
    pub panel: P,
    pub store: Box<dyn KeyValueStore>,
    pub timers: Box<dyn TimerService>,
    pub weather: Box<dyn WeatherSource>,
    pub led: Box<dyn StatusLed>,
    pub clock: Arc<dyn WallClock>,
}

pub struct PanelAgent<P: EinkPanel> {
    config: PanelConfig,
    handle: PanelHandle,
    views: ViewSet,
    panel: P,
    store: Box<dyn KeyValueStore>,
    timers: Box<dyn TimerService>,
    weather: Box<dyn WeatherSource>,
    led: Box<dyn StatusLed>,
    clock: Arc<dyn WallClock>,
    clock_timer: Option<Box<dyn PeriodicTimer>>,
    blink_timer: Option<Box<dyn PeriodicTimer>>,
    skip_clock_ticks: u32,
    weather_poll_counter: u32,
    blink_count: u32,
    // Zero while no blink sequence is running.
    blink_target: u32,
    led_on: bool,
    scratch: Vec<u8>,
}

impl<P> PanelAgent<P>
where
    P: EinkPanel,
    P::Error: Debug,
{
    pub fn new(config: PanelConfig, parts: PanelParts<P>) -> Self {
        let handle = PanelHandle::new(config.buttons.clone());
        Self {
            config,
            handle,
            views: ViewSet::new(),
            panel: parts.panel,
            store: parts.store,
            timers: parts.timers,
            weather: parts.weather,
            led: parts.led,
            clock: parts.clock,
            clock_timer: None,
            blink_timer: None,
            skip_clock_ticks: 0,
            weather_poll_counter: 0,
            blink_count: 0,
            blink_target: 0,
            led_on: false,
            scratch: Vec::with_capacity(INBOX_BYTES),
        }
    }

    pub fn handle(&self) -> PanelHandle {
        self.handle.clone()
    }

    pub fn views(&self) -> &ViewSet {
        &self.views
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn skip_clock_ticks(&self) -> u32 {
        self.skip_clock_ticks
    }

    pub fn weather_poll_counter(&self) -> u32 {
        self.weather_poll_counter
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_target > 0
    }

    pub fn blink_count(&self) -> u32 {
        self.blink_count
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// One-time startup, run before the loop.
    pub fn start(&mut self) -> Result<(), Error> {
        log::info!("Panel agent starting");
        self.views.select_main(MainScreen::Boot);
        self.refresh();

        self.load_persisted();
        self.blink(self.config.boot_blinks)?;

        let handle = self.handle.clone();
        let mut timer = self.timers.periodic(
            CLOCK_TIMER,
            Box::new(move || {
                handle.enqueue(Action::ClockTick);
            }),
        )?;
        timer.start(self.config.clock_period)?;
        self.clock_timer = Some(timer);

        self.views.select_main(MainScreen::Status);
        self.enqueue(Action::RefreshScreen);
        log::info!(
            "Panel agent started: {} reminders, {} events",
            self.views.reminders().len(),
            self.views.events().len()
        );
        Ok(())
    }

    /// Run the dispatch loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.step_loop();
        }
    }

    /// One loop iteration: drain one inbox message, then dispatch one
    /// action. Returns whether any work was done.
    pub fn poll_once(&mut self) -> bool {
        let inbox = self.process_inbox();
        let action = self.dispatch_next();
        inbox || action
    }

    /// Route the oldest inbox message, if any.
    pub fn process_inbox(&mut self) -> bool {
        let mut payload = core::mem::take(&mut self.scratch);
        let found = self.handle.mailboxes.inbox.pop_into(&mut payload);
        if found {
            self.handle_payload(&payload);
        }
        self.scratch = payload;
        found
    }

    /// Dispatch the next queued action, if any.
    pub fn dispatch_next(&mut self) -> bool {
        let dropped = self.handle.mailboxes.commands.take_dropped();
        if dropped > 0 {
            log::warn!("Command queue full: dropped {} actions", dropped);
        }
        match self.handle.mailboxes.commands.pop() {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    fn step_loop(&mut self) {
        if !self.poll_once() {
            thread::sleep(IDLE_BACKOFF);
        }
    }

    fn dispatch(&mut self, action: Action) {
        log::debug!("Dispatch {:?}", action);
        match action {
            Action::ScrollUp => self.scroll(ScrollDirection::Up),
            Action::ScrollDown => self.scroll(ScrollDirection::Down),
            Action::RefreshScreen => self.refresh(),
            Action::PollWeather => self.poll_weather(),
            Action::ShowReminders => {
                self.views.select(ViewKind::Reminders);
                self.refresh();
            }
            Action::ShowEvents => {
                self.views.select(ViewKind::Events);
                self.refresh();
            }
            Action::ShowMain => {
                self.views.select_main(MainScreen::Status);
                self.refresh();
            }
            Action::ClockTick => self.on_clock_tick(),
            Action::BlinkTick => self.on_blink_tick(),
        }
    }

    fn scroll(&mut self, direction: ScrollDirection) {
        if self.views.scroll(direction) {
            self.enqueue_front(Action::RefreshScreen);
        } else {
            log::debug!("Scroll {:?} changed nothing", direction);
        }
    }

    fn refresh(&mut self) {
        let now = self.clock.now();
        if let Err(err) = self.views.render(&mut self.panel, now) {
            log::error!("Render of {:?} failed: {:?}", self.views.current_kind(), err);
            return;
        }
        if let Err(err) = self.panel.update() {
            log::error!("Panel update failed: {:?}", err);
            return;
        }
        if self.views.shows_content() {
            self.skip_clock_ticks = self.config.clock_grace_ticks;
        }
        log::info!("Refreshed {:?}", self.views.current_kind());
    }

    fn poll_weather(&mut self) {
        match self.weather.poll() {
            Ok(report) => {
                log::info!(
                    "Got weather {}, {}, {:.2}, {:.2}, {:.2}",
                    report.location,
                    report.description,
                    report.temp,
                    report.temp_min,
                    report.temp_max
                );
                self.views.set_weather(report);
            }
            Err(err) => log::error!("Failed to get weather: {}", err),
        }
    }

    fn on_clock_tick(&mut self) {
        if self.skip_clock_ticks > 0 {
            self.skip_clock_ticks -= 1;
            log::debug!("Clock screen held off, {} ticks left", self.skip_clock_ticks);
            return;
        }

        self.views.select_main(MainScreen::Clock);
        self.enqueue(Action::RefreshScreen);

        self.weather_poll_counter += 1;
        if self.weather_poll_counter >= self.config.weather_poll_ticks {
            self.weather_poll_counter = 0;
            self.enqueue(Action::PollWeather);
        }
    }

    fn on_blink_tick(&mut self) {
        if self.blink_target == 0 {
            // Queued before the timer was cancelled.
            return;
        }
        if self.blink_count >= self.blink_target {
            self.stop_blink();
            return;
        }
        self.led_on = !self.led_on;
        self.led.set(self.led_on);
        self.blink_count += 1;
    }

    /// Start (or restart) a sequence of `toggles` LED toggles.
    fn blink(&mut self, toggles: u32) -> Result<(), TimerError> {
        if toggles == 0 {
            return Ok(());
        }
        if self.blink_timer.is_none() {
            let handle = self.handle.clone();
            let timer = self.timers.periodic(
                BLINK_TIMER,
                Box::new(move || {
                    handle.enqueue(Action::BlinkTick);
                }),
            )?;
            self.blink_timer = Some(timer);
        }
        self.blink_count = 0;
        self.blink_target = toggles;
        if let Some(timer) = self.blink_timer.as_mut() {
            timer.start(self.config.blink_period)?;
        }
        Ok(())
    }

    fn stop_blink(&mut self) {
        if let Some(timer) = self.blink_timer.as_mut() {
            if let Err(err) = timer.cancel() {
                log::error!("{}", err);
            }
        }
        self.blink_target = 0;
        self.blink_count = 0;
        self.led_on = false;
        self.led.set(false);
    }

    fn handle_payload(&mut self, payload: &[u8]) {
        let doc = match parse_payload(payload) {
            Ok(doc) => doc,
            Err(err) => {
                log::error!("Dropping malformed payload ({} bytes): {}", payload.len(), err);
                return;
            }
        };
        let fields = extract_fields(&doc);
        let flags = fields.flags();
        if flags.is_empty() {
            log::info!("Payload carries no reminders, calendar or message");
            return;
        }

        if flags.has_lists() {
            self.replace_lists(&fields);
            self.show_new_content(CONFIRMATION_TEXT);
            match core::str::from_utf8(payload) {
                Ok(text) => self.persist(text),
                Err(err) => log::error!("Payload is not UTF-8, not persisted: {}", err),
            }
        }

        if let Some(message) = fields.message {
            log::info!("msg received: {}", message);
            self.show_new_content(message);
        }
    }

    fn show_new_content(&mut self, text: &str) {
        self.views.show_message(text);
        self.skip_clock_ticks = self.config.clock_grace_ticks;
        if let Err(err) = self.blink(self.config.new_content_blinks) {
            log::error!("Blink failed: {}", err);
        }
        self.enqueue_front(Action::RefreshScreen);
    }

    fn replace_lists(&mut self, fields: &JsonFields<'_>) {
        let reminders = fields
            .reminders
            .map(|items| records_from(items, RecordKind::Reminder))
            .unwrap_or_default();
        let events = fields
            .calendar
            .map(|items| records_from(items, RecordKind::Event))
            .unwrap_or_default();
        log::info!(
            "Replacing lists: {} reminders, {} events",
            reminders.len(),
            events.len()
        );
        self.views.replace_lists(reminders, events);
    }

    fn load_persisted(&mut self) {
        let text = match self.store.get_string(PERSIST_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => {
                log::info!("No stored payload, cold start");
                return;
            }
            Err(err) => {
                log::error!("Failed to read stored payload: {}", err);
                return;
            }
        };

        let doc = match parse_payload(text.as_bytes()) {
            Ok(doc) => doc,
            Err(err) => {
                log::error!("Stored payload is not valid JSON: {}", err);
                self.erase_persisted();
                return;
            }
        };
        let fields = extract_fields(&doc);
        if !fields.flags().has_lists() {
            log::error!("Stored payload has no reminders or calendar");
            self.erase_persisted();
            return;
        }
        self.replace_lists(&fields);
    }

    fn persist(&mut self, text: &str) {
        let result = self
            .store
            .set_string(PERSIST_KEY, text)
            .and_then(|()| self.store.commit());
        match result {
            Ok(()) => log::info!("Persisted {} byte payload", text.len()),
            Err(err) => log::error!("Failed to persist payload: {}", err),
        }
    }

    fn erase_persisted(&mut self) {
        let result = self
            .store
            .erase(PERSIST_KEY)
            .and_then(|()| self.store.commit());
        if let Err(err) = result {
            log::error!("Failed to erase stored payload: {}", err);
        }
    }

    fn enqueue(&self, action: Action) {
        if !self.handle.enqueue(action) {
            log::warn!("Command queue full, dropped {:?}", action);
        }
    }

    fn enqueue_front(&self, action: Action) {
        if !self.handle.enqueue_front(action) {
            log::warn!("Command queue full, dropped {:?}", action);
        }
    }
}

impl<P> Actor for PanelAgent<P>
where
    P: EinkPanel + 'static,
    P::Error: Debug,
{
    const NAME: &'static CStr = c"panel-agent";
    const PRIORITY: u8 = 5;
    const STACK_WORDS: usize = 8 * 1024;
    const CORE: Option<Core> = Some(Core::Core0);

    fn step(&mut self) {
        self.step_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::ButtonId;
    use crate::config::DISPLAY_WIDTH;
    use crate::mock::{FixedClock, ManualTimers, MemoryStore, RecordingLed, ScriptedWeather};
    use crate::test_display::TestDisplay;
    use crate::views::ContentView;
    use crate::weather::WeatherReport;
    use crate::WeatherError;

    struct Rig {
        agent: PanelAgent<TestDisplay>,
        store: MemoryStore,
        timers: ManualTimers,
        weather: ScriptedWeather,
        led: RecordingLed,
    }

    fn buttons() -> ButtonMap {
        ButtonMap::empty()
            .bind(ButtonId::Up, 15)
            .and_then(|m| m.bind(ButtonId::Down, 11))
            .and_then(|m| m.bind(ButtonId::A, 12))
            .and_then(|m| m.bind(ButtonId::B, 13))
            .and_then(|m| m.bind(ButtonId::C, 14))
            .unwrap()
    }

    fn rig_with_store(store: MemoryStore) -> Rig {
        let timers = ManualTimers::new();
        let weather = ScriptedWeather::new();
        let led = RecordingLed::new();
        let agent = PanelAgent::new(
            PanelConfig::new(buttons()),
            PanelParts {
                panel: TestDisplay::new(DISPLAY_WIDTH, crate::DISPLAY_HEIGHT),
                store: Box::new(store.clone()),
                timers: Box::new(timers.clone()),
                weather: Box::new(weather.clone()),
                led: Box::new(led.clone()),
                clock: Arc::new(FixedClock::unset()),
            },
        );
        Rig {
            agent,
            store,
            timers,
            weather,
            led,
        }
    }

    fn rig() -> Rig {
        rig_with_store(MemoryStore::new())
    }

    fn drain(agent: &mut PanelAgent<TestDisplay>) {
        for _ in 0..64 {
            if !agent.poll_once() {
                return;
            }
        }
        panic!("agent did not go idle");
    }

    #[test]
    fn start_renders_boot_then_queues_status_refresh() {
        let mut rig = rig();
        rig.agent.start().unwrap();

        assert_eq!(rig.agent.panel().update_count(), 1);
        assert_eq!(
            rig.agent.views().current(),
            ContentView::Main(MainScreen::Status)
        );
        assert_eq!(rig.agent.handle().pending_actions(), vec![Action::RefreshScreen]);
        assert!(rig.timers.is_active(CLOCK_TIMER));
        assert_eq!(rig.timers.period(CLOCK_TIMER), Some(crate::config::CLOCK_PERIOD));
        assert!(rig.timers.is_active(BLINK_TIMER));
    }

    #[test]
    fn press_observer_front_inserts_mapped_action() {
        let rig = rig();
        let handle = rig.agent.handle();
        handle.enqueue(Action::ClockTick);
        handle.on_short_press(11);
        handle.on_long_press(12);
        handle.on_short_press(99);
        assert_eq!(
            handle.pending_actions(),
            vec![Action::ShowReminders, Action::ScrollDown, Action::ClockTick]
        );
    }

    #[test]
    fn isr_drops_are_counted_then_logged() {
        let mut rig = rig();
        let handle = rig.agent.handle();
        for _ in 0..QUEUE_DEPTH {
            assert!(handle.enqueue(Action::PollWeather));
        }
        handle.on_short_press(15);
        assert_eq!(handle.pending_actions().len(), QUEUE_DEPTH);
        assert_eq!(handle.mailboxes.commands.take_dropped(), 1);
        handle.on_short_press(15);
        rig.agent.dispatch_next();
        assert_eq!(handle.mailboxes.commands.take_dropped(), 0);
    }

    #[test]
    fn message_payload_shows_message_and_blinks() {
        let mut rig = rig();
        rig.agent
            .handle()
            .submit_payload(br#"{"message": "Water the plants"}"#)
            .unwrap();
        assert!(rig.agent.process_inbox());

        assert_eq!(
            rig.agent.views().current(),
            ContentView::Message("Water the plants")
        );
        assert_eq!(rig.agent.skip_clock_ticks(), 2);
        assert_eq!(rig.agent.handle().pending_actions(), vec![Action::RefreshScreen]);
        assert!(rig.agent.is_blinking());
        assert_eq!(rig.store.value(PERSIST_KEY), None);
    }

    #[test]
    fn list_payload_replaces_lists_and_persists() {
        let mut rig = rig();
        let payload = r#"{"reminders":[{"title":"Pay rent","date":"2024-05-01","time":"09:00"}],
            "calendar":[{"title":"Standup","date":"2024-05-02","time":"10:00"}]}"#;
        rig.agent.handle().submit_payload(payload.as_bytes()).unwrap();
        rig.agent.process_inbox();

        assert_eq!(rig.agent.views().reminders().len(), 1);
        assert_eq!(rig.agent.views().events().len(), 1);
        assert_eq!(
            rig.agent.views().current(),
            ContentView::Message(CONFIRMATION_TEXT)
        );
        assert_eq!(rig.store.committed_value(PERSIST_KEY).as_deref(), Some(payload));
    }

    #[test]
    fn absent_list_key_clears_that_list() {
        let mut rig = rig();
        let handle = rig.agent.handle();
        handle
            .submit_payload(
                br#"{"reminders":[{"title":"a","date":"d","time":"t"}],"calendar":[{"title":"b","date":"d","time":"t"}]}"#,
            )
            .unwrap();
        rig.agent.process_inbox();
        handle
            .submit_payload(br#"{"calendar":[{"title":"c","date":"d","time":"t"}]}"#)
            .unwrap();
        rig.agent.process_inbox();

        assert!(rig.agent.views().reminders().is_empty());
        assert_eq!(rig.agent.views().events().items()[0].title, "c");
    }

    #[test]
    fn malformed_and_keyless_payloads_change_nothing() {
        let mut rig = rig();
        let handle = rig.agent.handle();
        handle.submit_payload(br#"{"message": "#).unwrap();
        handle.submit_payload(br#"{"weather": "sunny"}"#).unwrap();
        assert!(rig.agent.process_inbox());
        assert!(rig.agent.process_inbox());

        assert_eq!(rig.agent.views().current(), ContentView::Main(MainScreen::Boot));
        assert!(rig.agent.handle().pending_actions().is_empty());
        assert_eq!(rig.agent.skip_clock_ticks(), 0);
        assert!(!rig.agent.is_blinking());
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let rig = rig();
        let payload = vec![b' '; INBOX_BYTES];
        let err = rig.agent.handle().submit_payload(&payload).unwrap_err();
        assert!(matches!(err, InboxError::Oversize { .. }));
    }

    #[test]
    fn scroll_on_empty_list_enqueues_nothing() {
        let mut rig = rig();
        let handle = rig.agent.handle();
        handle.enqueue(Action::ShowEvents);
        rig.agent.dispatch_next();
        handle.enqueue(Action::ScrollDown);
        rig.agent.dispatch_next();
        assert!(handle.pending_actions().is_empty());
        assert!(matches!(
            rig.agent.views().current(),
            ContentView::EventList { cursor: 0, .. }
        ));
    }

    #[test]
    fn main_scroll_toggles_status_and_clock() {
        let mut rig = rig();
        rig.agent.start().unwrap();
        drain(&mut rig.agent);
        rig.agent.handle().enqueue(Action::ScrollDown);
        rig.agent.dispatch_next();
        assert_eq!(
            rig.agent.views().current(),
            ContentView::Main(MainScreen::Clock)
        );
        assert_eq!(rig.agent.handle().pending_actions(), vec![Action::RefreshScreen]);
    }

    #[test]
    fn clock_tick_waits_out_grace_period() {
        let mut rig = rig();
        rig.agent.start().unwrap();
        drain(&mut rig.agent);
        rig.agent
            .handle()
            .submit_payload(br#"{"message": "hi"}"#)
            .unwrap();
        drain(&mut rig.agent);
        assert_eq!(rig.agent.skip_clock_ticks(), 2);

        for remaining in [1, 0] {
            assert!(rig.timers.fire(CLOCK_TIMER));
            drain(&mut rig.agent);
            assert_eq!(rig.agent.skip_clock_ticks(), remaining);
            assert_eq!(rig.agent.views().current(), ContentView::Message("hi"));
            assert_eq!(rig.agent.weather_poll_counter(), 0);
        }

        assert!(rig.timers.fire(CLOCK_TIMER));
        rig.agent.dispatch_next();
        assert_eq!(
            rig.agent.views().current(),
            ContentView::Main(MainScreen::Clock)
        );
        assert_eq!(rig.agent.handle().pending_actions(), vec![Action::RefreshScreen]);
    }

    #[test]
    fn weather_polls_every_tenth_clock_tick() {
        let mut rig = rig();
        rig.agent.start().unwrap();
        drain(&mut rig.agent);
        rig.weather.push(Err(WeatherError::Network("offline".to_string())));
        rig.weather.push(Ok(WeatherReport {
            temp: 61.3,
            temp_min: 57.0,
            temp_max: 65.0,
            description: "clear sky".to_string(),
            location: "San Francisco".to_string(),
        }));

        for _ in 0..9 {
            rig.timers.fire(CLOCK_TIMER);
            drain(&mut rig.agent);
        }
        assert_eq!(rig.weather.polls(), 0);
        assert_eq!(rig.agent.weather_poll_counter(), 9);

        rig.timers.fire(CLOCK_TIMER);
        drain(&mut rig.agent);
        assert_eq!(rig.weather.polls(), 1);
        assert_eq!(rig.agent.weather_poll_counter(), 0);
        assert!(rig.agent.views().main().weather().is_none());

        for _ in 0..10 {
            rig.timers.fire(CLOCK_TIMER);
            drain(&mut rig.agent);
        }
        assert_eq!(rig.weather.polls(), 2);
        assert_eq!(rig.agent.views().main().weather_line(), "61.3F clear sky");
    }

    #[test]
    fn blink_stops_after_exact_toggle_count() {
        let mut rig = rig();
        rig.agent.start().unwrap();
        drain(&mut rig.agent);

        for _ in 0..5 {
            assert!(rig.timers.fire(BLINK_TIMER));
            drain(&mut rig.agent);
        }
        assert_eq!(rig.led.toggles(), 5);
        assert!(rig.timers.is_active(BLINK_TIMER));

        assert!(rig.timers.fire(BLINK_TIMER));
        drain(&mut rig.agent);
        assert!(!rig.timers.is_active(BLINK_TIMER));
        assert!(!rig.agent.is_blinking());
        assert!(!rig.led.is_on());
        assert!(!rig.timers.fire(BLINK_TIMER));
    }

    #[test]
    fn stale_blink_tick_is_ignored() {
        let mut rig = rig();
        rig.agent.handle().enqueue(Action::BlinkTick);
        rig.agent.dispatch_next();
        assert!(rig.led.history().is_empty());
    }

    #[test]
    fn show_actions_switch_views_and_render() {
        let mut rig = rig();
        let handle = rig.agent.handle();
        handle.enqueue(Action::ShowReminders);
        handle.enqueue(Action::ShowMain);
        rig.agent.dispatch_next();
        assert_eq!(rig.agent.views().current_kind(), ViewKind::Reminders);
        rig.agent.dispatch_next();
        assert_eq!(
            rig.agent.views().current(),
            ContentView::Main(MainScreen::Status)
        );
        assert_eq!(rig.agent.panel().update_count(), 2);
    }

    #[test]
    fn invalid_stored_blob_is_erased() {
        let store = MemoryStore::new().with_entry(PERSIST_KEY, r#"{"message":"stale"}"#);
        let mut rig = rig_with_store(store);
        rig.agent.start().unwrap();
        assert!(!rig.store.contains(PERSIST_KEY).unwrap());
        assert_eq!(rig.store.committed_value(PERSIST_KEY), None);
        assert!(rig.agent.views().reminders().is_empty());
    }
}
