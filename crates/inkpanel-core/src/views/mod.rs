//! Renderable content screens.
//!
//! Exactly one view is current. Scrolling is a capability every view has;
//! views that cannot scroll report no change.

pub mod list;
pub mod main_view;
pub mod message;

use chrono::NaiveDateTime;
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

pub use list::{RecordList, EVENTS_PER_PAGE};
pub use main_view::{MainScreen, MainView, StatusCounts, NO_WEATHER};
pub use message::MessageView;

use crate::record::{RecordKind, ReminderRecord};
use crate::weather::WeatherReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Main,
    Message,
    Reminders,
    Events,
}

/// Borrowed snapshot of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentView<'a> {
    Main(MainScreen),
    Message(&'a str),
    ReminderList {
        items: &'a [ReminderRecord],
        cursor: usize,
    },
    EventList {
        items: &'a [ReminderRecord],
        cursor: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ViewSet {
    current: ViewKind,
    main: MainView,
    message: MessageView,
    reminders: RecordList,
    events: RecordList,
}

impl ViewSet {
    pub fn new() -> Self {
        Self {
            current: ViewKind::Main,
            main: MainView::new(),
            message: MessageView::default(),
            reminders: RecordList::new(RecordKind::Reminder),
            events: RecordList::new(RecordKind::Event),
        }
    }

    pub fn current_kind(&self) -> ViewKind {
        self.current
    }

    pub fn current(&self) -> ContentView<'_> {
        match self.current {
            ViewKind::Main => ContentView::Main(self.main.screen()),
            ViewKind::Message => ContentView::Message(self.message.text()),
            ViewKind::Reminders => ContentView::ReminderList {
                items: self.reminders.items(),
                cursor: self.reminders.cursor(),
            },
            ViewKind::Events => ContentView::EventList {
                items: self.events.items(),
                cursor: self.events.cursor(),
            },
        }
    }

    pub fn select(&mut self, kind: ViewKind) {
        self.current = kind;
    }

    pub fn select_main(&mut self, screen: MainScreen) {
        self.main.select(screen);
        self.current = ViewKind::Main;
    }

    pub fn show_message(&mut self, text: &str) {
        self.message.set_text(text);
        self.current = ViewKind::Message;
    }

    /// Wholesale replace of both lists.
    pub fn replace_lists(&mut self, reminders: Vec<ReminderRecord>, events: Vec<ReminderRecord>) {
        self.reminders.replace(reminders);
        self.events.replace(events);
    }

    pub fn reminders(&self) -> &RecordList {
        &self.reminders
    }

    pub fn events(&self) -> &RecordList {
        &self.events
    }

    pub fn main(&self) -> &MainView {
        &self.main
    }

    pub fn set_weather(&mut self, report: WeatherReport) {
        self.main.set_weather(report);
    }

    /// Scroll the current view. Returns whether anything changed.
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        match self.current {
            ViewKind::Main => self.main.scroll(direction),
            ViewKind::Message => false,
            ViewKind::Reminders => self.reminders.scroll(direction),
            ViewKind::Events => self.events.scroll(direction),
        }
    }

    /// Whether the current view is user content that should hold off the
    /// clock screen.
    pub fn shows_content(&self) -> bool {
        match self.current {
            ViewKind::Main => false,
            ViewKind::Message => !self.message.is_empty(),
            ViewKind::Reminders => !self.reminders.is_empty(),
            ViewKind::Events => !self.events.is_empty(),
        }
    }

    pub fn render<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
        now: Option<NaiveDateTime>,
    ) -> Result<(), D::Error> {
        match self.current {
            ViewKind::Main => {
                let counts = StatusCounts {
                    reminders: self.reminders.len(),
                    events: self.events.len(),
                };
                self.main.render(display, counts, now)
            }
            ViewKind::Message => self.message.render(display),
            ViewKind::Reminders => self.reminders.render(display),
            ViewKind::Events => self.events.render(display),
        }
    }
}

impl Default for ViewSet {
    fn default() -> Self {
        Self::new()
    }
}
