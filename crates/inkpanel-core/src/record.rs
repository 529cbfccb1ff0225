//! Reminder and calendar entries.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Reminder,
    Event,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Event => "event",
        }
    }
}

/// One reminder or calendar event. Identity is its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRecord {
    pub title: String,
    pub date: String,
    pub time: String,
    pub kind: RecordKind,
}

/// Wire shape of a list element. Unknown members such as `"epoch time"` are
/// ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordFields<'a> {
    #[serde(borrow)]
    pub title: &'a str,
    #[serde(borrow)]
    pub date: &'a str,
    #[serde(borrow)]
    pub time: &'a str,
}

impl RecordFields<'_> {
    pub fn into_record(self, kind: RecordKind) -> ReminderRecord {
        ReminderRecord {
            title: self.title.to_owned(),
            date: self.date.to_owned(),
            time: self.time.to_owned(),
            kind,
        }
    }
}
