//! Field extraction for inbound payloads.
//!
//! Payloads look like
//! `{"reminders":[{"title","date","time"}..], "calendar":[..], "message":".."}`
//! with every key optional. Only the top-level object is inspected, and the
//! extracted fields borrow from the parsed document.

use serde::Deserialize;
use serde_json::Value;

use crate::record::{RecordFields, RecordKind, ReminderRecord};

pub const REMINDERS_KEY: &str = "reminders";
pub const CALENDAR_KEY: &str = "calendar";
pub const MESSAGE_KEY: &str = "message";

/// Which recognised keys were present with the right type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFieldFlags {
    pub reminders: bool,
    pub calendar: bool,
    pub message: bool,
}

impl JsonFieldFlags {
    pub fn has_lists(&self) -> bool {
        self.reminders || self.calendar
    }

    pub fn is_empty(&self) -> bool {
        !(self.reminders || self.calendar || self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JsonFields<'a> {
    pub reminders: Option<&'a [Value]>,
    pub calendar: Option<&'a [Value]>,
    pub message: Option<&'a str>,
}

impl JsonFields<'_> {
    pub fn flags(&self) -> JsonFieldFlags {
        JsonFieldFlags {
            reminders: self.reminders.is_some(),
            calendar: self.calendar.is_some(),
            message: self.message.is_some(),
        }
    }
}

pub fn parse_payload(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(bytes)
}

pub fn extract_fields(doc: &Value) -> JsonFields<'_> {
    let Some(object) = doc.as_object() else {
        log::debug!("Payload is not a JSON object");
        return JsonFields::default();
    };

    let array_field = |key: &str| match object.get(key) {
        Some(Value::Array(items)) => Some(items.as_slice()),
        Some(_) => {
            log::debug!("Key {} is not an array, ignoring", key);
            None
        }
        None => {
            log::debug!("Key {} absent", key);
            None
        }
    };

    let message = match object.get(MESSAGE_KEY) {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(_) => {
            log::debug!("Key {} is not a string, ignoring", MESSAGE_KEY);
            None
        }
        None => {
            log::debug!("Key {} absent", MESSAGE_KEY);
            None
        }
    };

    JsonFields {
        reminders: array_field(REMINDERS_KEY),
        calendar: array_field(CALENDAR_KEY),
        message,
    }
}

/// Build a record list. Elements without string `title`, `date` and `time`
/// are skipped.
pub fn records_from(items: &[Value], kind: RecordKind) -> Vec<ReminderRecord> {
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match RecordFields::deserialize(item) {
            Ok(fields) => records.push(fields.into_record(kind)),
            Err(err) => {
                log::error!("Skipping {} entry {}: {}", kind.label(), index, err);
            }
        }
    }
    records
}
