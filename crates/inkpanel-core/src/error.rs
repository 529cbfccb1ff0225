//! Error types for the panel core.
//!
//! Each collaborator seam has its own enum. [`Error`] aggregates them for
//! startup code that wires several collaborators together.

use thiserror::Error;

use crate::button::ButtonId;

/// Actor creation failures. Fatal in the binaries.
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("failed to spawn actor {name}: {reason}")]
    Spawn { name: String, reason: String },
    #[error("failed to apply thread configuration for {name}: {reason}")]
    Configure { name: String, reason: String },
}

/// Key-value store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("read of key {key} failed: {reason}")]
    Read { key: String, reason: String },
    #[error("write of key {key} failed: {reason}")]
    Write { key: String, reason: String },
    #[error("commit failed: {0}")]
    Commit(String),
}

/// Timer service failures.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("failed to create timer {name}: {reason}")]
    Create { name: &'static str, reason: String },
    #[error("failed to start timer {name}: {reason}")]
    Start { name: &'static str, reason: String },
    #[error("failed to cancel timer {name}: {reason}")]
    Cancel { name: &'static str, reason: String },
}

/// Weather source failures. Transient: logged, retried on the next poll.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("http error: {0}")]
    Http(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("response too large: {0} bytes")]
    ResponseTooLarge(usize),
    #[error("malformed weather response: {0}")]
    Parse(String),
    #[error("weather source not configured")]
    NotConfigured,
}

/// Inbox submission failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InboxError {
    #[error("payload of {len} bytes exceeds inbox capacity of {capacity} bytes")]
    Oversize { len: usize, capacity: usize },
    #[error("inbox full: {len} byte payload, {free} bytes free")]
    Full { len: usize, free: usize },
}

/// Invalid immutable configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pin {0} is outside the edge table")]
    PinOutOfRange(u8),
    #[error("pin {pin} is already bound to {button:?}")]
    PinAlreadyBound { pin: u8, button: ButtonId },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Actor(#[from] ActorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Inbox(#[from] InboxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
