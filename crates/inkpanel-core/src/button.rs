//! Button input abstraction.

use crate::action::Action;
use crate::edge::MAX_PINS;
use crate::error::ConfigError;

pub const BUTTON_COUNT: usize = 5;

/// Physical panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Up,
    Down,
    A,
    B,
    // Reserved on boards that only wire four switches.
    C,
}

impl ButtonId {
    pub const ALL: [ButtonId; BUTTON_COUNT] = [Self::Up, Self::Down, Self::A, Self::B, Self::C];

    /// Action triggered by both short and long presses.
    pub fn default_action(self) -> Action {
        match self {
            Self::Up => Action::ScrollUp,
            Self::Down => Action::ScrollDown,
            Self::A => Action::ShowReminders,
            Self::B => Action::ShowEvents,
            Self::C => Action::ShowMain,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::A => 2,
            Self::B => 3,
            Self::C => 4,
        }
    }
}

/// Immutable 1:1 mapping between buttons and GPIO pins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonMap {
    pins: [Option<u8>; BUTTON_COUNT],
}

impl ButtonMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind `button` to `pin`. Rejects pins outside the edge table and pins
    /// already bound to another button.
    pub fn bind(mut self, button: ButtonId, pin: u8) -> Result<Self, ConfigError> {
        if pin as usize >= MAX_PINS {
            return Err(ConfigError::PinOutOfRange(pin));
        }
        if let Some(other) = self.button_for_pin(pin) {
            if other != button {
                return Err(ConfigError::PinAlreadyBound { pin, button: other });
            }
        }
        self.pins[button.index()] = Some(pin);
        Ok(self)
    }

    pub fn pin_for(&self, button: ButtonId) -> Option<u8> {
        self.pins[button.index()]
    }

    pub fn button_for_pin(&self, pin: u8) -> Option<ButtonId> {
        ButtonId::ALL
            .iter()
            .copied()
            .find(|button| self.pins[button.index()] == Some(pin))
    }

    pub fn action_for_pin(&self, pin: u8) -> Option<Action> {
        self.button_for_pin(pin).map(ButtonId::default_action)
    }

    /// Bound buttons in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ButtonId, u8)> + '_ {
        ButtonId::ALL
            .iter()
            .filter_map(|button| self.pin_for(*button).map(|pin| (*button, pin)))
    }
}
