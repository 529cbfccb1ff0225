//! Commands understood by the agent dispatch loop.

/// One unit of work for the panel agent. Carries no payload; everything the
/// handler needs lives in agent-owned state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    RefreshScreen,
    PollWeather,
    /// Button A: reminder list.
    ShowReminders,
    /// Button B: event list.
    ShowEvents,
    /// Button C: status screen.
    ShowMain,
    /// Clock timer fired.
    ClockTick,
    /// Blink timer fired.
    BlinkTick,
}
