//! Periodic timer seam.
//!
//! Timer callbacks run on the timer service's own task. They must only
//! enqueue actions; all state changes happen on the agent thread.

use core::time::Duration;

use crate::error::TimerError;

pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

pub trait PeriodicTimer: Send {
    /// (Re)start with the given period. The first callback fires one period
    /// from now.
    fn start(&mut self, period: Duration) -> Result<(), TimerError>;
    fn cancel(&mut self) -> Result<(), TimerError>;
    fn is_active(&self) -> bool;
}

pub trait TimerService: Send {
    fn periodic(
        &mut self,
        name: &'static str,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, TimerError>;
}

impl<T: TimerService + ?Sized> TimerService for Box<T> {
    fn periodic(
        &mut self,
        name: &'static str,
        callback: TimerCallback,
    ) -> Result<Box<dyn PeriodicTimer>, TimerError> {
        (**self).periodic(name, callback)
    }
}
