//! GPIO interrupts feeding the global edge demultiplexer.

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_svc::sys::{self, EspError};
use inkpanel_core::{Edge, EdgeDemultiplexer};

/// Owns the switch pin drivers so their ISR subscriptions stay alive.
pub struct GpioEdgeSource {
    pins: Vec<PinDriver<'static, AnyIOPin, Input>>,
}

impl GpioEdgeSource {
    /// Configure each pin as a pulled-up input interrupting on both edges.
    pub fn new(pins: impl IntoIterator<Item = (u8, AnyIOPin)>) -> Result<Self, EspError> {
        let mut drivers = Vec::new();
        for (pin, io) in pins {
            let mut driver = PinDriver::input(io)?;
            driver.set_pull(Pull::Up)?;
            driver.set_interrupt_type(InterruptType::AnyEdge)?;
            unsafe {
                driver.subscribe(move || on_pin_edge(pin))?;
            }
            driver.enable_interrupt()?;
            log::info!("GPIO {} armed for edge interrupts", pin);
            drivers.push(driver);
        }
        Ok(Self { pins: drivers })
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }
}

/// Interrupt context: read the level, forward, re-arm. No logging.
fn on_pin_edge(pin: u8) {
    let gpio = pin as sys::gpio_num_t;
    let level = unsafe { sys::gpio_get_level(gpio) } != 0;
    EdgeDemultiplexer::global().on_edge(pin, Edge::from_level(level));
    // The HAL disables the interrupt after each notification.
    unsafe {
        sys::gpio_intr_enable(gpio);
    }
}
