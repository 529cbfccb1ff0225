use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use inkpanel_core::StatusLed;

/// Active-high status LED on a plain GPIO.
pub struct GpioLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl GpioLed {
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl StatusLed for GpioLed {
    fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(err) = result {
            log::warn!("LED write failed: {}", err);
        }
    }
}
