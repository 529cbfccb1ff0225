//! Status LED seam.

pub trait StatusLed: Send {
    fn set(&mut self, on: bool);
}

impl<L: StatusLed + ?Sized> StatusLed for Box<L> {
    fn set(&mut self, on: bool) {
        (**self).set(on)
    }
}
