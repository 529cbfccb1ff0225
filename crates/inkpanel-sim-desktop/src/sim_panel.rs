//! Panel backed by a simulator framebuffer shared with the window thread.
//!
//! SDL windows must stay on the main thread, while the agent runs on its own
//! actor thread. The agent draws into the shared frame and `update()` marks
//! it dirty; the main loop copies dirty frames to the window.

use core::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use embedded_graphics_simulator::SimulatorDisplay;
use inkpanel_core::{EinkPanel, DISPLAY_HEIGHT, DISPLAY_WIDTH};

struct Frame {
    display: SimulatorDisplay<BinaryColor>,
    dirty: bool,
    updates: usize,
}

#[derive(Clone)]
pub struct SharedFrame {
    inner: Arc<Mutex<Frame>>,
}

impl SharedFrame {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Frame {
                display: SimulatorDisplay::new(Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)),
                dirty: true,
                updates: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Frame> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `show` on the frame if it changed since the last call.
    pub fn present_if_dirty(&self, show: impl FnOnce(&SimulatorDisplay<BinaryColor>)) -> bool {
        let mut frame = self.lock();
        if !frame.dirty {
            return false;
        }
        frame.dirty = false;
        show(&frame.display);
        true
    }

    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    pub fn panel(&self) -> SimPanel {
        SimPanel {
            frame: self.clone(),
        }
    }
}

impl Default for SharedFrame {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimPanel {
    frame: SharedFrame,
}

impl DrawTarget for SimPanel {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame.lock().display.draw_iter(pixels)
    }
}

impl OriginDimensions for SimPanel {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl EinkPanel for SimPanel {
    fn update(&mut self) -> Result<(), Self::Error> {
        let mut frame = self.frame.lock();
        frame.dirty = true;
        frame.updates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn update_marks_frame_dirty_once() {
        let shared = SharedFrame::new();
        assert!(shared.present_if_dirty(|_| {}));
        assert!(!shared.present_if_dirty(|_| {}));

        let mut panel = shared.panel();
        Rectangle::new(Point::new(2, 2), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut panel)
            .unwrap();
        assert!(!shared.present_if_dirty(|_| {}));
        panel.update().unwrap();

        let mut seen = None;
        assert!(shared.present_if_dirty(|display| seen = Some(display.size())));
        assert_eq!(seen, Some(Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)));
        assert_eq!(shared.update_count(), 1);
    }
}
