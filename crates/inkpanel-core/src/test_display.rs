//! Test panel that allows pixel overdraw.
//!
//! `MockDisplay` from embedded-graphics panics when a pixel is drawn twice,
//! which doesn't work for views that clear the screen then draw on top. This
//! framebuffer also counts `update()` calls so tests can see refreshes.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::display::EinkPanel;

pub struct TestDisplay {
    pixels: Vec<BinaryColor>,
    width: u32,
    height: u32,
    updates: usize,
}

impl TestDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![BinaryColor::Off; (width * height) as usize],
            width,
            height,
            updates: 0,
        }
    }

    /// Display matching the panel dimensions (296x128).
    pub fn default_size() -> Self {
        Self::new(crate::DISPLAY_WIDTH, crate::DISPLAY_HEIGHT)
    }

    /// Number of completed `update()` calls.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn black_pixels(&self) -> usize {
        self.pixels
            .iter()
            .filter(|pixel| **pixel == BinaryColor::On)
            .count()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x < self.width && y < self.height {
            self.pixels.get((y * self.width + x) as usize).copied()
        } else {
            None
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl DrawTarget for TestDisplay {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.width
                && (coord.y as u32) < self.height
            {
                let idx = (coord.y as u32 * self.width + coord.x as u32) as usize;
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for TestDisplay {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl EinkPanel for TestDisplay {
    fn update(&mut self) -> Result<(), Self::Error> {
        self.updates += 1;
        Ok(())
    }
}
