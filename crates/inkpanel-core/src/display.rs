//! E-ink panel seam and the packed frame buffer behind it.
//!
//! Views draw into a 1bpp buffer first; the panel driver then pushes the
//! whole buffer to the controller in one transfer.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// A drawable panel that shows its contents on `update()`.
pub trait EinkPanel: DrawTarget<Color = BinaryColor> + Send {
    fn update(&mut self) -> Result<(), Self::Error>;
}

/// 1bpp frame buffer in the controller's native orientation.
///
/// The UC8151 is natively 128 sources x 296 gates (portrait). Views render in
/// landscape (296x128) and coordinates are transposed on write.
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    const NATIVE_WIDTH: u32 = DISPLAY_HEIGHT;
    const NATIVE_HEIGHT: u32 = DISPLAY_WIDTH;
    const NATIVE_WIDTH_BYTES: usize = (Self::NATIVE_WIDTH / 8) as usize;

    pub const BUFFER_SIZE: usize = Self::NATIVE_WIDTH_BYTES * Self::NATIVE_HEIGHT as usize;

    pub fn new() -> Self {
        Self {
            buffer: vec![0xFF; Self::BUFFER_SIZE], // White
        }
    }

    pub fn clear_white(&mut self) {
        self.buffer.fill(0xFF);
    }

    /// Set a pixel in landscape coordinates (x: 0-295, y: 0-127).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }

        // Rotate 90 degrees: landscape x runs down the gates.
        let native_x = (DISPLAY_HEIGHT - 1) - y;
        let native_y = x;

        let byte_index = native_y as usize * Self::NATIVE_WIDTH_BYTES + native_x as usize / 8;
        let bit_index = 7 - (native_x % 8); // MSB first

        if let Some(byte) = self.buffer.get_mut(byte_index) {
            if color == BinaryColor::On {
                // Black: clear bit
                *byte &= !(1 << bit_index);
            } else {
                *byte |= 1 << bit_index;
            }
        }
    }

    /// Raw buffer in native orientation.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
