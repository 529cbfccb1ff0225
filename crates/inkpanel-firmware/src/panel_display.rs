//! UC8151 2.9" e-ink panel over SPI.
//!
//! Views draw into the shared [`FrameBuffer`]; `update()` pushes the whole
//! buffer and runs a full refresh, powering the panel down afterwards.

use core::fmt::Debug;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use esp_idf_svc::hal::delay::FreeRtos;
use inkpanel_core::display::FrameBuffer;
use inkpanel_core::{EinkPanel, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Full refreshes take ~2s; anything past this is a wiring fault.
const BUSY_TIMEOUT_MS: u32 = 10_000;

mod cmd {
    pub const PSR: u8 = 0x00;
    pub const POF: u8 = 0x02;
    pub const PON: u8 = 0x04;
    pub const DTM2: u8 = 0x13;
    pub const DRF: u8 = 0x12;
    pub const CDI: u8 = 0x50;
    pub const TRES: u8 = 0x61;
}

// 128x296, OTP LUT, black/white, scan up, shift right, booster on, no reset.
const PSR_FLAGS: u8 = 0x9F;
const CDI_FLAGS: u8 = 0x97;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("SPI write failed: {0}")]
    Spi(String),
    #[error("panel pin error: {0}")]
    Pin(String),
    #[error("panel stayed busy for {0}ms")]
    Timeout(u32),
}

pub struct UcPanel<SPI, DC, RST, BUSY> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    frame: FrameBuffer,
    delay: FreeRtos,
}

impl<SPI, DC, RST, BUSY> UcPanel<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            frame: FrameBuffer::new(),
            delay: FreeRtos,
        }
    }

    /// Hardware reset followed by panel configuration.
    pub fn init(&mut self) -> Result<(), PanelError> {
        self.reset()?;
        self.busy_wait()?;
        self.command(cmd::PSR, &[PSR_FLAGS])?;
        let height = DISPLAY_WIDTH as u16;
        self.command(
            cmd::TRES,
            &[DISPLAY_HEIGHT as u8, (height >> 8) as u8, height as u8],
        )?;
        self.command(cmd::CDI, &[CDI_FLAGS])?;
        log::info!("UC8151 initialised");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), PanelError> {
        self.rst.set_low().map_err(pin_err)?;
        self.delay.delay_ms(10);
        self.rst.set_high().map_err(pin_err)?;
        self.delay.delay_ms(10);
        Ok(())
    }

    // BUSY is active low on this controller.
    fn busy_wait(&mut self) -> Result<(), PanelError> {
        let mut waited = 0u32;
        while self.busy.is_low().map_err(pin_err)? {
            self.delay.delay_ms(1);
            waited += 1;
            if waited >= BUSY_TIMEOUT_MS {
                return Err(PanelError::Timeout(waited));
            }
        }
        Ok(())
    }

    fn command(&mut self, command: u8, data: &[u8]) -> Result<(), PanelError> {
        self.dc.set_low().map_err(pin_err)?;
        self.spi
            .write(&[command])
            .map_err(|err| PanelError::Spi(format!("{:?}", err)))?;
        if !data.is_empty() {
            self.dc.set_high().map_err(pin_err)?;
            self.spi
                .write(data)
                .map_err(|err| PanelError::Spi(format!("{:?}", err)))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PanelError> {
        self.command(cmd::PON, &[])?;
        self.busy_wait()?;

        self.dc.set_low().map_err(pin_err)?;
        self.spi
            .write(&[cmd::DTM2])
            .map_err(|err| PanelError::Spi(format!("{:?}", err)))?;
        self.dc.set_high().map_err(pin_err)?;
        // Chunked so no single transfer exceeds the DMA limit.
        for chunk in self.frame.buffer().chunks(1024) {
            self.spi
                .write(chunk)
                .map_err(|err| PanelError::Spi(format!("{:?}", err)))?;
        }

        self.command(cmd::DRF, &[])?;
        self.busy_wait()?;
        self.command(cmd::POF, &[])
    }
}

fn pin_err<E: Debug>(err: E) -> PanelError {
    PanelError::Pin(format!("{:?}", err))
}

impl<SPI, DC, RST, BUSY> DrawTarget for UcPanel<SPI, DC, RST, BUSY> {
    type Color = BinaryColor;
    type Error = PanelError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        match self.frame.draw_iter(pixels) {
            Ok(()) => Ok(()),
            Err(never) => match never {},
        }
    }

    fn clear(&mut self, color: BinaryColor) -> Result<(), Self::Error> {
        if color == BinaryColor::Off {
            self.frame.clear_white();
            Ok(())
        } else {
            let area = self.bounding_box();
            self.fill_solid(&area, color)
        }
    }
}

impl<SPI, DC, RST, BUSY> OriginDimensions for UcPanel<SPI, DC, RST, BUSY> {
    fn size(&self) -> Size {
        self.frame.size()
    }
}

impl<SPI, DC, RST, BUSY> EinkPanel for UcPanel<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice + Send,
    SPI::Error: Debug,
    DC: OutputPin + Send,
    RST: OutputPin + Send,
    BUSY: InputPin + Send,
{
    fn update(&mut self) -> Result<(), PanelError> {
        let started = std::time::Instant::now();
        self.flush()?;
        log::info!("Panel refreshed in {}ms", started.elapsed().as_millis());
        Ok(())
    }
}
