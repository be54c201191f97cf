#![cfg_attr(not(test), no_std)]

//! HUB75 (64x32, 1/16 scan) RGB LED matrix driver primitives.
//!
//! The panel has no memory of its own: [`Hub75::refresh`] must be called
//! continuously to keep an image on it. Color depth comes from binary-coded
//! bit planes, global brightness from the output-enable on-time.

mod framebuffer;
pub mod protocol;

pub use framebuffer::{FrameBuffer, PIXELS};

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use protocol::{ADDRESS_LINES, ColorBits, MAX_BIT_PLANES, SCAN_ROWS, WIDTH};

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Bit planes per channel, 1..=5.
    pub bit_planes: u8,
    /// On-time of the least significant plane at full brightness.
    pub base_on_time_ns: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bit_planes: 4,
            base_on_time_ns: 400,
        }
    }
}

/// The thirteen HUB75 control and data lines.
#[derive(Debug)]
pub struct Pins<P> {
    pub r1: P,
    pub g1: P,
    pub b1: P,
    pub r2: P,
    pub g2: P,
    pub b2: P,
    /// Address lines `A`..`D`.
    pub address: [P; ADDRESS_LINES],
    pub clk: P,
    pub lat: P,
    /// Output enable, active low.
    pub oe: P,
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<PinErr> {
    /// A GPIO write failed.
    Pin(PinErr),
    /// Input parameters are outside supported bounds.
    InvalidInput,
}

pub type DriverResult<PinErr> = Result<(), Error<PinErr>>;

/// HUB75 driver over bit-banged GPIO.
#[derive(Debug)]
pub struct Hub75<P, D> {
    pins: Pins<P>,
    delay: D,
    config: Config,
    brightness: u8,
}

impl<P, D> Hub75<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Creates a new driver instance with the panel blanked.
    pub fn new(pins: Pins<P>, delay: D, config: Config) -> Result<Self, Error<P::Error>> {
        if !(1..=MAX_BIT_PLANES).contains(&config.bit_planes) {
            return Err(Error::InvalidInput);
        }

        let mut driver = Self {
            pins,
            delay,
            config,
            brightness: u8::MAX,
        };
        driver.blank()?;
        Ok(driver)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Applies from the next refreshed row on.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Turns all LEDs off until the next row is shown.
    pub fn blank(&mut self) -> DriverResult<P::Error> {
        self.pins.oe.set_high().map_err(Error::Pin)
    }

    /// Scans every row through every bit plane once.
    pub fn refresh(&mut self, buffer: &FrameBuffer) -> DriverResult<P::Error> {
        for plane in 0..self.config.bit_planes {
            for row in 0..SCAN_ROWS {
                self.show_row(buffer, row, plane)?;
            }
        }

        self.blank()
    }

    fn show_row(&mut self, buffer: &FrameBuffer, row: usize, plane: u8) -> DriverResult<P::Error> {
        let (upper, lower) = buffer.row_pair(row).ok_or(Error::InvalidInput)?;
        let planes = self.config.bit_planes;

        for x in 0..WIDTH {
            let top = protocol::plane_bits(upper[x], plane, planes);
            let bottom = protocol::plane_bits(lower[x], plane, planes);
            self.shift_column(top, bottom)?;
        }

        let levels = protocol::address_levels(row).ok_or(Error::InvalidInput)?;

        self.blank()?;
        for (pin, high) in self.pins.address.iter_mut().zip(levels) {
            set_level(pin, high)?;
        }
        self.pins.lat.set_high().map_err(Error::Pin)?;
        self.pins.lat.set_low().map_err(Error::Pin)?;

        let on_ns = protocol::on_time_ns(self.config.base_on_time_ns, plane, self.brightness);
        if on_ns > 0 {
            self.pins.oe.set_low().map_err(Error::Pin)?;
            self.delay.delay_ns(on_ns);
        }

        Ok(())
    }

    fn shift_column(&mut self, top: ColorBits, bottom: ColorBits) -> DriverResult<P::Error> {
        set_level(&mut self.pins.r1, top.r)?;
        set_level(&mut self.pins.g1, top.g)?;
        set_level(&mut self.pins.b1, top.b)?;
        set_level(&mut self.pins.r2, bottom.r)?;
        set_level(&mut self.pins.g2, bottom.g)?;
        set_level(&mut self.pins.b2, bottom.b)?;

        self.pins.clk.set_high().map_err(Error::Pin)?;
        self.pins.clk.set_low().map_err(Error::Pin)
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> DriverResult<P::Error> {
    if high {
        pin.set_high().map_err(Error::Pin)
    } else {
        pin.set_low().map_err(Error::Pin)
    }
}
