use embedded_hal::{delay::DelayNs, digital::OutputPin};
use hub75::{Config, Error as Hub75Error, FrameBuffer, Hub75, Pins};

/// Wiring used by the board, as GPIO numbers.
pub const PIN_MAP: &str = "R1=4 G1=5 B1=6 R2=7 G2=15 B2=16 A=17 B=18 C=8 D=9 CLK=10 LAT=11 OE=12";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PanelError<PinErr> {
    Pin(PinErr),
    Protocol,
}

impl<PinErr> PanelError<PinErr> {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pin(_) => "pin",
            Self::Protocol => "protocol",
        }
    }
}

impl<PinErr> From<Hub75Error<PinErr>> for PanelError<PinErr> {
    fn from(err: Hub75Error<PinErr>) -> Self {
        match err {
            Hub75Error::Pin(err) => Self::Pin(err),
            Hub75Error::InvalidInput => Self::Protocol,
        }
    }
}

pub type MatrixResult<PinErr> = Result<(), PanelError<PinErr>>;

/// Board-level adapter for the 64x32 HUB75 matrix.
///
/// The panel is refresh-driven, so [`MatrixPanel::refresh`] must run on every
/// control-loop iteration, not just when a new frame is rendered.
#[derive(Debug)]
pub struct MatrixPanel<P, D> {
    driver: Hub75<P, D>,
    fault_logged: bool,
}

impl<P, D> MatrixPanel<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(pins: Pins<P>, delay: D) -> Result<Self, PanelError<P::Error>> {
        let driver = Hub75::new(pins, delay, Config::default())?;
        Ok(Self {
            driver,
            fault_logged: false,
        })
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        if self.driver.brightness() != brightness {
            log::debug!("matrix: brightness {}", brightness);
            self.driver.set_brightness(brightness);
        }
    }

    /// Scans one full frame. Only the first failure is logged.
    pub fn refresh(&mut self, frame: &FrameBuffer) -> MatrixResult<P::Error> {
        let result = self.driver.refresh(frame).map_err(PanelError::from);
        if let Err(err) = &result
            && !self.fault_logged
        {
            log::warn!("matrix: refresh failed ({})", err.as_str());
            self.fault_logged = true;
        }
        result
    }

    pub fn blank(&mut self) -> MatrixResult<P::Error> {
        self.driver.blank().map_err(PanelError::from)
    }
}
