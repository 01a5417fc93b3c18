//! Status LEDs on plain GPIO outputs.

use crate::traits::{Indicator, StatusIndicator};
use embedded_hal::digital::OutputPin;

/// Three LEDs driven through any `embedded-hal` output pin.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::{OutputPin, PinDriver};
/// use rs_linewatch::hal::esp32::GpioIndicator;
///
/// let indicator = GpioIndicator::new(
///     PinDriver::output(peripherals.pins.gpio2.downgrade_output())?,
///     PinDriver::output(peripherals.pins.gpio3.downgrade_output())?,
///     PinDriver::output(peripherals.pins.gpio8.downgrade_output())?,
/// );
/// ```
pub struct GpioIndicator<P: OutputPin> {
    success: P,
    failure: P,
    activity: P,
}

impl<P: OutputPin> GpioIndicator<P> {
    /// Wraps the three LED pins.
    pub fn new(success: P, failure: P, activity: P) -> Self {
        Self {
            success,
            failure,
            activity,
        }
    }
}

impl<P: OutputPin> StatusIndicator for GpioIndicator<P> {
    type Error = P::Error;

    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), Self::Error> {
        let pin = match indicator {
            Indicator::Success => &mut self.success,
            Indicator::Failure => &mut self.failure,
            Indicator::Activity => &mut self.activity,
        };
        if on {
            pin.set_high()
        } else {
            pin.set_low()
        }
    }
}
