//! GPIO input lines for ESP32.
//!
//! # Wiring
//!
//! - Line A → GPIO6
//! - Line B → GPIO7
//! - Contacts close to GND; internal pull-ups hold the idle level high

use crate::lines::{LineId, Polarity};
use crate::traits::LineInput;
use esp_idf_hal::gpio::{Gpio6, Gpio7, Input, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

/// The two monitored inputs.
///
/// Shared between the sampler timer and the foreground loop, usually behind
/// an `Arc`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use rs_linewatch::hal::esp32::Esp32Lines;
/// use rs_linewatch::Polarity;
///
/// let peripherals = Peripherals::take()?;
/// let lines = Arc::new(Esp32Lines::new(
///     peripherals.pins.gpio6,
///     peripherals.pins.gpio7,
///     Polarity::ActiveLow,
/// )?);
/// ```
pub struct Esp32Lines<'d, A, B>
where
    A: InputPin + OutputPin,
    B: InputPin + OutputPin,
{
    line_a: PinDriver<'d, A, Input>,
    line_b: PinDriver<'d, B, Input>,
    polarity: Polarity,
}

impl<'d, A, B> Esp32Lines<'d, A, B>
where
    A: InputPin + OutputPin,
    B: InputPin + OutputPin,
{
    /// Configures both pins as inputs with internal pull-ups.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        line_a: impl Peripheral<P = A> + 'd,
        line_b: impl Peripheral<P = B> + 'd,
        polarity: Polarity,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut line_a = PinDriver::input(line_a)?;
        let mut line_b = PinDriver::input(line_b)?;

        line_a.set_pull(Pull::Up)?;
        line_b.set_pull(Pull::Up)?;

        Ok(Self {
            line_a,
            line_b,
            polarity,
        })
    }
}

impl<A, B> LineInput for Esp32Lines<'_, A, B>
where
    A: InputPin + OutputPin,
    B: InputPin + OutputPin,
{
    fn read(&self, line: LineId) -> bool {
        let raw_high = match line {
            LineId::A => self.line_a.is_high(),
            LineId::B => self.line_b.is_high(),
        };
        self.polarity.logical(raw_high)
    }
}

// The sampler timer task and the main loop share one `Esp32Lines` behind
// an `Arc`; `PinDriver` is `Send + Sync` for input pins.
const _: fn() = assert_shareable::<Esp32Lines<'static, Gpio6, Gpio7>>;

fn assert_shareable<T: Send + Sync>() {}
