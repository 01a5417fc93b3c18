//! ESP32-C3 SuperMini hardware abstraction layer for the line monitor.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Inputs**: two dry contacts / open-drain outputs to GND, internal pull-ups
//! - **Indicators**: three LEDs (success, failure, activity)
//!
//! # Pin Assignments
//!
//! | GPIO | Use |
//! |------|-----|
//! | 6 | Line A input (pull-up) |
//! | 7 | Line B input (pull-up) |
//! | 2 | Success LED |
//! | 3 | Failure LED |
//! | 8 | Activity LED (onboard blue) |
//!
//! The pins are taken by field from `Peripherals` in `esp32_main`.

mod clock;
mod indicator;
mod lines;
mod mqtt;
mod timer;
mod wifi;

pub use clock::Esp32Clock;
pub use indicator::GpioIndicator;
pub use lines::Esp32Lines;
pub use mqtt::{Esp32MqttError, Esp32MqttTransport};
pub use timer::Esp32Scheduler;
pub use wifi::{Esp32Wifi, Esp32WifiError};
