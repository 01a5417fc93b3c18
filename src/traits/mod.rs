//! Trait definitions for hardware abstraction and networking.
//!
//! This module defines the core abstractions that allow rs-linewatch to:
//! - Run on different hardware (ESP32, desktop simulation, mocks)
//! - Use different MQTT client implementations
//!
//! # Submodules
//!
//! - `hardware`: Input lines, status indicators, periodic scheduler, clock
//! - `network`: MQTT transport and network bearer traits

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
