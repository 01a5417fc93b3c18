//! WiFi station bring-up for ESP32-C3.
//!
//! # Example
//!
//! ```ignore
//! use rs_linewatch::hal::esp32::Esp32Wifi;
//! use rs_linewatch::{startup, WifiConfig};
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let mut wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs));
//! let ip = startup::bring_up_network(&mut wifi, &config)?;
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::traits::{AssociateError, NetworkBearer};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{EspError, ESP_ERR_TIMEOUT};
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use thiserror::Error;

/// WiFi driver failure.
#[derive(Debug, Error)]
pub enum Esp32WifiError {
    /// `initialize()` was called twice.
    #[error("WiFi driver already initialized")]
    AlreadyInitialized,
    /// `associate()` was called before `initialize()`.
    #[error("WiFi driver not initialized")]
    NotInitialized,
    /// SSID over 32 bytes or password over 64 bytes.
    #[error("WiFi {0} too long")]
    CredentialTooLong(&'static str),
    /// ESP-IDF returned an error.
    #[error("ESP-IDF error: {0}")]
    Driver(#[from] EspError),
}

struct Parts {
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
}

/// Station-mode WiFi bearer.
///
/// Holds the peripherals until [`initialize`](NetworkBearer::initialize)
/// creates the driver. The link stays up for the lifetime of this struct.
pub struct Esp32Wifi {
    parts: Option<Parts>,
    wifi: Option<BlockingWifi<EspWifi<'static>>>,
}

impl Esp32Wifi {
    /// Creates the bearer without touching the radio.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Self {
        Self {
            parts: Some(Parts {
                modem,
                sysloop,
                nvs,
            }),
            wifi: None,
        }
    }

    fn timed_out(e: &EspError) -> bool {
        e.code() == ESP_ERR_TIMEOUT as i32
    }
}

impl NetworkBearer for Esp32Wifi {
    type Error = Esp32WifiError;

    fn initialize(&mut self) -> Result<(), Esp32WifiError> {
        let parts = self
            .parts
            .take()
            .ok_or(Esp32WifiError::AlreadyInitialized)?;

        let esp_wifi = EspWifi::new(parts.modem, parts.sysloop.clone(), parts.nvs)?;
        let wifi = BlockingWifi::wrap(esp_wifi, parts.sysloop)?;
        self.wifi = Some(wifi);
        Ok(())
    }

    fn associate(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<(), AssociateError<Esp32WifiError>> {
        let wifi = self
            .wifi
            .as_mut()
            .ok_or(AssociateError::Failed(Esp32WifiError::NotInitialized))?;
        let driver = |e: EspError| AssociateError::Failed(Esp32WifiError::Driver(e));

        let too_long = |what| AssociateError::Failed(Esp32WifiError::CredentialTooLong(what));

        // esp-idf expects fixed-capacity strings
        let mut ssid_buf: heapless::String<32> = heapless::String::new();
        ssid_buf.push_str(ssid).map_err(|()| too_long("SSID"))?;
        let mut pass_buf: heapless::String<64> = heapless::String::new();
        pass_buf.push_str(password).map_err(|()| too_long("password"))?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf,
            password: pass_buf,
            ..Default::default()
        }))
        .map_err(driver)?;

        wifi.start().map_err(driver)?;
        wifi.wifi_mut().connect().map_err(driver)?;

        let timeout = Some(Duration::from_millis(timeout_ms as u64));
        let wait = wifi
            .wifi_wait_while(|| wifi.is_connected().map(|up| !up), timeout)
            .and_then(|()| wifi.ip_wait_while(|| wifi.is_up().map(|up| !up), timeout));

        match wait {
            Ok(()) => Ok(()),
            Err(e) if Self::timed_out(&e) => Err(AssociateError::Timeout),
            Err(e) => Err(driver(e)),
        }
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .as_ref()?
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }
}
