//! Boot sequence.
//!
//! Both steps are fatal on failure: the caller logs the [`StartupError`]
//! and exits with [`StartupError::exit_code`].

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::WifiConfig;
use crate::error::StartupError;
use crate::sampler::Sampler;
use crate::traits::{AssociateError, LineInput, NetworkBearer, PeriodicScheduler};

/// Register `sampler` to run every `period_us` microseconds.
///
/// ```
/// use rs_linewatch::{startup, ChangeBuffer, LineValues, Sampler, StartupError};
/// use rs_linewatch::hal::{MockLines, MockScheduler};
///
/// static CHANGES: ChangeBuffer = ChangeBuffer::new();
/// let lines: &'static MockLines = Box::leak(Box::new(MockLines::new(LineValues::default())));
///
/// let mut scheduler = MockScheduler::failing();
/// let err = startup::register_sampler(&mut scheduler, Sampler::new(lines, &CHANGES), 1_000);
/// assert_eq!(err, Err(StartupError::TimerRegistration));
/// ```
pub fn register_sampler<P, L>(
    scheduler: &mut P,
    mut sampler: Sampler<'static, L>,
    period_us: u32,
) -> Result<(), StartupError>
where
    P: PeriodicScheduler,
    L: LineInput + Send + 'static,
{
    match scheduler.schedule_every(period_us, move || {
        sampler.sample();
    }) {
        Ok(()) => {
            info!("[Timer] Sampler running every {} us", period_us);
            Ok(())
        }
        Err(e) => {
            error!("[Timer] Failed to add timer: {:?}", e);
            Err(StartupError::TimerRegistration)
        }
    }
}

/// Bring up the WiFi link and report the acquired address.
///
/// Returns `Ok(None)` when WiFi is disabled in `wifi`, or when the link is
/// up but no address could be read.
pub fn bring_up_network<B: NetworkBearer>(
    bearer: &mut B,
    wifi: &WifiConfig,
) -> Result<Option<Ipv4Addr>, StartupError> {
    if !wifi.enabled {
        info!("[WiFi] Disabled, skipping network bring-up");
        return Ok(None);
    }
    if let Err(e) = wifi.validate() {
        error!("[WiFi] Invalid configuration: {}", e);
        return Err(e.into());
    }
    if !wifi.is_configured() {
        warn!("[WiFi] No SSID configured");
    }

    if let Err(e) = bearer.initialize() {
        error!("[WiFi] Initialization failed: {:?}", e);
        return Err(StartupError::NetworkInit);
    }

    info!("[WiFi] Connecting to {}...", wifi.ssid);
    match bearer.associate(
        wifi.ssid.as_str(),
        wifi.password.as_str(),
        wifi.connect_timeout_ms,
    ) {
        Ok(()) => {}
        Err(AssociateError::Timeout) => {
            error!(
                "[WiFi] Connection timed out after {} ms",
                wifi.connect_timeout_ms
            );
            return Err(StartupError::AssociationTimeout {
                timeout_ms: wifi.connect_timeout_ms,
            });
        }
        Err(AssociateError::Failed(e)) => {
            error!("[WiFi] Connection failed: {:?}", e);
            return Err(StartupError::AssociationFailed);
        }
    }

    match bearer.ip_addr() {
        Some(ip) => {
            info!("[WiFi] Connected! IP: {}", ip);
            Ok(Some(ip))
        }
        None => {
            error!("[WiFi] Error getting IP");
            Ok(None)
        }
    }
}
