//! Periodic sampler timer using the ESP-IDF timer service.

use std::time::Duration;

use crate::traits::PeriodicScheduler;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

/// Periodic scheduler backed by `esp_timer`.
///
/// Callbacks run on the ESP timer task, preempting the main loop. The
/// scheduler keeps every timer it creates alive; dropping it stops them.
pub struct Esp32Scheduler {
    service: EspTaskTimerService,
    timers: Vec<EspTimer<'static>>,
}

impl Esp32Scheduler {
    /// Take the timer service.
    pub fn new() -> Result<Self, EspError> {
        Ok(Self {
            service: EspTaskTimerService::new()?,
            timers: Vec::new(),
        })
    }
}

impl PeriodicScheduler for Esp32Scheduler {
    type Error = EspError;

    fn schedule_every<F>(&mut self, period_us: u32, task: F) -> Result<(), EspError>
    where
        F: FnMut() + Send + 'static,
    {
        let timer = self.service.timer(task)?;
        timer.every(Duration::from_micros(period_us as u64))?;
        self.timers.push(timer);
        Ok(())
    }
}
