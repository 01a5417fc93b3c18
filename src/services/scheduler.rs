//! Thread-based periodic scheduler and wall clock for desktop runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::traits::{Clock, PeriodicScheduler};

/// Runs each registered task on its own thread.
///
/// Periods are approximate (the OS sleep granularity applies). Dropping the
/// scheduler stops and joins every thread.
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl ThreadScheduler {
    /// Creates a scheduler with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of running tasks.
    pub fn task_count(&self) -> usize {
        self.threads.len()
    }
}

impl PeriodicScheduler for ThreadScheduler {
    type Error = std::io::Error;

    fn schedule_every<F>(&mut self, period_us: u32, mut task: F) -> Result<(), Self::Error>
    where
        F: FnMut() + Send + 'static,
    {
        let period = Duration::from_micros(period_us.max(1) as u64);
        let stop = Arc::clone(&self.stop);
        let handle = thread::Builder::new()
            .name(format!("sampler-{}", self.threads.len()))
            .spawn(move || {
                let mut next = Instant::now() + period;
                while !stop.load(Ordering::Acquire) {
                    task();
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    }
                    next += period;
                }
            })?;
        self.threads.push(handle);
        Ok(())
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                debug!("[Timer] Task thread panicked");
            }
        }
    }
}

/// Millisecond clock starting at zero when created.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    /// Creates a clock reading 0 now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn thread_scheduler_runs_task() {
        let count = Arc::new(AtomicU32::new(0));
        let mut scheduler = ThreadScheduler::new();
        let task_count = Arc::clone(&count);
        scheduler
            .schedule_every(1_000, move || {
                task_count.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(scheduler.task_count(), 1);

        thread::sleep(Duration::from_millis(50));
        drop(scheduler);

        let after_stop = count.load(Ordering::Relaxed);
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let first = clock.now_ms();
        thread::sleep(Duration::from_millis(5));
        assert!(clock.now_ms() >= first + 5);
    }
}
