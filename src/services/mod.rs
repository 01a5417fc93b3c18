//! Desktop runtime services.
//!
//! These back the hardware and network traits on a regular OS so the whole
//! pipeline can run against a real broker without a board:
//! - `mqtt`: `rumqttc` transport driven by a tokio task
//! - `scheduler`: thread-based periodic scheduler and wall clock
//!
//! ```ignore
//! let runtime = tokio::runtime::Runtime::new()?;
//! let transport = RumqttTransport::new(runtime.handle().clone());
//! let mut scheduler = ThreadScheduler::new();
//! startup::register_sampler(&mut scheduler, sampler, config.timing.sample_period_us)?;
//! ```

pub mod mqtt;
pub mod scheduler;

pub use mqtt::*;
pub use scheduler::*;
