//! # BASTU Core
//!
//! The scheduling-and-publishing engine behind the bastu sauna telemetry
//! daemon. This crate provides:
//!
//! - **Sensors**: hardware (1-Wire + CPU thermal zone) and simulated sources
//! - **Scheduling**: active-window/cadence decisions and the per-tick batch
//! - **Publishing**: fire-and-forget HTTP forwarding of readings
//! - **Publish log**: bounded in-memory history of publish attempts
//! - **Status**: runtime snapshot for the dashboard
//!
//! ## Quick Start
//!
//! ```no_run
//! use bastu_core::{EngineConfig, EngineState, HttpPublisher, Scheduler};
//! use std::sync::Arc;
//!
//! # async fn run() -> bastu_core::BastuResult<()> {
//! let config = EngineConfig::from_env()?;
//! let engine = Arc::new(EngineState::new(config));
//! let publisher = HttpPublisher::new(
//!     reqwest::Client::new(),
//!     &engine.config().upstream.publish_url,
//!     &engine.config().upstream.api_key,
//!     engine.publish_log().clone(),
//! );
//!
//! let scheduler = Scheduler::new(engine.clone(), Arc::new(publisher));
//! scheduler.tick();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod publish_log;
pub mod publisher;
pub mod scheduling;
pub mod sensors;
pub mod status;
pub mod upstream;

// Re-export commonly used types for easy access
pub use config::EngineConfig;
pub use engine::EngineState;
pub use error::{BastuError, BastuResult};
pub use publish_log::{PublishKind, PublishLog, PublishLogEntry};
pub use publisher::{HttpPublisher, Publish};
pub use scheduling::{ScheduleConfig, Scheduler, SchedulerState, TickOutcome};
pub use sensors::{SensorBackend, SensorReading, SensorSource};
pub use status::StatusSnapshot;
pub use upstream::{RefreshBookings, UpstreamClient};
