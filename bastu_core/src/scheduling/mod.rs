//! Scheduling for sampling and publishing
//!
//! - [`ScheduleConfig`] decides *when* a batch is due (active window, cadence,
//!   top-of-hour heartbeat)
//! - [`Scheduler`] runs one tick: discover, decide, read, publish

pub mod scheduler;
pub mod window;

pub use scheduler::{Scheduler, SchedulerState, TickOutcome};
pub use window::{ScheduleConfig, WindowDecision};
