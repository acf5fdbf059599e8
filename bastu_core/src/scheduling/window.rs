//! Active-window and cadence decision
//!
//! A batch is due when the hour falls inside `[start, end)` and the minute is
//! on the cadence, or unconditionally at the top of every hour (heartbeat).

use crate::error::{BastuError, BastuResult};
use serde::Serialize;
use std::fmt;

/// Publishing schedule, fixed for the life of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub active_start_hour: u32,
    pub active_end_hour: u32,
    pub every_minutes: u32,
}

/// Outcome of evaluating the schedule for one wall-clock minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDecision {
    pub in_active_window: bool,
    pub should_send: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            active_start_hour: 6,
            active_end_hour: 22,
            every_minutes: 5,
        }
    }
}

impl ScheduleConfig {
    /// Validated constructor
    pub fn new(active_start_hour: u32, active_end_hour: u32, every_minutes: u32) -> BastuResult<Self> {
        if active_start_hour > 23 {
            return Err(BastuError::config(
                "SCHEDULE_ACTIVE_START_HOUR",
                format!("{} is not an hour in 0..=23", active_start_hour),
            ));
        }
        // The end is exclusive, so 24 puts hour 23 inside the window.
        if active_end_hour > 24 {
            return Err(BastuError::config(
                "SCHEDULE_ACTIVE_END_HOUR",
                format!("{} is not an end hour in 0..=24", active_end_hour),
            ));
        }
        if every_minutes == 0 {
            return Err(BastuError::config(
                "SCHEDULE_EVERY_MINUTES",
                "must be greater than 0",
            ));
        }

        Ok(Self {
            active_start_hour,
            active_end_hour,
            every_minutes,
        })
    }

    pub fn in_active_window(&self, hour: u32) -> bool {
        hour >= self.active_start_hour && hour < self.active_end_hour
    }

    /// Decide whether a batch is due at `hour:minute` local time
    pub fn evaluate(&self, hour: u32, minute: u32) -> WindowDecision {
        let in_active_window = self.in_active_window(hour);
        // Top of the hour always sends, even outside the window.
        let should_send = (in_active_window && minute % self.every_minutes == 0) || minute == 0;

        WindowDecision {
            in_active_window,
            should_send,
        }
    }
}

impl fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "every {} min in [{:02}:00, {:02}:00)",
            self.every_minutes, self.active_start_hour, self.active_end_hour
        )
    }
}
