//! Runtime status snapshot for the dashboard
//!
//! [`StatusSnapshot::compose`] is a pure function of its inputs. The window
//! decision is recomputed for `now`, so the snapshot shows what a tick would
//! do right now rather than what the last tick did.

use crate::publish_log::{serialize_iso, serialize_iso_opt};
use crate::scheduling::{ScheduleConfig, SchedulerState};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::time::Duration;

/// Feature switches reported to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FeatureFlags {
    pub publish_enabled: bool,
    pub update_bookings_enabled: bool,
    pub enable_battery_routes: bool,
    pub debug_mode: bool,
}

/// Everything a snapshot is composed from
pub struct StatusInputs<'a> {
    pub uptime: Duration,
    pub schedule: &'a ScheduleConfig,
    pub scheduler: &'a SchedulerState,
    pub cpu_temperature_c: Option<f64>,
    pub debug: bool,
    pub debug_sensors: &'a [String],
    pub flags: FeatureFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    pub active_start_hour: u32,
    pub active_end_hour: u32,
    pub every_minutes: u32,
    pub in_active_window: bool,
    pub should_send_now: bool,
    #[serde(serialize_with = "serialize_iso_opt")]
    pub last_tick: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_iso_opt")]
    pub last_publish_batch_at: Option<DateTime<Utc>>,
    pub last_publish_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    pub discovered: Vec<String>,
    pub cpu_temp_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugStatus {
    pub sensors: Vec<String>,
}

/// Read-only view of the engine for `/api/runtime-status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(serialize_with = "serialize_iso")]
    pub now: DateTime<Utc>,
    pub uptime_sec: u64,
    pub schedule: ScheduleStatus,
    pub sensors: SensorStatus,
    pub flags: FeatureFlags,
    pub debug: Option<DebugStatus>,
}

impl StatusSnapshot {
    pub fn compose<Tz: TimeZone>(now: &DateTime<Tz>, inputs: StatusInputs<'_>) -> Self {
        let decision = inputs.schedule.evaluate(now.hour(), now.minute());

        Self {
            now: now.with_timezone(&Utc),
            uptime_sec: inputs.uptime.as_secs_f64().round() as u64,
            schedule: ScheduleStatus {
                active_start_hour: inputs.schedule.active_start_hour,
                active_end_hour: inputs.schedule.active_end_hour,
                every_minutes: inputs.schedule.every_minutes,
                in_active_window: decision.in_active_window,
                should_send_now: decision.should_send,
                last_tick: inputs.scheduler.last_tick_at,
                last_publish_batch_at: inputs.scheduler.last_batch_at,
                last_publish_count: inputs.scheduler.last_batch_count,
            },
            sensors: SensorStatus {
                discovered: inputs.scheduler.discovered_sensors.clone(),
                cpu_temp_c: inputs.cpu_temperature_c,
            },
            flags: inputs.flags,
            debug: inputs.debug.then(|| DebugStatus {
                sensors: inputs.debug_sensors.to_vec(),
            }),
        }
    }
}
