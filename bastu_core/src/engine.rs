//! Shared engine state
//!
//! [`EngineState`] is the one owned place holding everything the tick loop
//! mutates and the HTTP handlers read: configuration, both sensor sources,
//! the debug flag, the publish log and the scheduler state. It is shared
//! behind an `Arc`; there are no module-level singletons.

use crate::config::EngineConfig;
use crate::publish_log::{PublishLog, PublishLogEntry};
use crate::scheduling::SchedulerState;
use crate::sensors::{
    SensorBackend, SensorReading, SensorSource, SimulatedSensorSource, W1SensorSource,
    CPU_SENSOR_ID,
};
use crate::status::{FeatureFlags, StatusInputs, StatusSnapshot};
use chrono::{DateTime, TimeZone};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct EngineState {
    config: EngineConfig,
    started_at: Instant,
    debug: AtomicBool,
    hardware: W1SensorSource,
    simulated: SimulatedSensorSource,
    publish_log: Arc<PublishLog>,
    scheduler: RwLock<SchedulerState>,
}

impl EngineState {
    pub fn new(config: EngineConfig) -> Self {
        let hardware = W1SensorSource::new(config.sensors.clone());
        let simulated =
            SimulatedSensorSource::new(config.debug_sensors.clone(), config.simulation.clone());
        let publish_log = Arc::new(PublishLog::new(config.publish_log_capacity));

        Self {
            debug: AtomicBool::new(config.debug_mode),
            started_at: Instant::now(),
            hardware,
            simulated,
            publish_log,
            scheduler: RwLock::new(SchedulerState::default()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::SeqCst)
    }

    /// Switch between hardware and simulated sensors
    ///
    /// Always records one debug-toggle entry in the publish log, even when the
    /// mode does not change. Returns the previous value.
    pub fn set_debug(&self, enabled: bool) -> bool {
        let previous = self.debug.swap(enabled, Ordering::SeqCst);
        self.publish_log.append(PublishLogEntry::debug_toggle(enabled));
        tracing::info!("Debug mode {} -> {}", previous, enabled);
        previous
    }

    pub fn backend(&self) -> SensorBackend {
        SensorBackend::from_debug_flag(self.is_debug())
    }

    /// The sensor source selected by the debug flag right now
    pub fn sensors(&self) -> &dyn SensorSource {
        match self.backend() {
            SensorBackend::Hardware => &self.hardware,
            SensorBackend::Simulation => &self.simulated,
        }
    }

    pub fn debug_sensors(&self) -> &[String] {
        self.simulated.sensor_names()
    }

    pub fn publish_log(&self) -> &Arc<PublishLog> {
        &self.publish_log
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.read().clone()
    }

    pub(crate) fn update_scheduler<F: FnOnce(&mut SchedulerState)>(&self, update: F) {
        let mut state = self.scheduler.write();
        update(&mut *state);
    }

    /// Read every currently discoverable sensor without publishing
    pub fn current_readings(&self) -> Vec<SensorReading> {
        self.sensors().read_all()
    }

    pub fn cpu_temperature(&self) -> Option<f64> {
        self.sensors().read(CPU_SENSOR_ID).temperature_c
    }

    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags {
            publish_enabled: self.config.publish_enabled,
            update_bookings_enabled: self.config.update_bookings_enabled,
            enable_battery_routes: self.config.battery_routes_enabled,
            debug_mode: self.is_debug(),
        }
    }

    /// Runtime status as of `now`
    pub fn status_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> StatusSnapshot {
        let scheduler = self.scheduler_state();
        let debug = self.is_debug();

        StatusSnapshot::compose(
            now,
            StatusInputs {
                uptime: self.uptime(),
                schedule: &self.config.schedule,
                scheduler: &scheduler,
                cpu_temperature_c: self.cpu_temperature(),
                debug,
                debug_sensors: self.debug_sensors(),
                flags: self.feature_flags(),
            },
        )
    }
}
