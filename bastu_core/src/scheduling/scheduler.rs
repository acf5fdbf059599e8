use crate::engine::EngineState;
use crate::publisher::Publish;
use crate::upstream::RefreshBookings;
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use std::sync::Arc;

/// What the scheduler observed and did so far
///
/// Mutated only by [`Scheduler::tick_at`]; everything else reads clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerState {
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_batch_at: Option<DateTime<Utc>>,
    pub last_batch_count: usize,
    pub discovered_sensors: Vec<String>,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not on the schedule; only discovery and the tick time were recorded
    Skipped,
    /// A batch ran
    Batch {
        /// Readings handed to the publisher
        published: usize,
        /// Sensors that returned no temperature
        unreadable: usize,
    },
}

/// Drives one sampling-and-publish decision per tick
///
/// Ticks never fail: unreadable sensors are skipped and publish failures end
/// up in the publish log, so the caller can keep ticking forever.
pub struct Scheduler {
    engine: Arc<EngineState>,
    publisher: Arc<dyn Publish>,
    bookings: Option<Arc<dyn RefreshBookings>>,
}

impl Scheduler {
    pub fn new(engine: Arc<EngineState>, publisher: Arc<dyn Publish>) -> Self {
        Self {
            engine,
            publisher,
            bookings: None,
        }
    }

    /// Refresh bookings after every batch (when enabled in config)
    pub fn with_bookings(mut self, bookings: Arc<dyn RefreshBookings>) -> Self {
        self.bookings = Some(bookings);
        self
    }

    /// Tick at the current local time
    pub fn tick(&self) -> TickOutcome {
        self.tick_at(Local::now())
    }

    /// Tick as if the wall clock read `now`
    pub fn tick_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> TickOutcome {
        let config = self.engine.config();

        // The debug flag is read once here so a toggle applies from the next tick.
        let sensors = self.engine.sensors();
        let discovered = sensors.discover();

        let decision = config.schedule.evaluate(now.hour(), now.minute());
        let now_utc = now.with_timezone(&Utc);

        self.engine.update_scheduler(|state| {
            state.discovered_sensors = discovered.clone();
            state.last_tick_at = Some(now_utc);
        });

        if !decision.should_send {
            tracing::debug!(
                "Tick {:02}:{:02}: no batch due (in window: {})",
                now.hour(),
                now.minute(),
                decision.in_active_window
            );
            return TickOutcome::Skipped;
        }

        let mut published = 0;
        let mut unreadable = 0;
        for sensor_id in &discovered {
            let reading = sensors.read(sensor_id);
            let Some(temperature_c) = reading.temperature_c else {
                tracing::debug!("Skipping {}: no reading", sensor_id);
                unreadable += 1;
                continue;
            };

            if config.publish_enabled {
                self.publisher.publish(sensor_id, temperature_c);
                published += 1;
            }
        }

        // Batch time and count change together so readers never see a mixed pair.
        self.engine.update_scheduler(|state| {
            state.last_batch_at = Some(now_utc);
            state.last_batch_count = published;
        });

        tracing::info!(
            "Batch at {:02}:{:02}: {} published, {} unreadable ({:?})",
            now.hour(),
            now.minute(),
            published,
            unreadable,
            sensors.backend()
        );

        if config.update_bookings_enabled {
            if let Some(bookings) = &self.bookings {
                bookings.trigger_refresh();
            }
        }

        TickOutcome::Batch {
            published,
            unreadable,
        }
    }
}
