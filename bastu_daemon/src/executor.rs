use bastu_core::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

pub struct TickExecutor {
    scheduler: Arc<Scheduler>,
    period: Duration,
}

impl TickExecutor {
    pub fn new(scheduler: Arc<Scheduler>, period: Duration) -> Self {
        Self { scheduler, period }
    }

    /// Start the background tick loop
    ///
    /// Ticks run one after another on this task. Publishes started by a tick
    /// are spawned separately and never awaited here.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick of an interval fires immediately; the schedule
            // starts one period after startup.
            interval.tick().await;

            loop {
                interval.tick().await;
                self.scheduler.tick();
            }
        })
    }
}
