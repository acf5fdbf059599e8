//! Temperature sensor sources
//!
//! Two backends implement [`SensorSource`]:
//! - **Hardware**: 1-Wire DS18B20 probes under sysfs plus the CPU thermal zone
//! - **Simulation**: a bounded random walk per sensor name, for development
//!   without hardware
//!
//! Reads never fail loudly. A sensor that cannot be read yields a
//! [`SensorReading`] with `temperature_c: None`.

pub mod hardware;
pub mod simulated;

pub use hardware::W1SensorSource;
pub use simulated::{SimulatedSensorSource, SimulationProfile};

use serde::Serialize;

/// Id used for the CPU thermal zone in both backends
pub const CPU_SENSOR_ID: &str = "cpu";

/// Sensor backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    Hardware,
    Simulation,
}

impl SensorBackend {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            SensorBackend::Simulation
        } else {
            SensorBackend::Hardware
        }
    }
}

/// One sample from one sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_id: String,
    /// `None` when the read failed; never NaN or infinite
    pub temperature_c: Option<f64>,
    pub is_simulated: bool,
}

impl SensorReading {
    pub fn failed(sensor_id: &str, is_simulated: bool) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            temperature_c: None,
            is_simulated,
        }
    }

    /// Build a reading, discarding non-finite values
    pub fn new(sensor_id: &str, temperature_c: Option<f64>, is_simulated: bool) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            temperature_c: temperature_c.filter(|t| t.is_finite()),
            is_simulated,
        }
    }
}

/// Discovery and reading of temperature sensors
pub trait SensorSource: Send + Sync {
    fn backend(&self) -> SensorBackend;

    /// Currently available sensor ids, in a stable order
    fn discover(&self) -> Vec<String>;

    /// Read one sensor; failures are reported as a `None` temperature
    fn read(&self, sensor_id: &str) -> SensorReading;

    /// Discover then read every sensor
    fn read_all(&self) -> Vec<SensorReading> {
        self.discover().iter().map(|id| self.read(id)).collect()
    }
}
