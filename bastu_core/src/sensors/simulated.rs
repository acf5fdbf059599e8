use super::{SensorBackend, SensorReading, SensorSource, CPU_SENSOR_ID};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Tuning for the simulated random walk
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProfile {
    /// Starting value for the CPU sensor
    pub cpu_base: f64,
    /// Other sensors start uniformly in `[other_base_min, other_base_max)`
    pub other_base_min: f64,
    pub other_base_max: f64,
    /// Each read moves the value by up to +/- this much
    pub jitter: f64,
    pub cpu_range: RangeInclusive<f64>,
    pub other_range: RangeInclusive<f64>,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            cpu_base: 45.0,
            other_base_min: 20.0,
            other_base_max: 30.0,
            jitter: 0.3,
            cpu_range: 35.0..=75.0,
            other_range: 5.0..=90.0,
        }
    }
}

impl SimulationProfile {
    fn range_for(&self, sensor_id: &str) -> &RangeInclusive<f64> {
        if sensor_id == CPU_SENSOR_ID {
            &self.cpu_range
        } else {
            &self.other_range
        }
    }

    fn seed_for<R: Rng + ?Sized>(&self, sensor_id: &str, rng: &mut R) -> f64 {
        if sensor_id == CPU_SENSOR_ID {
            self.cpu_base
        } else if self.other_base_max > self.other_base_min {
            rng.gen_range(self.other_base_min..self.other_base_max)
        } else {
            self.other_base_min
        }
    }

    /// Apply one jitter step and clamp to the sensor's range
    fn step<R: Rng + ?Sized>(&self, sensor_id: &str, current: f64, rng: &mut R) -> f64 {
        let jitter = if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..self.jitter)
        } else {
            0.0
        };
        let range = self.range_for(sensor_id);
        (current + jitter).clamp(*range.start(), *range.end())
    }
}

/// Synthetic sensors with a smoothly varying temperature
pub struct SimulatedSensorSource {
    sensors: Vec<String>,
    profile: SimulationProfile,
    temperatures: Mutex<HashMap<String, f64>>,
}

impl SimulatedSensorSource {
    pub fn new(sensors: Vec<String>, profile: SimulationProfile) -> Self {
        Self {
            sensors,
            profile,
            temperatures: Mutex::new(HashMap::new()),
        }
    }

    pub fn sensor_names(&self) -> &[String] {
        &self.sensors
    }

    /// Advance the walk for `sensor_id` and return the new value
    pub fn next_temperature(&self, sensor_id: &str) -> f64 {
        let mut rng = rand::thread_rng();
        let mut temperatures = self.temperatures.lock();

        let current = *temperatures
            .entry(sensor_id.to_string())
            .or_insert_with(|| self.profile.seed_for(sensor_id, &mut rng));
        let next = self.profile.step(sensor_id, current, &mut rng);
        temperatures.insert(sensor_id.to_string(), next);
        next
    }
}

impl SensorSource for SimulatedSensorSource {
    fn backend(&self) -> SensorBackend {
        SensorBackend::Simulation
    }

    fn discover(&self) -> Vec<String> {
        self.sensors.clone()
    }

    fn read(&self, sensor_id: &str) -> SensorReading {
        SensorReading::new(sensor_id, Some(self.next_temperature(sensor_id)), true)
    }
}
