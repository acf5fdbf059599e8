use super::{SensorBackend, SensorReading, SensorSource, CPU_SENSOR_ID};
use crate::config::SensorPaths;
use std::fs;
use std::path::{Path, PathBuf};

/// File inside each 1-Wire device folder holding the last conversion
const W1_DATA_FILE: &str = "w1_slave";

/// Hardware sensors: 1-Wire probes under sysfs plus the CPU thermal zone
#[derive(Debug, Clone)]
pub struct W1SensorSource {
    paths: SensorPaths,
}

impl W1SensorSource {
    pub fn new(paths: SensorPaths) -> Self {
        Self { paths }
    }

    /// Device folders matching the configured glob, sorted by name
    fn device_folders(&self) -> Vec<PathBuf> {
        let pattern = self.paths.base_dir.join(&self.paths.device_glob);
        let pattern = pattern.to_string_lossy();

        let mut folders = match glob::glob(&pattern) {
            Ok(paths) => paths.flatten().collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!("Could not list 1-Wire devices with {}: {}", pattern, e);
                return Vec::new();
            }
        };

        folders.sort();
        folders
    }

    fn has_cpu_sensor(&self) -> bool {
        self.paths.cpu_temp_path.is_file()
    }

    fn device_file(&self, sensor_id: &str) -> PathBuf {
        self.paths.base_dir.join(sensor_id).join(W1_DATA_FILE)
    }
}

impl SensorSource for W1SensorSource {
    fn backend(&self) -> SensorBackend {
        SensorBackend::Hardware
    }

    fn discover(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .device_folders()
            .iter()
            .filter_map(|folder| folder.file_name())
            .filter_map(|name| name.to_str())
            .map(str::to_string)
            .collect();

        if self.has_cpu_sensor() {
            ids.push(CPU_SENSOR_ID.to_string());
        }

        ids
    }

    fn read(&self, sensor_id: &str) -> SensorReading {
        let temperature = if sensor_id == CPU_SENSOR_ID {
            read_file(&self.paths.cpu_temp_path).and_then(|raw| parse_millidegrees(&raw))
        } else {
            read_file(&self.device_file(sensor_id)).and_then(|raw| parse_w1_slave(&raw))
        };

        if temperature.is_none() {
            tracing::debug!("No valid reading from sensor {}", sensor_id);
        }

        SensorReading::new(sensor_id, temperature, false)
    }
}

fn read_file(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Parse the two-line DS18B20 `w1_slave` format
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
///
/// Valid only when the first line carries `YES` (CRC ok) and the second a
/// `t=<millidegrees>` field. Trailing characters after the number are ignored.
pub fn parse_w1_slave(raw: &str) -> Option<f64> {
    let mut lines = raw.lines();
    let status = lines.next()?;
    let data = lines.next()?;

    if !status.contains("YES") {
        return None;
    }

    let pos = data.find("t=")?;
    let millidegrees = leading_number(&data[pos + 2..])?;
    let celsius = millidegrees / 1000.0;

    celsius.is_finite().then_some(celsius)
}

/// Longest numeric prefix of `raw`, e.g. `23125abc` -> 23125
fn leading_number(raw: &str) -> Option<f64> {
    let raw = raw.trim_start();
    let mut end = 0;
    let mut seen_dot = false;

    for (i, c) in raw.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    raw[..end].parse().ok()
}

/// Parse a thermal-zone file holding integer millidegrees
pub fn parse_millidegrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<i64>().ok().map(|milli| milli as f64 / 1000.0)
}
