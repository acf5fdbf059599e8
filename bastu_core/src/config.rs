//! Environment-driven configuration for the bastu engine
//!
//! Every setting is optional and falls back to a built-in default. Values are
//! read once at startup; nothing here is reloaded at runtime.

use crate::error::{BastuError, BastuResult};
use crate::scheduling::ScheduleConfig;
use crate::sensors::SimulationProfile;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_W1_BASE_DIR: &str = "/sys/bus/w1/devices/";
pub const DEFAULT_W1_DEVICE_GLOB: &str = "28*";
pub const DEFAULT_CPU_TEMP_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const DEFAULT_TICK_SECONDS: u64 = 60;
pub const DEFAULT_PUBLISH_LOG_SIZE: usize = 200;
pub const DEFAULT_DEBUG_SENSORS: &str = "28-TEST1,28-TEST2,cpu";
pub const DEFAULT_API_BASE_URL: &str = "https://sjoangensbastuflotte.azurewebsites.net";
pub const DEFAULT_FRONTEND_DIR: &str = "frontend";

/// Source of configuration key/value pairs
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Where hardware sensors live on disk
#[derive(Debug, Clone)]
pub struct SensorPaths {
    pub base_dir: PathBuf,
    pub device_glob: String,
    pub cpu_temp_path: PathBuf,
}

impl Default for SensorPaths {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_W1_BASE_DIR),
            device_glob: DEFAULT_W1_DEVICE_GLOB.to_string(),
            cpu_temp_path: PathBuf::from(DEFAULT_CPU_TEMP_PATH),
        }
    }
}

/// Remote booking/telemetry API endpoints
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub publish_url: String,
    pub update_bookings_url: String,
}

impl UpstreamConfig {
    /// Derive the default endpoints from a base URL
    pub fn with_base_url(api_base_url: &str, api_key: &str) -> Self {
        let base = api_base_url.trim_end_matches('/');
        Self {
            api_base_url: base.to_string(),
            api_key: api_key.to_string(),
            publish_url: format!("{}/SuanaTemp/TempData", base),
            update_bookings_url: format!("{}/Calendar/UpdateBookings", base),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL, "")
    }
}

/// Complete engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub port: u16,
    pub sensors: SensorPaths,
    pub schedule: ScheduleConfig,
    pub tick_interval: Duration,
    pub publish_log_capacity: usize,
    pub publish_enabled: bool,
    pub update_bookings_enabled: bool,
    pub battery_routes_enabled: bool,
    pub debug_mode: bool,
    pub debug_sensors: Vec<String>,
    pub simulation: SimulationProfile,
    pub upstream: UpstreamConfig,
    pub frontend_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            sensors: SensorPaths::default(),
            schedule: ScheduleConfig::default(),
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECONDS),
            publish_log_capacity: DEFAULT_PUBLISH_LOG_SIZE,
            publish_enabled: true,
            update_bookings_enabled: true,
            battery_routes_enabled: false,
            debug_mode: false,
            debug_sensors: parse_list(DEFAULT_DEBUG_SENSORS),
            simulation: SimulationProfile::default(),
            upstream: UpstreamConfig::default(),
            frontend_dir: PathBuf::from(DEFAULT_FRONTEND_DIR),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> BastuResult<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Load configuration from any key/value source
    pub fn from_source(env: &dyn EnvSource) -> BastuResult<Self> {
        let defaults = Self::default();

        let schedule = ScheduleConfig::new(
            parse_or(env, "SCHEDULE_ACTIVE_START_HOUR", defaults.schedule.active_start_hour)?,
            parse_or(env, "SCHEDULE_ACTIVE_END_HOUR", defaults.schedule.active_end_hour)?,
            parse_or(env, "SCHEDULE_EVERY_MINUTES", defaults.schedule.every_minutes)?,
        )?;

        let tick_seconds: u64 = parse_or(env, "SCHEDULE_TICK_SECONDS", DEFAULT_TICK_SECONDS)?;
        if tick_seconds == 0 {
            return Err(BastuError::config("SCHEDULE_TICK_SECONDS", "must be greater than 0"));
        }

        let api_base_url = env
            .get("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_key = env.get("API_KEY").unwrap_or_default();
        let mut upstream = UpstreamConfig::with_base_url(&api_base_url, &api_key);
        if let Some(url) = env.get("PUBLISH_URL") {
            upstream.publish_url = url;
        }
        if let Some(url) = env.get("UPDATE_BOOKINGS_URL") {
            upstream.update_bookings_url = url;
        }

        Ok(Self {
            port: parse_or(env, "PORT", defaults.port)?,
            sensors: SensorPaths {
                base_dir: env
                    .get("W1_BASE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sensors.base_dir),
                device_glob: env
                    .get("W1_DEVICE_GLOB")
                    .unwrap_or(defaults.sensors.device_glob),
                cpu_temp_path: env
                    .get("CPU_TEMP_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.sensors.cpu_temp_path),
            },
            schedule,
            tick_interval: Duration::from_secs(tick_seconds),
            publish_log_capacity: parse_or(env, "PUBLISH_LOG_SIZE", defaults.publish_log_capacity)?,
            publish_enabled: env_bool(env, "PUBLISH_ENABLED", defaults.publish_enabled),
            update_bookings_enabled: env_bool(
                env,
                "UPDATE_BOOKINGS_ENABLED",
                defaults.update_bookings_enabled,
            ),
            battery_routes_enabled: env_bool(
                env,
                "ENABLE_BATTERY_ROUTES",
                defaults.battery_routes_enabled,
            ),
            debug_mode: env_bool(env, "DEBUG_MODE", defaults.debug_mode),
            debug_sensors: env
                .get("DEBUG_SENSORS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.debug_sensors),
            simulation: defaults.simulation,
            upstream,
            frontend_dir: env
                .get("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.frontend_dir),
        })
    }
}

/// Boolean flag: `1`, `true`, `yes`, `on` (any case) are true, anything else false
pub fn env_bool(env: &dyn EnvSource, key: &str, default: bool) -> bool {
    match env.get(key) {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn parse_or<T>(env: &dyn EnvSource, key: &str, default: T) -> BastuResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| BastuError::config(key, format!("{:?}: {}", raw, e))),
        _ => Ok(default),
    }
}

/// Comma-separated list with blanks dropped
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
