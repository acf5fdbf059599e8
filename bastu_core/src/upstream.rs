//! Calls to the remote booking API
//!
//! Besides the telemetry POST (see [`crate::publisher`]), the daemon talks to
//! the booking service to refresh the calendar after each batch and to proxy a
//! few read-only lookups for the dashboard.

use crate::config::UpstreamConfig;
use crate::error::{BastuError, BastuResult};
use serde_json::Value;

pub const TODAYS_BOOKINGS_PATH: &str = "/SuanaTemp/GetTodaysBookings";
pub const IS_IT_BOOKED_PATH: &str = "/Calendar/IsItBooked";
pub const BATTERY_LATEST_PATH: &str = "/SuanaTemp/Battery/status/latest";
pub const BATTERY_TODAY_PATH: &str = "/SuanaTemp/Battery/status/today";

/// Asks the booking service to resync its calendar
pub trait RefreshBookings: Send + Sync {
    /// Start a refresh without waiting; failures are only logged
    fn trigger_refresh(&self);
}

/// HTTP client for the booking API
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    async fn get_text(&self, url: &str) -> BastuResult<String> {
        let response = self
            .client
            .get(url)
            .header("accept", "text/plain")
            .header("ApiKey", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BastuError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// GET `path` relative to the API base URL
    ///
    /// JSON bodies are returned as-is; anything else becomes a JSON string.
    pub async fn fetch(&self, path: &str) -> BastuResult<Value> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let body = self.get_text(&url).await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    pub async fn todays_bookings(&self) -> BastuResult<Value> {
        self.fetch(TODAYS_BOOKINGS_PATH).await
    }

    pub async fn is_it_booked(&self) -> BastuResult<Value> {
        self.fetch(IS_IT_BOOKED_PATH).await
    }

    /// Today's stored temperatures for one sensor
    pub async fn temperature_today(&self, sensor_id: &str) -> BastuResult<Value> {
        self.fetch(&format!("/Temp/Today/{}", sensor_id)).await
    }

    pub async fn battery_latest(&self) -> BastuResult<Value> {
        self.fetch(BATTERY_LATEST_PATH).await
    }

    pub async fn battery_today(&self) -> BastuResult<Value> {
        self.fetch(BATTERY_TODAY_PATH).await
    }

    /// Ask the booking service to update its bookings; returns the raw body
    pub async fn refresh_bookings(&self) -> BastuResult<String> {
        self.get_text(&self.config.update_bookings_url).await
    }
}

impl RefreshBookings for UpstreamClient {
    fn trigger_refresh(&self) {
        let upstream = self.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match upstream.refresh_bookings().await {
                        Ok(_) => tracing::debug!("Bookings refreshed"),
                        Err(e) => tracing::warn!("Error updating bookings: {}", e),
                    }
                });
            }
            Err(e) => tracing::warn!("Cannot refresh bookings outside the async runtime: {}", e),
        }
    }
}
