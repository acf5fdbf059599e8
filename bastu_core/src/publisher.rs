//! Forwarding readings to the remote telemetry API
//!
//! Publishing is fire-and-forget: [`Publish::publish`] returns immediately and
//! the outcome only shows up as a [`PublishLogEntry`]. There is no retry; the
//! next scheduled batch is the only second chance a reading gets.

use crate::publish_log::{PublishLog, PublishLogEntry};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Sink for sensor readings that are due for publishing
pub trait Publish: Send + Sync {
    /// Start publishing one reading without waiting for the result
    fn publish(&self, sensor_id: &str, temperature_c: f64);
}

/// JSON body accepted by the telemetry endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TemperaturePayload {
    #[serde(rename = "tempC")]
    pub temp_c: f64,
    pub timestamp: String,
    pub name: String,
}

impl TemperaturePayload {
    pub fn now(sensor_id: &str, temperature_c: f64) -> Self {
        Self {
            temp_c: temperature_c,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            name: sensor_id.to_string(),
        }
    }
}

/// Publishes readings with one HTTP POST each
#[derive(Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    log: Arc<PublishLog>,
}

impl HttpPublisher {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str, log: Arc<PublishLog>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            log,
        }
    }

    /// POST one reading and record the outcome in the publish log
    pub async fn send_reading(&self, sensor_id: &str, temperature_c: f64) -> PublishLogEntry {
        let payload = TemperaturePayload::now(sensor_id, temperature_c);

        let result = self
            .client
            .post(&self.endpoint)
            .header("accept", "text/plain")
            .header("ApiKey", &self.api_key)
            .json(&payload)
            .send()
            .await;

        let (success, info) = match result {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => (status.is_success(), body),
                    Err(e) => (false, e.to_string()),
                }
            }
            Err(e) => (false, e.to_string()),
        };

        if success {
            tracing::info!("Data sent for {}: {}", sensor_id, info);
        } else {
            tracing::warn!("Error sending data for {}: {}", sensor_id, info);
        }

        let entry = PublishLogEntry::temperature(sensor_id, temperature_c, success, &info);
        self.log.append(entry.clone());
        entry
    }
}

impl Publish for HttpPublisher {
    fn publish(&self, sensor_id: &str, temperature_c: f64) {
        let publisher = self.clone();
        let sensor_id = sensor_id.to_string();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    publisher.send_reading(&sensor_id, temperature_c).await;
                });
            }
            Err(e) => {
                tracing::error!("Cannot publish {} outside the async runtime: {}", sensor_id, e);
                self.log.append(PublishLogEntry::temperature(
                    &sensor_id,
                    temperature_c,
                    false,
                    &e.to_string(),
                ));
            }
        }
    }
}
