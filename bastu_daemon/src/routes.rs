use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bastu_core::{BastuResult, PublishLogEntry, StatusSnapshot};
use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 1000;

/// Build the HTTP API
pub fn router(state: AppState) -> Router {
    let config = state.engine.config();
    let frontend_dir = config.frontend_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/temperatures", get(get_temperatures))
        .route("/api/runtime-status", get(get_runtime_status))
        .route("/api/publish-log", get(get_publish_log))
        .route("/api/debug", get(get_debug).post(set_debug))
        .route("/api/bookingstoday", get(get_todays_bookings))
        .route("/api/IsItBooked", get(get_is_it_booked))
        .route("/api/temperature/:id", get(get_temperature_today))
        .route("/api/update-bookings", get(update_bookings));

    if config.battery_routes_enabled {
        app = app
            .route("/api/battery-status", get(get_battery_status))
            .route("/api/batterystatustoday", get(get_battery_status_today));
    }

    if frontend_dir.is_dir() {
        tracing::info!("Serving dashboard from {}", frontend_dir.display());
        app = app.fallback_service(ServeDir::new(frontend_dir));
    }

    app.with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[derive(Debug, Serialize)]
pub struct TemperatureView {
    pub sensor: String,
    pub temperature: Option<f64>,
    pub unit: &'static str,
    pub debug: bool,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn get_temperatures(State(state): State<AppState>) -> Json<Vec<TemperatureView>> {
    let temperatures = state
        .engine
        .current_readings()
        .into_iter()
        .map(|reading| TemperatureView {
            sensor: reading.sensor_id,
            temperature: reading.temperature_c.map(round2),
            unit: "C",
            debug: reading.is_simulated,
        })
        .collect();
    Json(temperatures)
}

async fn get_runtime_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.engine.status_at(&Local::now()))
}

#[derive(Debug, Deserialize)]
pub struct PublishLogQuery {
    limit: Option<String>,
}

impl PublishLogQuery {
    /// Requested limit clamped to `1..=1000`; unparsable values use the default
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|n| n.clamp(1, MAX_LOG_LIMIT as i64) as usize)
            .unwrap_or(DEFAULT_LOG_LIMIT)
    }
}

async fn get_publish_log(
    State(state): State<AppState>,
    Query(query): Query<PublishLogQuery>,
) -> Json<Vec<PublishLogEntry>> {
    Json(state.engine.publish_log().recent(query.limit()))
}

async fn get_debug(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "enabled": state.engine.is_debug(),
        "sensors": state.engine.debug_sensors(),
    }))
}

async fn set_debug(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let enabled = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get("enabled").and_then(Value::as_bool));

    match enabled {
        Some(enabled) => {
            state.engine.set_debug(enabled);
            (StatusCode::OK, Json(json!({ "enabled": state.engine.is_debug() })))
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "enabled must be boolean" })),
        ),
    }
}

/// Map an upstream lookup to the proxy response
fn proxy(what: &str, result: BastuResult<Value>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => {
            tracing::error!("Error fetching {}: {}", what, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching data: {}", e),
            )
                .into_response()
        }
    }
}

async fn get_todays_bookings(State(state): State<AppState>) -> Response {
    proxy("today's bookings", state.upstream.todays_bookings().await)
}

async fn get_is_it_booked(State(state): State<AppState>) -> Response {
    proxy("booking status", state.upstream.is_it_booked().await)
}

async fn get_temperature_today(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    proxy("temperature data", state.upstream.temperature_today(&id).await)
}

async fn get_battery_status(State(state): State<AppState>) -> Response {
    proxy("battery status", state.upstream.battery_latest().await)
}

async fn get_battery_status_today(State(state): State<AppState>) -> Response {
    proxy("today's battery status", state.upstream.battery_today().await)
}

async fn update_bookings(State(state): State<AppState>) -> Response {
    match state.upstream.refresh_bookings().await {
        Ok(body) => Html(format!("<pre>{}</pre>", body)).into_response(),
        Err(e) => {
            tracing::error!("Error fetching bookings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching bookings from API",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use bastu_core::config::{EngineConfig, SensorPaths, UpstreamConfig};
    use bastu_core::{EngineState, PublishKind, UpstreamClient};
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_config(upstream: UpstreamConfig) -> EngineConfig {
        EngineConfig {
            debug_mode: true,
            sensors: SensorPaths {
                base_dir: PathBuf::from("/nonexistent/w1"),
                device_glob: "28*".to_string(),
                cpu_temp_path: PathBuf::from("/nonexistent/thermal"),
            },
            frontend_dir: PathBuf::from("/nonexistent/frontend"),
            upstream,
            ..EngineConfig::default()
        }
    }

    fn state_with(config: EngineConfig) -> AppState {
        let upstream = UpstreamClient::new(reqwest::Client::new(), config.upstream.clone());
        AppState {
            engine: Arc::new(EngineState::new(config)),
            upstream,
        }
    }

    fn test_state() -> AppState {
        // Port 1 is never listening
        state_with(test_config(UpstreamConfig::with_base_url("http://127.0.0.1:1", "")))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(router(test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert!(json["time"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_publish_log_limit_newest_first() {
        let state = test_state();
        for n in 0..6 {
            state
                .engine
                .publish_log()
                .append(PublishLogEntry::temperature(&format!("s{}", n), 20.0, true, "ok"));
        }

        let (status, json) = get_json(router(state.clone()), "/api/publish-log?limit=3").await;
        assert_eq!(status, StatusCode::OK);
        let sensors: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["sensor"].as_str().unwrap())
            .collect();
        assert_eq!(sensors, vec!["s5", "s4", "s3"]);

        let (_, json) = get_json(router(state.clone()), "/api/publish-log?limit=0").await;
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (_, json) = get_json(router(state.clone()), "/api/publish-log?limit=lots").await;
        assert_eq!(json.as_array().unwrap().len(), 6);

        let (_, json) = get_json(router(state), "/api/publish-log").await;
        assert_eq!(json.as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_limit_clamping() {
        let q = |limit: Option<&str>| PublishLogQuery {
            limit: limit.map(str::to_string),
        };
        assert_eq!(q(None).limit(), 50);
        assert_eq!(q(Some("5000")).limit(), 1000);
        assert_eq!(q(Some("-4")).limit(), 1);
        assert_eq!(q(Some("12")).limit(), 12);
        assert_eq!(q(Some("x")).limit(), 50);
    }

    #[tokio::test]
    async fn test_debug_toggle() {
        let state = state_with(EngineConfig {
            debug_mode: false,
            ..test_config(UpstreamConfig::default())
        });

        let (_, json) = get_json(router(state.clone()), "/api/debug").await;
        assert_eq!(json["enabled"], false);
        assert_eq!(json["sensors"][0], "28-TEST1");

        let (status, body) = send(router(state.clone()), post_json("/api/debug", r#"{"enabled":true}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["enabled"], true);
        assert!(state.engine.is_debug());

        let entries = state.engine.publish_log().snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, PublishKind::DebugToggle);
    }

    #[tokio::test]
    async fn test_debug_toggle_rejects_non_boolean() {
        let state = test_state();

        for body in [r#"{"enabled":"yes"}"#, r#"{"enabled":1}"#, "{}", "not json"] {
            let (status, response) = send(router(state.clone()), post_json("/api/debug", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
            let json: Value = serde_json::from_slice(&response).unwrap();
            assert_eq!(json["error"], "enabled must be boolean");
        }

        assert!(state.engine.is_debug());
        assert!(state.engine.publish_log().is_empty());
    }

    #[tokio::test]
    async fn test_temperatures_in_debug_mode() {
        let state = test_state();
        let (status, json) = get_json(router(state.clone()), "/api/temperatures").await;
        assert_eq!(status, StatusCode::OK);

        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row["unit"], "C");
            assert_eq!(row["debug"], true);
            let t = row["temperature"].as_f64().unwrap();
            assert_eq!(t, round2(t));
        }
        // Reading temperatures never publishes
        assert!(state.engine.publish_log().is_empty());
    }

    #[tokio::test]
    async fn test_temperatures_hardware_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let device = dir.path().join("28-abc");
        std::fs::create_dir_all(&device).unwrap();
        std::fs::write(device.join("w1_slave"), "aa : crc=1 YES\naa t=21437\n").unwrap();
        let broken = dir.path().join("28-def");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("w1_slave"), "aa : crc=1 NO\naa t=21437\n").unwrap();

        let state = state_with(EngineConfig {
            debug_mode: false,
            sensors: SensorPaths {
                base_dir: dir.path().to_path_buf(),
                device_glob: "28*".to_string(),
                cpu_temp_path: dir.path().join("none"),
            },
            ..test_config(UpstreamConfig::default())
        });

        let (_, json) = get_json(router(state), "/api/temperatures").await;
        assert_eq!(
            json,
            json!([
                {"sensor": "28-abc", "temperature": 21.44, "unit": "C", "debug": false},
                {"sensor": "28-def", "temperature": null, "unit": "C", "debug": false},
            ])
        );
    }

    #[tokio::test]
    async fn test_runtime_status_shape() {
        let (status, json) = get_json(router(test_state()), "/api/runtime-status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["schedule"]["activeStartHour"], 6);
        assert_eq!(json["schedule"]["everyMinutes"], 5);
        assert!(json["schedule"]["lastTick"].is_null());
        assert_eq!(json["sensors"]["discovered"], json!([]));
        assert!(json["sensors"]["cpuTempC"].is_number());
        assert_eq!(json["flags"]["DEBUG_MODE"], true);
        assert_eq!(json["debug"]["sensors"][2], "cpu");
        assert!(json["uptimeSec"].is_u64());
    }

    #[tokio::test]
    async fn test_battery_routes_follow_flag() {
        let (status, _) = get_json(router(test_state()), "/api/battery-status").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let state = state_with(EngineConfig {
            battery_routes_enabled: true,
            ..test_config(UpstreamConfig::with_base_url("http://127.0.0.1:1", ""))
        });
        let (status, _) = get_json(router(state), "/api/battery-status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upstream_proxy() {
        let api = Router::new()
            .route("/SuanaTemp/GetTodaysBookings", get(|| async { r#"[{"id":7}]"# }))
            .route("/Calendar/UpdateBookings", get(|| async { "updated" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, api).await.unwrap();
        });

        let state = state_with(test_config(UpstreamConfig::with_base_url(
            &format!("http://{}", addr),
            "k",
        )));

        let (status, json) = get_json(router(state.clone()), "/api/bookingstoday").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!([{"id": 7}]));

        let (status, body) = send(
            router(state.clone()),
            Request::get("/api/update-bookings").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), "<pre>updated</pre>");

        // Not served by the fake API
        let (status, body) = send(
            router(state),
            Request::get("/api/IsItBooked").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8(body).unwrap().starts_with("Error fetching data"));
    }

    #[tokio::test]
    async fn test_update_bookings_failure() {
        let (status, body) = send(
            router(test_state()),
            Request::get("/api/update-bookings").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(String::from_utf8(body).unwrap(), "Error fetching bookings from API");
    }

    #[tokio::test]
    async fn test_serves_frontend_when_present() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Bastu</h1>").unwrap();

        let state = state_with(EngineConfig {
            frontend_dir: dir.path().to_path_buf(),
            ..test_config(UpstreamConfig::default())
        });

        let (status, body) = send(
            router(state),
            Request::get("/index.html").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), "<h1>Bastu</h1>");
    }
}
