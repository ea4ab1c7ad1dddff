//! HTTP exposition of the latest sensor reading.
//!
//! A single endpoint, `GET /`, returns a JSON snapshot of the store. The
//! response shape depends on the session mode:
//!
//! - connected mode reports a `connected` flag (no battery data flows over
//!   GATT notifications)
//! - monitor and discovery modes report `battery` instead (advertisement
//!   frames carry it, and there is no link whose state could be reported)
//!
//! `lastUpdate` is `null` until the first reading lands.

use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, response::Response, routing::get};
use serde::Serialize;
use time::OffsetDateTime;

use mitherm_types::SessionMode;

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(current_reading))
}

/// Response shape for connected-notify sessions.
#[derive(Debug, Serialize)]
struct ConnectedResponse {
    temperature: f64,
    humidity: u8,
    connected: bool,
    #[serde(rename = "lastUpdate", with = "time::serde::rfc3339::option")]
    last_update: Option<OffsetDateTime>,
}

/// Response shape for advertisement-monitor sessions.
#[derive(Debug, Serialize)]
struct MonitorResponse {
    temperature: f64,
    humidity: u8,
    battery: Option<u8>,
    #[serde(rename = "lastUpdate", with = "time::serde::rfc3339::option")]
    last_update: Option<OffsetDateTime>,
}

/// Return the latest reading as JSON.
async fn current_reading(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.store.snapshot();
    match state.mode {
        SessionMode::ConnectedNotify => Json(ConnectedResponse {
            temperature: snapshot.reading.temperature,
            humidity: snapshot.reading.humidity,
            connected: snapshot.status.is_connected(),
            last_update: snapshot.reading.observed_at,
        })
        .into_response(),
        SessionMode::AdvertisementMonitor | SessionMode::DiscoveryOnly => Json(MonitorResponse {
            temperature: snapshot.reading.temperature,
            humidity: snapshot.reading.humidity,
            battery: snapshot.reading.battery,
            last_update: snapshot.reading.observed_at,
        })
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use time::macros::datetime;
    use tower::ServiceExt;

    use mitherm_core::ReadingStore;
    use mitherm_types::{ConnectionStatus, Reading};

    fn state_with(mode: SessionMode) -> (Arc<ReadingStore>, Arc<AppState>) {
        let store = Arc::new(ReadingStore::new());
        let state = AppState::new(Arc::clone(&store), mode);
        (store, state)
    }

    async fn get_root(state: Arc<AppState>) -> serde_json::Value {
        let app = router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_connected_shape_before_any_data() {
        let (_store, state) = state_with(SessionMode::ConnectedNotify);
        let json = get_root(state).await;

        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["humidity"], 0);
        assert_eq!(json["connected"], false);
        assert!(json["lastUpdate"].is_null());
        assert!(json.get("battery").is_none());
    }

    #[tokio::test]
    async fn test_connected_shape_with_reading() {
        let (store, state) = state_with(SessionMode::ConnectedNotify);
        let reading = Reading {
            temperature: 10.0,
            humidity: 44,
            ..Reading::default()
        }
        .observed_at(datetime!(2024-06-01 12:00:00 UTC));
        store.update(reading, ConnectionStatus::Subscribed);

        let json = get_root(state).await;

        assert_eq!(json["temperature"], 10.0);
        assert_eq!(json["humidity"], 44);
        assert_eq!(json["connected"], true);
        assert_eq!(json["lastUpdate"], "2024-06-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_connected_flag_clears_after_disconnect() {
        let (store, state) = state_with(SessionMode::ConnectedNotify);
        store.update(Reading::default(), ConnectionStatus::Subscribed);
        store.set_status(ConnectionStatus::Disconnected);

        let json = get_root(state).await;
        assert_eq!(json["connected"], false);
    }

    #[tokio::test]
    async fn test_monitor_shape_reports_battery_not_connected() {
        let (store, state) = state_with(SessionMode::AdvertisementMonitor);
        let reading = Reading {
            temperature: 21.5,
            humidity: 48,
            battery: Some(93),
            frame_counter: Some(7),
            observed_at: Some(datetime!(2024-06-01 12:00:00 UTC)),
        };
        store.update(reading, ConnectionStatus::Monitoring);

        let json = get_root(state).await;

        assert_eq!(json["temperature"], 21.5);
        assert_eq!(json["humidity"], 48);
        assert_eq!(json["battery"], 93);
        assert_eq!(json["lastUpdate"], "2024-06-01T12:00:00Z");
        assert!(json.get("connected").is_none());
    }

    #[tokio::test]
    async fn test_monitor_shape_battery_null_before_data() {
        let (_store, state) = state_with(SessionMode::AdvertisementMonitor);
        let json = get_root(state).await;

        assert!(json["battery"].is_null());
        assert!(json["lastUpdate"].is_null());
    }
}
