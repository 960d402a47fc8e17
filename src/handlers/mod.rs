// src/handlers/mod.rs
pub mod alert_handler;
pub mod document_handler;
pub mod geofence_handler;
pub mod violation_handler;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/geofences",
            get(geofence_handler::list_geofences).post(geofence_handler::create_geofence),
        )
        .route("/geofences/containing", get(geofence_handler::geofences_containing))
        .route(
            "/geofences/:id",
            get(geofence_handler::get_geofence)
                .put(geofence_handler::update_geofence)
                .delete(geofence_handler::delete_geofence),
        )
        .route("/geofences/:id/status", put(geofence_handler::set_geofence_status))
        .route(
            "/alert-rules",
            get(alert_handler::list_rules).post(alert_handler::create_rule),
        )
        .route(
            "/alert-rules/:id",
            get(alert_handler::get_rule).delete(alert_handler::delete_rule),
        )
        .route("/alert-rules/:id/status", put(alert_handler::set_rule_status))
        .route(
            "/violations",
            get(violation_handler::list_events).post(violation_handler::record_event),
        )
        .route("/violations/:id", get(violation_handler::get_event))
        .route("/violations/:id/acknowledge", post(violation_handler::acknowledge_event))
        .route("/reports/violations", get(violation_handler::violation_report))
        .route("/documents", post(document_handler::register_document))
        .route("/documents/expiring", get(document_handler::expiring_documents))
        .route("/documents/:id", get(document_handler::get_document))
        .route("/drivers/:id/documents", get(document_handler::list_driver_documents))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::messaging_service::MockNotificationService;
    use crate::state::AppConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MockNotificationService>) {
        let notifier = Arc::new(MockNotificationService::new());
        let state = AppState::in_memory(notifier.clone(), AppConfig::default());
        (router(Arc::new(state)), notifier)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_restricted_zone(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/geofences",
            Some(json!({
                "name": "Harbour restricted zone",
                "geometry": {
                    "type": "circle",
                    "center": { "lat": 5.6037, "lng": -0.1870 },
                    "radiusMeters": 250.0
                },
                "category": "restricted"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    fn entry_event(geofence_id: &str, vehicle: &str) -> Value {
        json!({
            "geofenceId": geofence_id,
            "vehicleId": vehicle,
            "driverId": "drv-001",
            "type": "entry",
            "timestamp": "2025-04-15T14:30:00Z",
            "coordinates": { "latitude": 5.6037, "longitude": -0.1870 }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_geofence_lifecycle() {
        let (app, _) = app();
        let id = create_restricted_zone(&app).await;

        let (status, body) = send(&app, "GET", &format!("/geofences/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "restricted");

        let (_, hits) = send(&app, "GET", "/geofences/containing?lat=5.6038&lng=-0.1871", None).await;
        assert_eq!(hits.as_array().unwrap().len(), 1);
        let (_, misses) = send(&app, "GET", "/geofences/containing?lat=5.70&lng=-0.1871", None).await;
        assert!(misses.as_array().unwrap().is_empty());

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/geofences/{}/status", id),
            Some(json!({ "status": "inactive" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "inactive");

        let (status, _) = send(&app, "DELETE", &format!("/geofences/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "GET", &format!("/geofences/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "geofence_not_found");
    }

    #[tokio::test]
    async fn test_invalid_geofence_is_rejected() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/geofences",
            Some(json!({
                "name": "Sliver",
                "geometry": { "type": "polygon", "vertices": [{ "lat": 5.6, "lng": -0.18 }] },
                "category": "customer"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
    }

    #[tokio::test]
    async fn test_violation_flow() {
        let (app, notifier) = app();
        let geofence_id = create_restricted_zone(&app).await;

        let (status, rule) = send(
            &app,
            "POST",
            "/alert-rules",
            Some(json!({
                "name": "Restricted zone entry",
                "geofenceId": geofence_id,
                "triggerOn": "entry",
                "recipients": [{ "type": "email", "address": "ops@fleet.example" }],
                "priority": "high"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, recorded) = send(&app, "POST", "/violations", Some(entry_event(&geofence_id, "veh-001"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["alerts"][0]["ruleId"], rule["id"]);
        assert_eq!(notifier.sent().await.len(), 1);

        let event_id = recorded["event"]["id"].as_str().unwrap().to_string();
        let ack_uri = format!("/violations/{}/acknowledge", event_id);
        let (status, acked) = send(&app, "POST", &ack_uri, Some(json!({ "acknowledgedBy": "dispatcher-ama" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(acked["acknowledged"], true);

        let (status, body) = send(&app, "POST", &ack_uri, Some(json!({ "acknowledgedBy": "dispatcher-kwame" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already_acknowledged");

        send(&app, "POST", "/violations", Some(entry_event(&geofence_id, "veh-002"))).await;
        let (_, pending) = send(&app, "GET", "/violations?unacknowledged=true", None).await;
        assert_eq!(pending.as_array().unwrap().len(), 1);
        assert_eq!(pending[0]["vehicleId"], "veh-002");
    }

    #[tokio::test]
    async fn test_days_schedule_rule_and_geofence_delete() {
        let (app, notifier) = app();
        let geofence_id = create_restricted_zone(&app).await;

        let (status, rule) = send(
            &app,
            "POST",
            "/alert-rules",
            Some(json!({
                "name": "Restricted zone entry",
                "geofenceId": geofence_id,
                "triggerOn": "entry",
                "schedule": {
                    "days": ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"],
                    "startTime": "00:00",
                    "endTime": "23:59"
                },
                "recipients": [{ "type": "email", "address": "ops@fleet.example" }],
                "priority": "high"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(rule["schedule"]["startTime"], "00:00");

        let (_, recorded) = send(&app, "POST", "/violations", Some(entry_event(&geofence_id, "veh-001"))).await;
        assert_eq!(recorded["alerts"][0]["ruleId"], rule["id"]);
        assert_eq!(notifier.sent().await.len(), 1);

        let (status, _) = send(&app, "DELETE", &format!("/geofences/{}", geofence_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let rule_uri = format!("/alert-rules/{}", rule["id"].as_str().unwrap());
        let (status, _) = send(&app, "GET", &rule_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Events on the deleted geofence are stored but trip nothing
        let (status, recorded) = send(&app, "POST", "/violations", Some(entry_event(&geofence_id, "veh-002"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(recorded["alerts"].as_array().unwrap().is_empty());
        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_schedule_shape_is_rejected() {
        let (app, _) = app();
        let geofence_id = create_restricted_zone(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            "/alert-rules",
            Some(json!({
                "name": "Restricted zone entry",
                "geofenceId": geofence_id,
                "triggerOn": "entry",
                "schedule": { "weekdays": "all", "from": "00:00" },
                "priority": "high"
            })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_dwell_rule_without_threshold_is_unprocessable() {
        let (app, _) = app();
        let geofence_id = create_restricted_zone(&app).await;
        let (status, body) = send(
            &app,
            "POST",
            "/alert-rules",
            Some(json!({
                "name": "Loitering",
                "geofenceId": geofence_id,
                "triggerOn": "dwell",
                "priority": "medium"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "configuration_error");
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let (app, _) = app();
        let geofence_id = create_restricted_zone(&app).await;
        for vehicle in ["veh-001", "veh-002", "veh-001"] {
            send(&app, "POST", "/violations", Some(entry_event(&geofence_id, vehicle))).await;
        }

        let (status, report) = send(&app, "GET", "/reports/violations?groupBy=vehicle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["totalEvents"], 3);
        assert_eq!(report["rows"].as_array().unwrap().len(), 2);

        let (status, body) = send(&app, "GET", "/reports/violations?groupBy=fleet", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_driver_documents() {
        let (app, _) = app();
        let (status, created) = send(
            &app,
            "POST",
            "/documents",
            Some(json!({
                "driverId": "drv-001",
                "documentType": "drivers_license",
                "number": "GH-DL-4471",
                "issuedDate": "2024-05-14",
                "expiryDate": "2025-05-14"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["driverId"], "drv-001");

        let (status, docs) = send(&app, "GET", "/drivers/drv-001/documents?today=2025-04-14", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(docs[0]["effectiveStatus"], "expiring");
        assert_eq!(docs[0]["daysUntilExpiry"], 30);

        let (_, flagged) = send(&app, "GET", "/documents/expiring?today=2025-06-01", None).await;
        assert_eq!(flagged[0]["effectiveStatus"], "expired");

        let (status, _) = send(&app, "GET", "/documents/doc-000000-zzzzz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
