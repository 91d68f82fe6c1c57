//! Router fixtures shared by the handler tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use motionlights_adapter_virtual::VirtualHome;
use motionlights_app::registry::LightGroups;
use motionlights_app::runtime::spawn;
use motionlights_app::scheduler::TokioScheduler;
use motionlights_domain::config::LightGroupConfig;
use motionlights_domain::entity::{EntitySnapshot, EntityState};

use crate::router;
use crate::state::AppState;

pub(crate) const HALL: &str = "light.hall";
pub(crate) const MOTION: &str = "binary_sensor.hall_motion";

/// Router over one `hall` group backed by a fresh [`VirtualHome`].
pub(crate) async fn app() -> (Router, VirtualHome) {
    let home = VirtualHome::new()
        .with_entity(HALL, EntitySnapshot::new(EntityState::Off))
        .with_entity(MOTION, EntitySnapshot::new(EntityState::Off));
    let config = LightGroupConfig::builder()
        .light(HALL)
        .motion_sensor(MOTION)
        .build()
        .unwrap();
    let handle = spawn("hall", config, home.clone(), TokioScheduler)
        .await
        .unwrap();
    let mut groups = LightGroups::new();
    groups.insert(handle);

    (router::build(AppState::new(groups, home.clone())), home)
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Run `request` and decode the JSON body, `Null` when empty or not JSON.
pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}
