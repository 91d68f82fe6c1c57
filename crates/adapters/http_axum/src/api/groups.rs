//! JSON REST handlers for light groups.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use motionlights_app::coordinator::ExternalEvent;
use motionlights_app::ports::{EntityStateWriter, EntityStates};
use motionlights_app::status::CoordinatorStatus;
use motionlights_domain::config::LightGroupConfig;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<CoordinatorStatus>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and reconfigure endpoints.
pub enum GetResponse {
    Ok(Json<CoordinatorStatus>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints that only queue work.
pub enum AcceptedResponse {
    Accepted,
}

impl IntoResponse for AcceptedResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// `GET /api/groups`
pub async fn list<W>(State(state): State<AppState<W>>) -> Result<ListResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let mut statuses = Vec::with_capacity(state.groups.len());
    for handle in state.groups.iter() {
        statuses.push(handle.status().await?);
    }
    Ok(ListResponse::Ok(Json(statuses)))
}

/// `GET /api/groups/{name}`
pub async fn get<W>(
    State(state): State<AppState<W>>,
    Path(name): Path<String>,
) -> Result<GetResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let status = state.groups.get(&name)?.status().await?;
    Ok(GetResponse::Ok(Json(status)))
}

/// `POST /api/groups/{name}/events`
pub async fn post_event<W>(
    State(state): State<AppState<W>>,
    Path(name): Path<String>,
    Json(event): Json<ExternalEvent>,
) -> Result<AcceptedResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    tracing::debug!(group = %name, ?event, "event received over http");
    state.groups.get(&name)?.process_external_event(event)?;
    Ok(AcceptedResponse::Accepted)
}

/// `POST /api/groups/{name}/refresh`
pub async fn refresh<W>(
    State(state): State<AppState<W>>,
    Path(name): Path<String>,
) -> Result<AcceptedResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    state.groups.get(&name)?.refresh_lights()?;
    Ok(AcceptedResponse::Accepted)
}

/// `PUT /api/groups/{name}/config`
pub async fn reconfigure<W>(
    State(state): State<AppState<W>>,
    Path(name): Path<String>,
    Json(config): Json<LightGroupConfig>,
) -> Result<GetResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let handle = state.groups.get(&name)?;
    handle.reconfigure(config).await?;
    Ok(GetResponse::Ok(Json(handle.status().await?)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{self, HALL, MOTION};

    #[tokio::test]
    async fn should_list_groups_with_their_state() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(app, testing::get("/api/groups")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "hall");
        assert_eq!(body[0]["current_state"], "standby");
        assert_eq!(body[0]["total_lights"], 1);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_group() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(app, testing::get("/api/groups/attic")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "LightGroup not found: attic");
    }

    #[tokio::test]
    async fn should_turn_lights_on_when_motion_event_posted() {
        let (app, _) = testing::app().await;

        let (status, _) = testing::send(
            app.clone(),
            testing::json("POST", "/api/groups/hall/events", json!({"type": "motion_on"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (_, group) = testing::send(app.clone(), testing::get("/api/groups/hall")).await;
        assert_eq!(group["current_state"], "motion_detected");

        let (_, light) = testing::send(app, testing::get(&format!("/api/entities/{HALL}"))).await;
        assert_eq!(light["state"], "on");
        assert_eq!(light["brightness"], 80);
    }

    #[tokio::test]
    async fn should_react_to_entity_written_through_api() {
        let (app, _) = testing::app().await;

        let (status, _) = testing::send(
            app.clone(),
            testing::json("PUT", &format!("/api/entities/{MOTION}"), json!({"state": "on"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, group) = testing::send(app, testing::get("/api/groups/hall")).await;
        assert_eq!(group["current_state"], "motion_detected");
        assert_eq!(group["motion_active"], true);
    }

    #[tokio::test]
    async fn should_reject_unknown_event_type() {
        let (app, _) = testing::app().await;

        let (status, _) = testing::send(
            app,
            testing::json("POST", "/api/groups/hall/events", json!({"type": "dance"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_accept_refresh_request() {
        let (app, _) = testing::app().await;

        let (status, _) = testing::send(
            app,
            testing::json("POST", "/api/groups/hall/refresh", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn should_replace_configuration_and_keep_state() {
        let (app, _) = testing::app().await;
        testing::send(
            app.clone(),
            testing::json("POST", "/api/groups/hall/events", json!({"type": "motion_on"})),
        )
        .await;

        let (status, body) = testing::send(
            app,
            testing::json(
                "PUT",
                "/api/groups/hall/config",
                json!({"lights": [HALL, "light.stairs"], "motion_sensors": [MOTION]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_state"], "motion_detected");
        assert_eq!(body["total_lights"], 2);
    }

    #[tokio::test]
    async fn should_reject_invalid_configuration() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(
            app,
            testing::json("PUT", "/api/groups/hall/config", json!({"lights": []})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "at least one light must be configured");
    }
}
