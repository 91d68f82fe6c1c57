//! JSON REST handlers for entities.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use motionlights_app::ports::{EntityStateWriter, EntityStates};
use motionlights_domain::entity::{EntitySnapshot, EntityState};
use motionlights_domain::error::{MotionLightsError, NotFoundError, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// An entity as returned by the API.
#[derive(Debug, Serialize)]
pub struct EntityResponse {
    pub entity_id: String,
    #[serde(flatten)]
    pub snapshot: EntitySnapshot,
}

/// Request body for writing an entity state.
#[derive(Deserialize)]
pub struct UpdateEntityRequest {
    pub state: EntityState,
    #[serde(default)]
    pub brightness: Option<u8>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<EntityResponse>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<EntityResponse>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/entities`
pub async fn list<W>(State(state): State<AppState<W>>) -> Result<ListResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let entities = state
        .entities
        .list_states()
        .await
        .into_iter()
        .map(|(entity_id, snapshot)| EntityResponse {
            entity_id,
            snapshot,
        })
        .collect();
    Ok(ListResponse::Ok(Json(entities)))
}

/// `GET /api/entities/{entity_id}`
pub async fn get<W>(
    State(state): State<AppState<W>>,
    Path(entity_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let snapshot = state
        .entities
        .get_state(&entity_id)
        .await
        .ok_or_else(|| {
            MotionLightsError::from(NotFoundError {
                entity: "Entity",
                id: entity_id.clone(),
            })
        })?;
    Ok(GetResponse::Ok(Json(EntityResponse {
        entity_id,
        snapshot,
    })))
}

/// `PUT /api/entities/{entity_id}`
///
/// Changes the entity as a person would; light groups see it as a manual
/// change.
pub async fn update<W>(
    State(state): State<AppState<W>>,
    Path(entity_id): Path<String>,
    Json(req): Json<UpdateEntityRequest>,
) -> Result<GetResponse, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let mut snapshot = EntitySnapshot::new(req.state);
    if let Some(brightness) = req.brightness {
        if brightness > 100 {
            return Err(MotionLightsError::from(ValidationError::OutOfRange {
                field: "brightness",
                value: u64::from(brightness),
                min: 0,
                max: 100,
            })
            .into());
        }
        snapshot = snapshot.with_brightness(brightness);
    }

    let change = state.entities.set_state(&entity_id, snapshot).await?;
    Ok(GetResponse::Ok(Json(EntityResponse {
        entity_id: change.entity_id,
        snapshot: change.new,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{self, HALL, MOTION};

    #[tokio::test]
    async fn should_list_entities_sorted_by_id() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(app, testing::get("/api/entities")).await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entity| entity["entity_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec![MOTION.to_string(), HALL.to_string()]);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_entity() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(app, testing::get("/api/entities/light.attic")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Entity not found: light.attic");
    }

    #[tokio::test]
    async fn should_write_numeric_state() {
        let (app, _) = testing::app().await;

        let (status, body) = testing::send(
            app.clone(),
            testing::json("PUT", "/api/entities/sensor.hall_lux", json!({"state": 120})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], 120.0);

        let (_, body) = testing::send(app, testing::get("/api/entities/sensor.hall_lux")).await;
        assert_eq!(body["entity_id"], "sensor.hall_lux");
        assert_eq!(body["state"], 120.0);
    }

    #[tokio::test]
    async fn should_reject_brightness_above_hundred() {
        let (app, _) = testing::app().await;

        let (status, _) = testing::send(
            app,
            testing::json(
                "PUT",
                &format!("/api/entities/{HALL}"),
                json!({"state": "on", "brightness": 150}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
