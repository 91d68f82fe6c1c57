//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod entities;
#[allow(clippy::missing_errors_doc)]
pub mod groups;
#[allow(clippy::missing_errors_doc)]
pub mod sse;

use axum::Router;
use axum::routing::{get, post, put};

use motionlights_app::ports::{EntityStateWriter, EntityStates};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<W>() -> Router<AppState<W>>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    Router::new()
        // Light groups
        .route("/groups", get(groups::list::<W>))
        .route("/groups/{name}", get(groups::get::<W>))
        .route("/groups/{name}/events", post(groups::post_event::<W>))
        .route("/groups/{name}/refresh", post(groups::refresh::<W>))
        .route("/groups/{name}/config", put(groups::reconfigure::<W>))
        .route("/groups/{name}/stream", get(sse::stream::<W>))
        // Entities
        .route("/entities", get(entities::list::<W>))
        .route(
            "/entities/{entity_id}",
            get(entities::get::<W>).put(entities::update::<W>),
        )
}
