//! Server-Sent Events (SSE) stream of a light group's status.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use motionlights_app::ports::{EntityStateWriter, EntityStates};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/groups/{name}/stream`
///
/// Sends the current status immediately, then a `status` event after every
/// message the coordinator processed. Intermediate statuses may be skipped
/// when the client is slower than the coordinator; the latest one is always
/// delivered.
pub async fn stream<W>(
    State(state): State<AppState<W>>,
    Path(name): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError>
where
    W: EntityStates + EntityStateWriter + Send + Sync + 'static,
{
    let updates = state.groups.get(&name)?.subscribe_status();
    let events = WatchStream::new(updates).filter_map(|status| {
        match serde_json::to_string(&status) {
            Ok(json) => Some(Ok(Event::default().event("status").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize status for SSE stream");
                None
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
