use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{
        player_service,
        sse_service::{self, StreamKind},
    },
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Shared game document without the answer on every change (`game`, or `pending` before the first reset)", content_type = "text/event-stream", body = String))
)]
/// Stream the shared game document to the TV display.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New public SSE connection");
    sse_service::to_sse_stream(sse_service::public_events(&state), StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/admin",
    tag = "sse",
    responses(
        (status = 200, description = "Admin token, console snapshots and cues", content_type = "text/event-stream", body = String),
        (status = 401, description = "Another admin stream is already active")
    )
)]
/// Stream admin-only events, establishing the admin token.
pub async fn admin_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let events = sse_service::admin_events(&state).await?;
    info!("New admin SSE connection");
    Ok(sse_service::to_sse_stream(events, StreamKind::Admin(state)))
}

#[utoipa::path(
    get,
    path = "/sse/players/{name}",
    tag = "sse",
    params(("name" = String, Path, description = "Name the player joined with")),
    responses(
        (status = 200, description = "Player view on every change", content_type = "text/event-stream", body = String),
        (status = 404, description = "Player has not joined")
    )
)]
/// Stream one player's view of the game.
pub async fn player_stream(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let view = player_service::get_player(&state, &name).await?;
    let name = view.name;
    info!(player = %name, "New player SSE connection");
    let events = sse_service::player_events(&state, name.clone());
    Ok(sse_service::to_sse_stream(events, StreamKind::Player(name)))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/admin", get(admin_stream))
        .route("/sse/players/{name}", get(player_stream))
}
