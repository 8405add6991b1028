use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::player::{AnswerRequest, AnswerResponse, JoinRequest, JoinResponse, PlayerView},
    error::AppError,
    services::{player_service, scoring_service},
    state::SharedState,
};

/// Player endpoints: join, answer and read one's own view.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players", post(join))
        .route("/players/{name}", get(get_player))
        .route("/players/{name}/answer", post(submit_answer))
}

#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = JoinRequest,
    responses(
        (status = 201, description = "Player joined with a zero score", body = JoinResponse),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Name already taken")
    )
)]
/// Join the game under a unique display name.
pub async fn join(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinRequest>>,
) -> Result<(StatusCode, Json<JoinResponse>), AppError> {
    let joined = scoring_service::join(&state, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}

#[utoipa::path(
    get,
    path = "/players/{name}",
    tag = "players",
    params(("name" = String, Path, description = "Name the player joined with")),
    responses(
        (status = 200, description = "Player view of the game", body = PlayerView),
        (status = 404, description = "Player has not joined")
    )
)]
/// Return the game as the player sees it.
pub async fn get_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(player_service::get_player(&state, &name).await?))
}

#[utoipa::path(
    post,
    path = "/players/{name}/answer",
    tag = "players",
    params(("name" = String, Path, description = "Name the player joined with")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Submission outcome and resulting score", body = AnswerResponse),
        (status = 400, description = "Option not offered by the current question"),
        (status = 404, description = "Player has not joined")
    )
)]
/// Answer the current question.
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = scoring_service::submit_answer(&state, &name, &payload.option).await?;
    Ok(Json(response))
}
