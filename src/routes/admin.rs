use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::admin::{ActionResponse, AdminSnapshot},
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints driving the game.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/game", get(get_game))
        .route("/admin/game/start", post(start_game))
        .route("/admin/game/pause", post(pause_game))
        .route("/admin/game/resume", post(resume_game))
        .route("/admin/game/next", post(next_question))
        .route("/admin/game/restart", post(restart_game))
        .route("/admin/game/continue", post(continue_round))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Current document, enabled controls and leaderboard.
#[utoipa::path(
    get,
    path = "/admin/game",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Admin console snapshot", body = AdminSnapshot))
)]
pub async fn get_game(State(state): State<SharedState>) -> Result<Json<AdminSnapshot>, AppError> {
    Ok(Json(admin_service::snapshot(&state).await?))
}

/// Start a run through the question bank.
#[utoipa::path(
    post,
    path = "/admin/game/start",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Pre-game countdown started", body = ActionResponse),
        (status = 409, description = "A game is already running"),
        (status = 503, description = "Question bank unavailable")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::start_game(&state).await?))
}

/// Pause the running question.
#[utoipa::path(
    post,
    path = "/admin/game/pause",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Game paused", body = ActionResponse),
        (status = 409, description = "No question is running")
    )
)]
pub async fn pause_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::pause_game(&state).await?))
}

/// Resume a manual pause.
#[utoipa::path(
    post,
    path = "/admin/game/resume",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Game resumed", body = ActionResponse),
        (status = 409, description = "Game is not manually paused")
    )
)]
pub async fn resume_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::resume_game(&state).await?))
}

/// Skip to the next question.
#[utoipa::path(
    post,
    path = "/admin/game/next",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Advanced to the next question, a round pause or the end", body = ActionResponse),
        (status = 409, description = "No question is running")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::next_question(&state).await?))
}

/// Reset to the lobby and clear every score.
#[utoipa::path(
    post,
    path = "/admin/game/restart",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Game reset", body = ActionResponse))
)]
pub async fn restart_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::restart_game(&state).await?))
}

/// Continue after a round boundary.
#[utoipa::path(
    post,
    path = "/admin/game/continue",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Next round started", body = ActionResponse),
        (status = 409, description = "Game is not at a round boundary")
    )
)]
pub async fn continue_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::continue_round(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
