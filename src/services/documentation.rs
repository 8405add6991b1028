use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Night Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::sse::player_stream,
        crate::routes::admin::get_game,
        crate::routes::admin::start_game,
        crate::routes::admin::pause_game,
        crate::routes::admin::resume_game,
        crate::routes::admin::next_question,
        crate::routes::admin::restart_game,
        crate::routes::admin::continue_round,
        crate::routes::player::join,
        crate::routes::player::get_player,
        crate::routes::player::submit_answer,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::AdminHandshake,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::AdminControls,
            crate::dto::admin::AdminSnapshot,
            crate::dto::admin::LeaderboardEntry,
            crate::dto::player::JoinRequest,
            crate::dto::player::JoinResponse,
            crate::dto::player::AnswerRequest,
            crate::dto::player::AnswerResponse,
            crate::dto::player::AnswerOutcome,
            crate::dto::player::PlayerView,
            crate::dto::player::PlayerHint,
            crate::dto::player::QuestionPrompt,
            crate::dto::public::PublicGame,
            crate::dao::models::GameDocument,
            crate::dao::models::GameStatus,
            crate::dao::models::PauseKind,
            crate::dao::models::QuestionRecord,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "admin", description = "Game control, requires the admin token"),
        (name = "players", description = "Joining and answering"),
    )
)]
pub struct ApiDoc;
