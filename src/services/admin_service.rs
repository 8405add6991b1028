//! Business logic powering the admin REST routes. Commands are forwarded to the admin
//! controller, which serialises them with countdown events.

use crate::{
    dao::models::GameDocument,
    dto::admin::{ActionResponse, AdminControls, AdminSnapshot, leaderboard},
    error::ServiceError,
    services::game_service::AdminCommand,
    state::SharedState,
};

async fn run(
    state: &SharedState,
    command: AdminCommand,
    message: &str,
) -> Result<ActionResponse, ServiceError> {
    if command == AdminCommand::Start {
        if let Some(reason) = state.question_bank_error() {
            return Err(ServiceError::QuestionBankUnavailable(reason.to_string()));
        }
    }

    let document = state.admin().execute(command).await?;
    Ok(ActionResponse {
        message: message.to_string(),
        status: document.status,
    })
}

/// Begin a run through the question bank, starting with the pre-game countdown.
pub async fn start_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::Start, "game starting").await
}

/// Pause the running question.
pub async fn pause_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::Pause, "game paused").await
}

/// Replay the paused question with a fresh countdown.
pub async fn resume_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::Resume, "game resumed").await
}

/// Skip to the next question.
pub async fn next_question(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::Next, "advanced").await
}

/// Back to the lobby, clearing every score.
pub async fn restart_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::Restart, "game reset").await
}

/// Leave a round-boundary pause.
pub async fn continue_round(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    run(state, AdminCommand::ContinueRound, "next round started").await
}

/// Build the admin console view of `document`.
pub fn snapshot_of(state: &SharedState, document: Option<GameDocument>) -> AdminSnapshot {
    let controls = match &document {
        Some(document) => AdminControls::from(document),
        None => AdminControls::from(&GameDocument::default()),
    };
    let board = document
        .as_ref()
        .map(|document| leaderboard(&document.scores))
        .unwrap_or_default();

    AdminSnapshot {
        document,
        controls,
        question_count: state.questions().len(),
        question_bank_error: state.question_bank_error().map(str::to_string),
        leaderboard: board,
    }
}

/// Read the document and build the admin console view.
pub async fn snapshot(state: &SharedState) -> Result<AdminSnapshot, ServiceError> {
    let document = state.store().read().await?;
    Ok(snapshot_of(state, document))
}
