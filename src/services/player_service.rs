use crate::{
    dao::models::{GameDocument, GameStatus, PauseKind},
    dto::player::{PlayerHint, PlayerView, QuestionPrompt},
    error::ServiceError,
    services::scoring_service::open_question,
    state::{SharedState, game::AnswerLedger},
};

/// Project the shared document for `name`. `None` means the store has no game yet.
pub fn player_view(
    name: &str,
    document: Option<&GameDocument>,
    answers: &AnswerLedger,
) -> PlayerView {
    let Some(document) = document else {
        return PlayerView {
            name: name.to_string(),
            status: None,
            question: None,
            timer: None,
            score: None,
            can_answer: false,
            answered: false,
            hint: PlayerHint::NoData,
        };
    };

    let score = document.scores.get(name).copied();
    let open = open_question(document);
    let answered = open.is_some_and(|mark| answers.has_answered(name, mark));
    let can_answer = open.is_some() && score.is_some() && !answered;

    let question = open
        .and(document.current_question.as_ref())
        .map(|question| QuestionPrompt::new(document.current_question_index, question));

    let hint = match document.status {
        GameStatus::Waiting => PlayerHint::Waiting,
        GameStatus::Prepare => PlayerHint::GetReady,
        GameStatus::Active if answered => PlayerHint::AnswerSent,
        GameStatus::Active => PlayerHint::Choose,
        GameStatus::Paused if document.pause_kind == Some(PauseKind::Round) => {
            PlayerHint::RoundOver
        }
        GameStatus::Paused => PlayerHint::Paused,
        GameStatus::Finished => PlayerHint::GameOver,
    };

    let timer = matches!(document.status, GameStatus::Prepare | GameStatus::Active)
        .then_some(document.timer);

    PlayerView {
        name: name.to_string(),
        status: Some(document.status),
        question,
        timer,
        score,
        can_answer,
        answered,
        hint,
    }
}

/// Current view for a joined player.
pub async fn get_player(state: &SharedState, name: &str) -> Result<PlayerView, ServiceError> {
    let name = name.trim();
    let document = state.store().read().await?;
    let joined = document
        .as_ref()
        .is_some_and(|document| document.scores.contains_key(name));
    if !joined {
        return Err(ServiceError::NotFound(format!("player `{name}` has not joined")));
    }
    Ok(player_view(name, document.as_ref(), state.answers()))
}
