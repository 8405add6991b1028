//! Player joins and answer scoring.
//!
//! Players only ever write their own `scores/<name>` entry, so these operations never race with
//! the admin controller or with each other.

use tracing::{debug, info, warn};

use crate::{
    config::ScoringConfig,
    dao::models::{DocumentPatch, GameDocument, GameStatus},
    dto::{
        player::{AnswerOutcome, AnswerResponse, JoinResponse},
        validation::validate_player_name,
    },
    error::ServiceError,
    state::{SharedState, game::AnswerMark},
};

/// Score after one answer: correct adds the reward, wrong subtracts the penalty down to zero.
pub fn score_after(current: u32, correct: bool, scoring: &ScoringConfig) -> u32 {
    if correct {
        current.saturating_add(scoring.correct_points)
    } else {
        current.saturating_sub(scoring.wrong_penalty)
    }
}

/// The question currently open for answers, if any.
pub fn open_question(document: &GameDocument) -> Option<AnswerMark> {
    let open = document.status == GameStatus::Active
        && document.current_question.is_some()
        && document.current_question_index >= 0;
    open.then_some(AnswerMark {
        run_id: document.run_id,
        question_index: document.current_question_index,
    })
}

/// Register a player with a zero score.
pub async fn join(state: &SharedState, name: &str) -> Result<JoinResponse, ServiceError> {
    let name = name.trim();
    validate_player_name(name).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid player name".into()),
        )
    })?;

    let taken = || ServiceError::Conflict(format!("player name `{name}` is already taken"));
    // Held until the score entry is written.
    let _claim = state.joins().claim(name).ok_or_else(taken)?;

    let document = state.store().read().await?.unwrap_or_default();
    if document.scores.contains_key(name) {
        return Err(taken());
    }

    state
        .store()
        .update(DocumentPatch::default().with_score(name, 0))
        .await?;
    state.answers().forget(name);

    info!(player = name, "player joined");
    Ok(JoinResponse {
        name: name.to_string(),
        score: 0,
    })
}

/// Score a submission against the current question.
///
/// Only the first submission per player and question counts; later ones report
/// [`AnswerOutcome::AlreadyAnswered`] and leave the score alone.
pub async fn submit_answer(
    state: &SharedState,
    name: &str,
    option: &str,
) -> Result<AnswerResponse, ServiceError> {
    let name = name.trim();
    let document = state.store().read().await?.unwrap_or_default();
    let Some(&score) = document.scores.get(name) else {
        return Err(ServiceError::NotFound(format!("player `{name}` has not joined")));
    };

    let (Some(mark), Some(question)) = (open_question(&document), &document.current_question)
    else {
        debug!(player = name, status = %document.status, "answer arrived with no open question");
        return Ok(AnswerResponse {
            outcome: AnswerOutcome::TooLate,
            score,
        });
    };

    if !question.offers(option) {
        return Err(ServiceError::InvalidInput(format!(
            "`{option}` is not an option of the current question"
        )));
    }

    if !state.answers().claim(name, mark) {
        return Ok(AnswerResponse {
            outcome: AnswerOutcome::AlreadyAnswered,
            score,
        });
    }

    let correct = question.is_correct(option);
    let updated = score_after(score, correct, &state.config().scoring);

    if let Err(err) = state
        .store()
        .update(DocumentPatch::default().with_score(name, updated))
        .await
    {
        warn!(player = name, error = %err, "failed to write score");
        state.answers().release(name, mark);
        return Err(err.into());
    }

    debug!(
        player = name,
        question = mark.question_index,
        correct,
        score = updated,
        "answer scored"
    );
    Ok(AnswerResponse {
        outcome: if correct {
            AnswerOutcome::AcceptedCorrect
        } else {
            AnswerOutcome::AcceptedWrong
        },
        score: updated,
    })
}
