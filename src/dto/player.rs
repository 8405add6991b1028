//! DTOs for the player control surface.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{GameStatus, QuestionRecord},
    dto::validation::validate_player_name,
};

/// Request to join the game under a display name.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    /// Display name, also the key of the player's score entry.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    /// The name as stored (trimmed).
    pub name: String,
    pub score: u32,
}

/// A player's choice for the current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1))]
    pub option: String,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    AcceptedCorrect,
    AcceptedWrong,
    /// No question is open for answers.
    TooLate,
    /// This question was already answered by the player.
    AlreadyAnswered,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    pub outcome: AnswerOutcome,
    /// Score after the submission.
    pub score: u32,
}

/// Question as shown to players: the correct answer is withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuestionPrompt {
    pub index: i64,
    pub prompt: String,
    pub options: Vec<String>,
}

impl QuestionPrompt {
    /// Prompt and options of `question`, shown at position `index`.
    pub fn new(index: i64, question: &QuestionRecord) -> Self {
        Self {
            index,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

/// Short status line for the player screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerHint {
    /// The store holds no game yet.
    NoData,
    Waiting,
    GetReady,
    Choose,
    AnswerSent,
    Paused,
    RoundOver,
    GameOver,
}

/// Projection of the shared document for one player.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerView {
    pub name: String,
    /// `None` while the store holds no document.
    pub status: Option<GameStatus>,
    pub question: Option<QuestionPrompt>,
    pub timer: Option<u32>,
    /// `None` until the player has joined.
    pub score: Option<u32>,
    /// Whether answer buttons are enabled.
    pub can_answer: bool,
    /// Whether the current question was already answered.
    pub answered: bool,
    pub hint: PlayerHint,
}
