//! DTOs for the unauthenticated TV display stream.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::{GameDocument, GameStatus, PauseKind},
    dto::player::QuestionPrompt,
};

/// The shared document as the TV sees it. The correct option of the running question is withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicGame {
    pub status: GameStatus,
    pub current_question_index: i64,
    pub current_question: Option<QuestionPrompt>,
    /// Seconds left in the running countdown.
    pub timer: u32,
    #[schema(value_type = Object)]
    pub scores: IndexMap<String, u32>,
    pub pause_kind: Option<PauseKind>,
}

impl From<&GameDocument> for PublicGame {
    fn from(document: &GameDocument) -> Self {
        Self {
            status: document.status,
            current_question_index: document.current_question_index,
            current_question: document
                .current_question
                .as_ref()
                .map(|question| QuestionPrompt::new(document.current_question_index, question)),
            timer: document.timer,
            scores: document.scores.clone(),
            pause_kind: document.pause_kind,
        }
    }
}
