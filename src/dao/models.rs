//! Shared game document and question records as they live in the realtime store.
//!
//! Field names follow the wire format used by the TV and player pages (`camelCase`), and every
//! field carries a default so partially written documents still decode.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

/// Question index meaning "no question has been shown in this run yet".
pub const NO_QUESTION: i64 = -1;

/// Lifecycle status of the shared game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Lobby: players join, the admin may start.
    #[default]
    Waiting,
    /// Pre-game countdown before the first question.
    Prepare,
    /// A question is on screen and its countdown is running.
    Active,
    /// Manual pause or round boundary.
    Paused,
    /// The question bank is exhausted.
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Prepare => "prepare",
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Why the game is paused, so clients know whether Resume or Continue-Round applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PauseKind {
    /// The admin paused the current question.
    Manual,
    /// A round of questions was completed.
    Round,
}

/// Immutable multiple-choice question from the static bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionRecord {
    /// Prompt text.
    #[serde(alias = "pergunta")]
    pub prompt: String,
    /// Option labels in display order.
    #[serde(alias = "opcoes")]
    pub options: Vec<String>,
    /// The correct option; always one of `options`.
    #[serde(alias = "respostaCorreta")]
    pub answer: String,
}

impl QuestionRecord {
    /// Exact-match comparison against the correct option.
    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }

    /// Whether `option` is one of the offered labels.
    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }
}

/// The single shared record every client subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDocument {
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default = "no_question")]
    pub current_question_index: i64,
    #[serde(default)]
    pub current_question: Option<QuestionRecord>,
    /// Seconds left in the running countdown.
    #[serde(default)]
    pub timer: u32,
    /// Player name to score.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub scores: IndexMap<String, u32>,
    #[serde(default)]
    pub pause_kind: Option<PauseKind>,
    /// Identifier of the current run through the bank, set on every start.
    #[serde(default)]
    pub run_id: Option<Uuid>,
}

fn no_question() -> i64 {
    NO_QUESTION
}

impl Default for GameDocument {
    fn default() -> Self {
        Self {
            status: GameStatus::Waiting,
            current_question_index: NO_QUESTION,
            current_question: None,
            timer: 0,
            scores: IndexMap::new(),
            pause_kind: None,
            run_id: None,
        }
    }
}

impl GameDocument {
    /// Document written by a reset: lobby state, no scores, timer showing `timer`.
    pub fn initial(timer: u32) -> Self {
        Self {
            timer,
            ..Self::default()
        }
    }

    /// Current question index as a bank position, if one has been reached.
    pub fn question_position(&self) -> Option<usize> {
        usize::try_from(self.current_question_index).ok()
    }

    /// Merge a partial write into this document, field by field.
    pub fn apply(&mut self, patch: &DocumentPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(index) = patch.current_question_index {
            self.current_question_index = index;
        }
        if let Some(question) = &patch.current_question {
            self.current_question = question.clone();
        }
        if let Some(timer) = patch.timer {
            self.timer = timer;
        }
        if let Some(kind) = patch.pause_kind {
            self.pause_kind = kind;
        }
        if let Some(run_id) = patch.run_id {
            self.run_id = run_id;
        }
        for (player, score) in &patch.scores {
            self.scores.insert(player.clone(), *score);
        }
    }
}

/// Partial write merged into the shared document (last write wins per field).
///
/// `scores` entries are merged per player, so a player write never touches other entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub status: Option<GameStatus>,
    pub current_question_index: Option<i64>,
    pub current_question: Option<Option<QuestionRecord>>,
    pub timer: Option<u32>,
    pub pause_kind: Option<Option<PauseKind>>,
    pub run_id: Option<Option<Uuid>>,
    pub scores: IndexMap<String, u32>,
}

impl DocumentPatch {
    /// Set the status.
    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the question index.
    pub fn with_index(mut self, index: i64) -> Self {
        self.current_question_index = Some(index);
        self
    }

    /// Set or clear the displayed question.
    pub fn with_question(mut self, question: Option<QuestionRecord>) -> Self {
        self.current_question = Some(question);
        self
    }

    /// Set the countdown value.
    pub fn with_timer(mut self, timer: u32) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Set or clear the pause reason.
    pub fn with_pause_kind(mut self, kind: Option<PauseKind>) -> Self {
        self.pause_kind = Some(kind);
        self
    }

    /// Set or clear the run identifier.
    pub fn with_run_id(mut self, run_id: Option<Uuid>) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Write a single player's score.
    pub fn with_score(mut self, player: impl Into<String>, score: u32) -> Self {
        self.scores.insert(player.into(), score);
        self
    }

    /// Multi-location update body: top-level keys plus one `scores/<player>` key per score.
    pub fn to_update_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(status) = self.status {
            map.insert("status".into(), json!(status));
        }
        if let Some(index) = self.current_question_index {
            map.insert("currentQuestionIndex".into(), json!(index));
        }
        if let Some(question) = &self.current_question {
            map.insert("currentQuestion".into(), json!(question));
        }
        if let Some(timer) = self.timer {
            map.insert("timer".into(), json!(timer));
        }
        if let Some(kind) = self.pause_kind {
            map.insert("pauseKind".into(), json!(kind));
        }
        if let Some(run_id) = self.run_id {
            map.insert("runId".into(), json!(run_id));
        }
        for (player, score) in &self.scores {
            map.insert(format!("scores/{player}"), json!(score));
        }
        map
    }
}
