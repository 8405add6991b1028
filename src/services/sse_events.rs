use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::GameDocument,
    dto::{
        public::PublicGame,
        sse::{AdminHandshake, ServerEvent},
    },
    services::{admin_service, player_service},
    state::{SharedState, state_machine::Cue},
};

const EVENT_GAME: &str = "game";
const EVENT_PENDING: &str = "pending";
const EVENT_CUE: &str = "cue";
const EVENT_PLAYER: &str = "player";
const EVENT_ADMIN_TOKEN: &str = "admin_token";

/// Public event for the TV display: the document without the answer, or `pending` while none exists.
pub fn game_event(document: Option<&GameDocument>) -> Option<ServerEvent> {
    match document {
        Some(document) => to_event(EVENT_GAME, &PublicGame::from(document)),
        None => Some(ServerEvent::new(
            Some(EVENT_PENDING.to_string()),
            "no game data yet".to_string(),
        )),
    }
}

/// Admin console view of `document`.
pub fn admin_game_event(state: &SharedState, document: Option<GameDocument>) -> Option<ServerEvent> {
    to_event(EVENT_GAME, &admin_service::snapshot_of(state, document))
}

/// Player view of `document` for `name`.
pub fn player_event(
    state: &SharedState,
    name: &str,
    document: Option<&GameDocument>,
) -> Option<ServerEvent> {
    to_event(
        EVENT_PLAYER,
        &player_service::player_view(name, document, state.answers()),
    )
}

pub fn cue_event(cue: &Cue) -> Option<ServerEvent> {
    to_event(EVENT_CUE, cue)
}

/// First event on the admin stream, carrying the token for admin routes.
pub fn admin_token_event(token: &str) -> Option<ServerEvent> {
    to_event(
        EVENT_ADMIN_TOKEN,
        &AdminHandshake {
            token: token.to_string(),
        },
    )
}

fn to_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{GameStatus, QuestionRecord};

    #[test]
    fn missing_document_is_reported_as_pending() {
        let event = game_event(None).unwrap();
        assert_eq!(event.event.as_deref(), Some("pending"));
    }

    #[test]
    fn document_is_sent_in_wire_format() {
        let event = game_event(Some(&GameDocument::initial(15))).unwrap();
        assert_eq!(event.event.as_deref(), Some("game"));
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(value["status"], "waiting");
        assert_eq!(value["currentQuestionIndex"], -1);
        assert_eq!(value["timer"], 15);
    }

    #[test]
    fn public_game_withholds_the_answer() {
        let document = GameDocument {
            status: GameStatus::Active,
            current_question_index: 2,
            current_question: Some(QuestionRecord {
                prompt: "Capital of France?".into(),
                options: vec!["Paris".into(), "Lyon".into()],
                answer: "Paris".into(),
            }),
            ..GameDocument::initial(15)
        };

        let event = game_event(Some(&document)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        let question = &value["currentQuestion"];
        assert_eq!(question["prompt"], "Capital of France?");
        assert_eq!(question["options"][1], "Lyon");
        assert!(question.get("answer").is_none());
    }

    #[test]
    fn cues_are_tagged() {
        let event = cue_event(&Cue::CountdownWarning { remaining: 3 }).unwrap();
        assert_eq!(event.event.as_deref(), Some("cue"));
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(value["cue"], "countdown_warning");
        assert_eq!(value["remaining"], 3);
    }
}
