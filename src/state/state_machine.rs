//! Game progression rules as a pure function of the shared document.
//!
//! [`transition`] never performs I/O: it returns the write to apply to the shared document and
//! the side effects (countdown control, cues) the admin shell must execute, in order.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::TimingConfig,
    dao::models::{DocumentPatch, GameDocument, GameStatus, NO_QUESTION, PauseKind},
    state::questions::QuestionBank,
};

/// Inputs to the state machine: admin commands and countdown signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Begin a new run through the bank, starting with the pre-game countdown.
    Start {
        /// Identifier stamped on the run.
        run_id: Uuid,
    },
    /// Manual pause of the running question.
    Pause,
    /// Leave a manual pause, replaying the current question.
    Resume,
    /// Manual skip to the next question.
    Skip,
    /// Leave a round-boundary pause with the next question.
    ContinueRound,
    /// Overwrite the document with the lobby state, clearing scores.
    Restart,
    /// One second elapsed on the running countdown.
    Tick {
        /// Seconds left after this tick.
        remaining: u32,
    },
    /// The running countdown reached zero.
    CountdownElapsed,
}

/// Which countdown a [`Countdown`] effect starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    Prepare,
    Question,
}

/// Countdown request emitted by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub kind: CountdownKind,
    pub seconds: u32,
}

/// Audible/visual cue for the TV display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    /// Lobby opened; the TV loops its intro music.
    GameReset,
    /// A question entered its final seconds.
    CountdownWarning { remaining: u32 },
    /// A round of questions ended.
    RoundComplete { questions_played: usize },
    /// The bank is exhausted.
    GameFinished,
}

/// Side effects to perform around the document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop the running countdown; always listed before any other effect and applied
    /// before the write.
    CancelCountdown,
    /// Start a countdown once the write has been acknowledged.
    StartCountdown(Countdown),
    Cue(Cue),
}

/// How the shared document changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentWrite {
    Patch(DocumentPatch),
    Replace(GameDocument),
}

/// Outcome of a legal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub write: DocumentWrite,
    pub effects: Vec<Effect>,
}

/// Error returned when an event is not legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from}")]
pub struct InvalidTransition {
    /// Status the document was in when the event was received.
    pub from: GameStatus,
    /// The rejected event.
    pub event: GameEvent,
}

/// Errors produced by [`transition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
    #[error("question bank is empty; load questions before starting a game")]
    NoQuestions,
}

/// Everything besides the document that the rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct Rules<'a> {
    pub questions: &'a QuestionBank,
    pub timing: &'a TimingConfig,
}

/// Whether reaching `next_index` ends a round.
pub fn is_round_boundary(next_index: usize, round_size: usize) -> bool {
    round_size > 0 && next_index != 0 && next_index % round_size == 0
}

/// Compute the write and effects for `event` applied to `document`.
pub fn transition(
    document: &GameDocument,
    event: GameEvent,
    rules: &Rules<'_>,
) -> Result<Transition, TransitionError> {
    let timing = rules.timing;

    let transition = match (document.status, document.pause_kind, &event) {
        (_, _, GameEvent::Restart) => Transition {
            write: DocumentWrite::Replace(GameDocument::initial(timing.question_seconds)),
            effects: vec![Effect::CancelCountdown, Effect::Cue(Cue::GameReset)],
        },
        (GameStatus::Waiting | GameStatus::Finished, _, GameEvent::Start { run_id }) => {
            if rules.questions.is_empty() {
                return Err(TransitionError::NoQuestions);
            }
            Transition {
                write: DocumentWrite::Patch(
                    DocumentPatch::default()
                        .with_status(GameStatus::Prepare)
                        .with_index(NO_QUESTION)
                        .with_question(None)
                        .with_timer(timing.prepare_seconds)
                        .with_pause_kind(None)
                        .with_run_id(Some(*run_id)),
                ),
                effects: vec![
                    Effect::CancelCountdown,
                    Effect::StartCountdown(Countdown {
                        kind: CountdownKind::Prepare,
                        seconds: timing.prepare_seconds,
                    }),
                ],
            }
        }
        (GameStatus::Active, _, GameEvent::Pause) => Transition {
            write: DocumentWrite::Patch(
                DocumentPatch::default()
                    .with_status(GameStatus::Paused)
                    .with_question(None)
                    .with_pause_kind(Some(PauseKind::Manual)),
            ),
            effects: vec![Effect::CancelCountdown],
        },
        (GameStatus::Paused, Some(PauseKind::Manual), GameEvent::Resume) => {
            let question = document
                .question_position()
                .and_then(|index| rules.questions.get(index))
                .ok_or_else(|| invalid(document, &event))?;
            Transition {
                write: DocumentWrite::Patch(
                    DocumentPatch::default()
                        .with_status(GameStatus::Active)
                        .with_question(Some(question.clone()))
                        .with_timer(timing.question_seconds)
                        .with_pause_kind(None),
                ),
                effects: vec![
                    Effect::CancelCountdown,
                    Effect::StartCountdown(Countdown {
                        kind: CountdownKind::Question,
                        seconds: timing.question_seconds,
                    }),
                ],
            }
        }
        (GameStatus::Active, _, GameEvent::Skip | GameEvent::CountdownElapsed)
        | (GameStatus::Prepare, _, GameEvent::CountdownElapsed) => {
            advance(document, rules, RoundCheck::Enforce)
        }
        (GameStatus::Paused, Some(PauseKind::Round), GameEvent::ContinueRound) => {
            advance(document, rules, RoundCheck::Resolved)
        }
        (GameStatus::Prepare | GameStatus::Active, _, GameEvent::Tick { remaining }) => {
            let mut effects = Vec::new();
            let warning = document.status == GameStatus::Active
                && *remaining > 0
                && *remaining <= timing.warning_seconds;
            if warning {
                effects.push(Effect::Cue(Cue::CountdownWarning {
                    remaining: *remaining,
                }));
            }
            Transition {
                write: DocumentWrite::Patch(DocumentPatch::default().with_timer(*remaining)),
                effects,
            }
        }
        _ => return Err(invalid(document, &event).into()),
    };

    Ok(transition)
}

fn invalid(document: &GameDocument, event: &GameEvent) -> InvalidTransition {
    InvalidTransition {
        from: document.status,
        event: event.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundCheck {
    /// Stop at a round boundary.
    Enforce,
    /// The boundary was already paused on and the admin chose to continue.
    Resolved,
}

/// Move past the current question. End of bank is checked before the round boundary.
fn advance(document: &GameDocument, rules: &Rules<'_>, check: RoundCheck) -> Transition {
    let timing = rules.timing;
    let next = usize::try_from(document.current_question_index.saturating_add(1)).unwrap_or(0);
    let mut effects = vec![Effect::CancelCountdown];

    let Some(question) = rules.questions.get(next) else {
        effects.push(Effect::Cue(Cue::GameFinished));
        return Transition {
            write: DocumentWrite::Patch(
                DocumentPatch::default()
                    .with_status(GameStatus::Finished)
                    .with_question(None)
                    .with_timer(0)
                    .with_pause_kind(None),
            ),
            effects,
        };
    };

    if check == RoundCheck::Enforce && is_round_boundary(next, timing.round_size) {
        effects.push(Effect::Cue(Cue::RoundComplete {
            questions_played: next,
        }));
        return Transition {
            write: DocumentWrite::Patch(
                DocumentPatch::default()
                    .with_status(GameStatus::Paused)
                    .with_question(None)
                    .with_pause_kind(Some(PauseKind::Round)),
            ),
            effects,
        };
    }

    effects.push(Effect::StartCountdown(Countdown {
        kind: CountdownKind::Question,
        seconds: timing.question_seconds,
    }));
    Transition {
        write: DocumentWrite::Patch(
            DocumentPatch::default()
                .with_index(next as i64)
                .with_question(Some(question.clone()))
                .with_status(GameStatus::Active)
                .with_timer(timing.question_seconds)
                .with_pause_kind(None),
        ),
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::QuestionRecord;

    fn bank(count: usize) -> QuestionBank {
        QuestionBank::new(
            (0..count)
                .map(|i| QuestionRecord {
                    prompt: format!("Question {i}?"),
                    options: vec![format!("right {i}"), format!("wrong {i}")],
                    answer: format!("right {i}"),
                })
                .collect(),
        )
        .unwrap()
    }

    struct Game {
        document: GameDocument,
        questions: QuestionBank,
        timing: TimingConfig,
    }

    impl Game {
        fn new(count: usize) -> Self {
            Self {
                document: GameDocument::initial(15),
                questions: bank(count),
                timing: TimingConfig::default(),
            }
        }

        fn try_apply(&mut self, event: GameEvent) -> Result<Vec<Effect>, TransitionError> {
            let rules = Rules {
                questions: &self.questions,
                timing: &self.timing,
            };
            let Transition { write, effects } = transition(&self.document, event, &rules)?;
            match write {
                DocumentWrite::Patch(patch) => self.document.apply(&patch),
                DocumentWrite::Replace(document) => self.document = document,
            }
            self.assert_consistent();
            Ok(effects)
        }

        fn apply(&mut self, event: GameEvent) -> Vec<Effect> {
            self.try_apply(event).unwrap()
        }

        /// Start and run the pre-game countdown out, landing on question 0.
        fn start(&mut self) {
            self.apply(GameEvent::Start {
                run_id: Uuid::new_v4(),
            });
            self.apply(GameEvent::CountdownElapsed);
        }

        fn assert_consistent(&self) {
            let doc = &self.document;
            let shows_question = doc.status == GameStatus::Active && doc.current_question_index >= 0;
            assert_eq!(
                doc.current_question.is_some(),
                shows_question,
                "question presence out of sync with {doc:?}"
            );
            if let Some(question) = &doc.current_question {
                let index = doc.question_position().unwrap();
                assert_eq!(Some(question), self.questions.get(index));
            }
        }
    }

    #[test]
    fn start_enters_prepare_with_countdown() {
        let mut game = Game::new(3);
        let effects = game.apply(GameEvent::Start {
            run_id: Uuid::nil(),
        });

        assert_eq!(game.document.status, GameStatus::Prepare);
        assert_eq!(game.document.current_question_index, NO_QUESTION);
        assert_eq!(game.document.timer, 5);
        assert_eq!(game.document.run_id, Some(Uuid::nil()));
        assert_eq!(
            effects,
            vec![
                Effect::CancelCountdown,
                Effect::StartCountdown(Countdown {
                    kind: CountdownKind::Prepare,
                    seconds: 5,
                }),
            ]
        );
    }

    #[test]
    fn prepare_expiry_shows_first_question() {
        let mut game = Game::new(3);
        game.start();

        assert_eq!(game.document.status, GameStatus::Active);
        assert_eq!(game.document.current_question_index, 0);
        assert_eq!(game.document.timer, 15);
    }

    #[test]
    fn start_refuses_empty_bank() {
        let mut game = Game::new(0);
        let err = game
            .try_apply(GameEvent::Start {
                run_id: Uuid::new_v4(),
            })
            .unwrap_err();

        assert_eq!(err, TransitionError::NoQuestions);
        assert_eq!(game.document.status, GameStatus::Waiting);
    }

    #[test]
    fn start_keeps_scores() {
        let mut game = Game::new(2);
        game.document.scores.insert("alice".into(), 40);
        game.start();
        assert_eq!(game.document.scores.get("alice"), Some(&40));
    }

    #[test]
    fn start_is_illegal_while_running() {
        let mut game = Game::new(3);
        game.start();
        let err = game
            .try_apply(GameEvent::Start {
                run_id: Uuid::new_v4(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Invalid(InvalidTransition {
                from: GameStatus::Active,
                ..
            })
        ));
    }

    #[test]
    fn ten_question_bank_finishes_without_round_pause() {
        let mut game = Game::new(10);
        game.start();

        for _ in 0..9 {
            game.apply(GameEvent::Skip);
            assert_eq!(game.document.status, GameStatus::Active);
        }
        assert_eq!(game.document.current_question_index, 9);

        let effects = game.apply(GameEvent::Skip);
        assert_eq!(game.document.status, GameStatus::Finished);
        assert_eq!(game.document.timer, 0);
        assert!(effects.contains(&Effect::Cue(Cue::GameFinished)));
    }

    #[test]
    fn round_boundary_pauses_until_continue() {
        let mut game = Game::new(25);
        game.start();
        for _ in 0..9 {
            game.apply(GameEvent::CountdownElapsed);
        }
        assert_eq!(game.document.current_question_index, 9);

        let effects = game.apply(GameEvent::CountdownElapsed);
        assert_eq!(game.document.status, GameStatus::Paused);
        assert_eq!(game.document.pause_kind, Some(PauseKind::Round));
        assert_eq!(game.document.current_question_index, 9);
        assert!(game.document.current_question.is_none());
        assert_eq!(
            effects,
            vec![
                Effect::CancelCountdown,
                Effect::Cue(Cue::RoundComplete {
                    questions_played: 10
                }),
            ]
        );

        // No automatic exit: the countdown is not restarted and a stray expiry is rejected.
        assert!(game.try_apply(GameEvent::CountdownElapsed).is_err());
        assert!(game.try_apply(GameEvent::Resume).is_err());

        game.apply(GameEvent::ContinueRound);
        assert_eq!(game.document.status, GameStatus::Active);
        assert_eq!(game.document.current_question_index, 10);
        assert!(game.document.pause_kind.is_none());
    }

    #[test]
    fn skip_also_stops_at_round_boundary() {
        let mut game = Game::new(25);
        game.start();
        for _ in 0..19 {
            game.apply(GameEvent::Skip);
            if game.document.status == GameStatus::Paused {
                game.apply(GameEvent::ContinueRound);
            }
        }
        assert_eq!(game.document.current_question_index, 19);
        game.apply(GameEvent::Skip);
        assert_eq!(game.document.pause_kind, Some(PauseKind::Round));
    }

    #[test]
    fn end_of_bank_takes_precedence_over_round_boundary() {
        let mut game = Game::new(20);
        game.start();
        for _ in 0..19 {
            game.apply(GameEvent::Skip);
            if game.document.status == GameStatus::Paused {
                game.apply(GameEvent::ContinueRound);
            }
        }
        assert_eq!(game.document.current_question_index, 19);

        game.apply(GameEvent::Skip);
        assert_eq!(game.document.status, GameStatus::Finished);
        assert!(game.document.pause_kind.is_none());
    }

    #[test]
    fn finished_is_terminal_for_advance() {
        let mut game = Game::new(1);
        game.start();
        game.apply(GameEvent::Skip);
        assert_eq!(game.document.status, GameStatus::Finished);

        let before = game.document.clone();
        for event in [
            GameEvent::Skip,
            GameEvent::CountdownElapsed,
            GameEvent::ContinueRound,
            GameEvent::Pause,
            GameEvent::Resume,
        ] {
            assert!(game.try_apply(event).is_err());
        }
        assert_eq!(game.document, before);
    }

    #[test]
    fn start_from_finished_replays_bank() {
        let mut game = Game::new(1);
        game.start();
        game.apply(GameEvent::Skip);
        let first_run = game.document.run_id;

        game.start();
        assert_eq!(game.document.status, GameStatus::Active);
        assert_eq!(game.document.current_question_index, 0);
        assert_ne!(game.document.run_id, first_run);
    }

    #[test]
    fn pause_and_resume_replay_current_question() {
        let mut game = Game::new(5);
        game.start();
        game.apply(GameEvent::Skip);
        game.apply(GameEvent::Tick { remaining: 7 });

        let effects = game.apply(GameEvent::Pause);
        assert_eq!(effects, vec![Effect::CancelCountdown]);
        assert_eq!(game.document.status, GameStatus::Paused);
        assert_eq!(game.document.pause_kind, Some(PauseKind::Manual));
        assert_eq!(game.document.timer, 7);
        assert!(game.try_apply(GameEvent::ContinueRound).is_err());

        let effects = game.apply(GameEvent::Resume);
        assert_eq!(game.document.status, GameStatus::Active);
        assert_eq!(game.document.current_question_index, 1);
        assert_eq!(game.document.timer, 15);
        assert!(effects.contains(&Effect::StartCountdown(Countdown {
            kind: CountdownKind::Question,
            seconds: 15,
        })));
    }

    #[test]
    fn pause_and_resume_are_illegal_elsewhere() {
        let mut game = Game::new(3);
        assert!(game.try_apply(GameEvent::Pause).is_err());
        assert!(game.try_apply(GameEvent::Resume).is_err());
        assert!(game.try_apply(GameEvent::Skip).is_err());
        game.apply(GameEvent::Start {
            run_id: Uuid::new_v4(),
        });
        assert!(game.try_apply(GameEvent::Pause).is_err());
        assert!(game.try_apply(GameEvent::Skip).is_err());
    }

    #[test]
    fn ticks_update_timer_and_warn_near_the_end() {
        let mut game = Game::new(3);
        game.apply(GameEvent::Start {
            run_id: Uuid::new_v4(),
        });
        assert!(game.apply(GameEvent::Tick { remaining: 3 }).is_empty());
        assert_eq!(game.document.timer, 3);

        game.apply(GameEvent::CountdownElapsed);
        assert!(game.apply(GameEvent::Tick { remaining: 6 }).is_empty());
        assert_eq!(
            game.apply(GameEvent::Tick { remaining: 5 }),
            vec![Effect::Cue(Cue::CountdownWarning { remaining: 5 })]
        );
        assert!(game.apply(GameEvent::Tick { remaining: 0 }).is_empty());
        assert_eq!(game.document.timer, 0);
    }

    #[test]
    fn ticks_are_rejected_when_no_countdown_should_run() {
        let mut game = Game::new(3);
        assert!(game.try_apply(GameEvent::Tick { remaining: 3 }).is_err());
        game.start();
        game.apply(GameEvent::Pause);
        assert!(game.try_apply(GameEvent::Tick { remaining: 3 }).is_err());
    }

    #[test]
    fn restart_from_any_state_clears_everything() {
        let mut game = Game::new(25);
        let mut states = Vec::new();

        game.document.scores.insert("alice".into(), 30);
        states.push(game.document.clone());
        game.apply(GameEvent::Start {
            run_id: Uuid::new_v4(),
        });
        states.push(game.document.clone());
        game.apply(GameEvent::CountdownElapsed);
        states.push(game.document.clone());
        game.apply(GameEvent::Pause);
        states.push(game.document.clone());
        game.apply(GameEvent::Resume);
        for _ in 0..9 {
            game.apply(GameEvent::Skip);
        }
        states.push(game.document.clone());
        game.document.status = GameStatus::Finished;
        game.document.current_question = None;
        states.push(game.document.clone());

        for state in states {
            game.document = state;
            let effects = game.apply(GameEvent::Restart);
            assert_eq!(game.document, GameDocument::initial(15));
            assert!(game.document.scores.is_empty());
            assert_eq!(effects[0], Effect::CancelCountdown);
        }
    }

    #[test]
    fn cancel_is_listed_before_new_countdowns() {
        let mut game = Game::new(5);
        game.start();
        let effects = game.apply(GameEvent::Skip);
        assert_eq!(effects.first(), Some(&Effect::CancelCountdown));
        assert!(matches!(effects.last(), Some(Effect::StartCountdown(_))));
    }

    #[test]
    fn round_boundary_helper() {
        assert!(!is_round_boundary(0, 10));
        assert!(!is_round_boundary(9, 10));
        assert!(is_round_boundary(10, 10));
        assert!(is_round_boundary(20, 10));
        assert!(!is_round_boundary(10, 0));
    }
}
