//! Admin controller: the only writer of the game's control fields.
//!
//! A single task owns the countdown and consumes one inbox carrying both admin commands and
//! countdown signals, so transitions never interleave. Each message runs through the pure
//! [`transition`] and its effects are applied in order: cancel the countdown, write the
//! document and wait for the store, then start the next countdown and publish cues.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::TimingConfig,
    dao::{
        game_store::GameStore,
        models::{GameDocument, GameStatus, PauseKind},
    },
    error::ServiceError,
    services::countdown::{CountdownTimer, TimerSignal},
    state::{
        questions::QuestionBank,
        state_machine::{
            Cue, DocumentWrite, Effect, GameEvent, Rules, Transition, TransitionError, transition,
        },
    },
};

const CUE_CAPACITY: usize = 32;

/// Commands exposed on the admin control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Pause,
    Resume,
    /// Manual skip to the next question.
    Next,
    Restart,
    ContinueRound,
}

impl AdminCommand {
    fn event(self) -> GameEvent {
        match self {
            AdminCommand::Start => GameEvent::Start {
                run_id: Uuid::new_v4(),
            },
            AdminCommand::Pause => GameEvent::Pause,
            AdminCommand::Resume => GameEvent::Resume,
            AdminCommand::Next => GameEvent::Skip,
            AdminCommand::Restart => GameEvent::Restart,
            AdminCommand::ContinueRound => GameEvent::ContinueRound,
        }
    }
}

/// Everything the controller task reacts to.
#[derive(Debug)]
pub enum AdminMessage {
    Command {
        command: AdminCommand,
        reply: oneshot::Sender<Result<GameDocument, ServiceError>>,
    },
    Timer(TimerSignal),
}

impl From<TimerSignal> for AdminMessage {
    fn from(signal: TimerSignal) -> Self {
        AdminMessage::Timer(signal)
    }
}

/// Cloneable handle to the running controller.
#[derive(Clone)]
pub struct AdminHandle {
    commands: mpsc::UnboundedSender<AdminMessage>,
    cues: broadcast::Sender<Cue>,
}

impl AdminHandle {
    /// Run `command` and return the document as written.
    pub async fn execute(&self, command: AdminCommand) -> Result<GameDocument, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(AdminMessage::Command { command, reply })
            .map_err(|_| ServiceError::ControllerStopped)?;
        response
            .await
            .map_err(|_| ServiceError::ControllerStopped)?
    }

    /// Receive cues published after each acknowledged write.
    pub fn subscribe_cues(&self) -> broadcast::Receiver<Cue> {
        self.cues.subscribe()
    }
}

/// Spawn the controller task on the current runtime.
pub fn spawn_admin_controller(
    store: Arc<dyn GameStore>,
    questions: QuestionBank,
    timing: TimingConfig,
) -> AdminHandle {
    let (commands, inbox) = mpsc::unbounded_channel();
    let (cues, _receiver) = broadcast::channel(CUE_CAPACITY);

    let controller = AdminController {
        store,
        questions,
        timing,
        countdown: CountdownTimer::new(commands.downgrade()),
        cues: cues.clone(),
    };
    tokio::spawn(controller.run(inbox));

    AdminHandle { commands, cues }
}

struct AdminController {
    store: Arc<dyn GameStore>,
    questions: QuestionBank,
    timing: TimingConfig,
    countdown: CountdownTimer<AdminMessage>,
    cues: broadcast::Sender<Cue>,
}

impl AdminController {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<AdminMessage>) {
        while let Some(message) = inbox.recv().await {
            match message {
                AdminMessage::Command { command, reply } => {
                    let result = self.dispatch(command.event()).await;
                    match &result {
                        Ok(document) => {
                            debug!(?command, status = %document.status, "admin command applied")
                        }
                        Err(err) => debug!(?command, error = %err, "admin command rejected"),
                    }
                    let _ = reply.send(result);
                }
                AdminMessage::Timer(signal) => self.on_timer(signal).await,
            }
        }

        self.countdown.cancel();
        debug!("admin controller stopped");
    }

    async fn on_timer(&mut self, signal: TimerSignal) {
        if !self.countdown.is_live(signal.generation()) {
            debug!(?signal, "ignoring signal from a stale countdown");
            return;
        }

        let event = match signal {
            TimerSignal::Tick { remaining, .. } => GameEvent::Tick { remaining },
            TimerSignal::Elapsed { .. } => {
                self.countdown.finish();
                GameEvent::CountdownElapsed
            }
        };

        if let Err(err) = self.dispatch(event).await {
            warn!(?signal, error = %err, "countdown transition failed");
        }
    }

    async fn dispatch(&mut self, event: GameEvent) -> Result<GameDocument, ServiceError> {
        let current = self.store.read().await?.unwrap_or_default();
        let rules = Rules {
            questions: &self.questions,
            timing: &self.timing,
        };

        let Transition { write, effects } = match transition(&current, event.clone(), &rules) {
            Ok(transition) => transition,
            Err(err @ TransitionError::NoQuestions) => {
                warn!("start refused: question bank is empty");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        if effects.contains(&Effect::CancelCountdown) {
            self.countdown.cancel();
        }

        let mut next = current.clone();
        let written = match write {
            DocumentWrite::Patch(patch) => {
                next.apply(&patch);
                self.store.update(patch).await
            }
            DocumentWrite::Replace(document) => {
                next = document.clone();
                self.store.replace(document).await
            }
        };
        if let Err(err) = written {
            warn!(?event, error = %err, "game document write failed; dropping effects");
            return Err(err.into());
        }

        if current.status != next.status {
            info!(
                from = %current.status,
                to = %next.status,
                question = next.current_question_index,
                "game status changed"
            );
        }

        for effect in effects {
            match effect {
                Effect::CancelCountdown => {}
                Effect::StartCountdown(countdown) => {
                    self.countdown.start(countdown.seconds);
                }
                Effect::Cue(cue) => {
                    debug!(?cue, "publishing cue");
                    let _ = self.cues.send(cue);
                }
            }
        }

        Ok(next)
    }
}

/// Whether a status accepts the given command, derived from the document alone.
pub fn command_allowed(document: &GameDocument, command: AdminCommand) -> bool {
    match command {
        AdminCommand::Start => {
            matches!(document.status, GameStatus::Waiting | GameStatus::Finished)
        }
        AdminCommand::Pause | AdminCommand::Next => document.status == GameStatus::Active,
        AdminCommand::Resume => {
            document.status == GameStatus::Paused && document.pause_kind == Some(PauseKind::Manual)
        }
        AdminCommand::ContinueRound => {
            document.status == GameStatus::Paused && document.pause_kind == Some(PauseKind::Round)
        }
        AdminCommand::Restart => true,
    }
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use futures::future::BoxFuture;
    use tokio::time::sleep;

    use super::*;
    use crate::dao::{
        game_store::{Subscription, memory::MemoryGameStore},
        models::{DocumentPatch, QuestionRecord},
        storage::{StorageError, StorageResult},
    };

    fn bank(count: usize) -> QuestionBank {
        QuestionBank::new(
            (0..count)
                .map(|i| QuestionRecord {
                    prompt: format!("Q{i}?"),
                    options: vec!["yes".into(), "no".into()],
                    answer: "yes".into(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn controller(count: usize) -> (Arc<MemoryGameStore>, AdminHandle) {
        let store = Arc::new(MemoryGameStore::with_document(GameDocument::initial(15)));
        let handle = spawn_admin_controller(store.clone(), bank(count), TimingConfig::default());
        (store, handle)
    }

    async fn document(store: &MemoryGameStore) -> GameDocument {
        store.read().await.unwrap().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn prepare_countdown_leads_into_first_question() {
        let (store, admin) = controller(3);

        let written = admin.execute(AdminCommand::Start).await.unwrap();
        assert_eq!(written.status, GameStatus::Prepare);

        sleep(Duration::from_millis(2_500)).await;
        let doc = document(&store).await;
        assert_eq!(doc.status, GameStatus::Prepare);
        assert_eq!(doc.timer, 3);

        sleep(Duration::from_secs(3)).await;
        let doc = document(&store).await;
        assert_eq!(doc.status, GameStatus::Active);
        assert_eq!(doc.current_question_index, 0);
        assert_eq!(doc.timer, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn question_expiry_advances_exactly_once() {
        let (store, admin) = controller(5);
        admin.execute(AdminCommand::Start).await.unwrap();

        // 5 s prepare + 15 s question 0 + half of question 1.
        sleep(Duration::from_millis(27_500)).await;
        let doc = document(&store).await;
        assert_eq!(doc.current_question_index, 1);
        assert_eq!(doc.timer, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_next_replaces_running_countdown() {
        let (store, admin) = controller(5);
        admin.execute(AdminCommand::Start).await.unwrap();
        sleep(Duration::from_millis(15_500)).await;
        assert_eq!(document(&store).await.current_question_index, 0);

        let written = admin.execute(AdminCommand::Next).await.unwrap();
        assert_eq!(written.current_question_index, 1);

        // The first question's countdown would have expired at t=20 s.
        sleep(Duration::from_millis(9_700)).await;
        let doc = document(&store).await;
        assert_eq!(doc.current_question_index, 1);
        assert_eq!(doc.timer, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resume_restarts_question() {
        let (store, admin) = controller(5);
        admin.execute(AdminCommand::Start).await.unwrap();
        sleep(Duration::from_millis(9_500)).await;

        let paused = admin.execute(AdminCommand::Pause).await.unwrap();
        assert_eq!(paused.status, GameStatus::Paused);
        assert_eq!(paused.timer, 11);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(document(&store).await, paused);

        let resumed = admin.execute(AdminCommand::Resume).await.unwrap();
        assert_eq!(resumed.status, GameStatus::Active);
        assert_eq!(resumed.current_question_index, 0);
        assert_eq!(resumed.timer, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn illegal_command_changes_nothing() {
        let (store, admin) = controller(3);
        let before = document(&store).await;

        let err = admin.execute(AdminCommand::Pause).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(document(&store).await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_questions_is_refused() {
        let (store, admin) = controller(0);
        let err = admin.execute(AdminCommand::Start).await.unwrap_err();
        assert!(matches!(err, ServiceError::QuestionBankUnavailable(_)));
        assert_eq!(document(&store).await.status, GameStatus::Waiting);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_stops_the_countdown_and_clears_scores() {
        let (store, admin) = controller(3);
        store
            .update(DocumentPatch::default().with_score("alice", 20))
            .await
            .unwrap();
        admin.execute(AdminCommand::Start).await.unwrap();
        sleep(Duration::from_millis(7_500)).await;

        let mut cues = admin.subscribe_cues();
        let reset = admin.execute(AdminCommand::Restart).await.unwrap();
        assert_eq!(reset, GameDocument::initial(15));
        assert_eq!(cues.recv().await.unwrap(), Cue::GameReset);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(document(&store).await, GameDocument::initial(15));
    }

    #[tokio::test(start_paused = true)]
    async fn warning_cues_follow_the_final_seconds() {
        let (_store, admin) = controller(3);
        admin.execute(AdminCommand::Start).await.unwrap();
        let mut cues = admin.subscribe_cues();

        let mut warnings = Vec::new();
        while warnings.len() < 5 {
            if let Cue::CountdownWarning { remaining } = cues.recv().await.unwrap() {
                warnings.push(remaining);
            }
        }
        assert_eq!(warnings, vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn round_boundary_waits_for_continue() {
        let store = Arc::new(MemoryGameStore::with_document(GameDocument::initial(15)));
        let timing = TimingConfig {
            round_size: 2,
            ..TimingConfig::default()
        };
        let admin = spawn_admin_controller(store.clone(), bank(5), timing);
        admin.execute(AdminCommand::Start).await.unwrap();
        sleep(Duration::from_millis(5_500)).await;
        admin.execute(AdminCommand::Next).await.unwrap();

        let paused = admin.execute(AdminCommand::Next).await.unwrap();
        assert_eq!(paused.status, GameStatus::Paused);
        assert_eq!(paused.pause_kind, Some(PauseKind::Round));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(document(&store).await.status, GameStatus::Paused);

        let next = admin.execute(AdminCommand::ContinueRound).await.unwrap();
        assert_eq!(next.status, GameStatus::Active);
        assert_eq!(next.current_question_index, 2);
    }

    fn rejected() -> StorageError {
        StorageError::unavailable("write rejected".into(), io::Error::other("read-only store"))
    }

    #[derive(Clone)]
    struct ReadOnlyStore(MemoryGameStore);

    impl GameStore for ReadOnlyStore {
        fn read(&self) -> BoxFuture<'static, StorageResult<Option<GameDocument>>> {
            self.0.read()
        }

        fn subscribe(&self) -> Subscription {
            self.0.subscribe()
        }

        fn update(&self, _patch: DocumentPatch) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(rejected()) })
        }

        fn replace(&self, _document: GameDocument) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(rejected()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_drops_the_countdown() {
        let inner = MemoryGameStore::with_document(GameDocument::initial(15));
        let store = Arc::new(ReadOnlyStore(inner.clone()));
        let admin = spawn_admin_controller(store, bank(3), TimingConfig::default());

        let err = admin.execute(AdminCommand::Start).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(
            inner.read().await.unwrap().unwrap(),
            GameDocument::initial(15)
        );
    }

    #[test]
    fn controls_follow_status() {
        let mut doc = GameDocument::initial(15);
        assert!(command_allowed(&doc, AdminCommand::Start));
        assert!(!command_allowed(&doc, AdminCommand::Pause));

        doc.status = GameStatus::Paused;
        doc.pause_kind = Some(PauseKind::Round);
        assert!(command_allowed(&doc, AdminCommand::ContinueRound));
        assert!(!command_allowed(&doc, AdminCommand::Resume));
        assert!(command_allowed(&doc, AdminCommand::Restart));
    }
}
