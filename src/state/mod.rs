pub mod game;
pub mod questions;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    services::game_service::{AdminHandle, spawn_admin_controller},
};

use self::{
    game::{AnswerLedger, PendingJoins},
    questions::{QuestionBank, QuestionBankError},
};

pub type SharedState = Arc<AppState>;

/// Central application state: the injected store, static questions and the admin controller.
pub struct AppState {
    store: Arc<dyn GameStore>,
    questions: QuestionBank,
    question_bank_error: Option<String>,
    config: AppConfig,
    admin: AdminHandle,
    answers: AnswerLedger,
    joins: PendingJoins,
    admin_token: Mutex<Option<String>>,
}

impl AppState {
    /// Build the shared state and spawn the admin controller on the current runtime.
    ///
    /// A failed question bank load leaves the bank empty; the error is kept for the admin view
    /// and starting a game is refused.
    pub fn new(
        store: Arc<dyn GameStore>,
        config: AppConfig,
        questions: Result<QuestionBank, QuestionBankError>,
    ) -> SharedState {
        let (questions, question_bank_error) = match questions {
            Ok(bank) => (bank, None),
            Err(err) => (QuestionBank::empty(), Some(err.to_string())),
        };
        let admin = spawn_admin_controller(store.clone(), questions.clone(), config.timing.clone());

        Arc::new(Self {
            store,
            questions,
            question_bank_error,
            config,
            admin,
            answers: AnswerLedger::new(),
            joins: PendingJoins::new(),
            admin_token: Mutex::new(None),
        })
    }

    /// The realtime store holding the shared game document.
    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    /// Why the question bank is empty, if loading failed.
    pub fn question_bank_error(&self) -> Option<&str> {
        self.question_bank_error.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the single writer of the game's control fields.
    pub fn admin(&self) -> &AdminHandle {
        &self.admin
    }

    /// Per-player record of answered questions.
    pub fn answers(&self) -> &AnswerLedger {
        &self.answers
    }

    /// Names currently being registered.
    pub fn joins(&self) -> &PendingJoins {
        &self.joins
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        &self.admin_token
    }
}
