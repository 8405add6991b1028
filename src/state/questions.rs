//! Static question bank, loaded once at startup.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use rand::{rng, seq::SliceRandom};
use thiserror::Error;
use tracing::{error, info};

use crate::{config::AppConfig, dao::models::QuestionRecord};

/// Failures while loading or validating the question bank.
#[derive(Debug, Error)]
pub enum QuestionBankError {
    #[error("failed to read question bank `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse question bank `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("question bank `{path}` contains no questions")]
    Empty { path: PathBuf },
    #[error("question {index} is invalid: {reason}")]
    Invalid { index: usize, reason: &'static str },
}

/// Ordered, immutable list of questions. Cloning shares the underlying slice.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Arc<[QuestionRecord]>,
}

impl QuestionBank {
    /// Build a bank after checking every record.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, QuestionBankError> {
        for (index, question) in questions.iter().enumerate() {
            validate(index, question)?;
        }
        Ok(Self {
            questions: questions.into(),
        })
    }

    /// Bank used when loading failed; a game cannot be started with it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and validate a JSON array of questions.
    pub fn load(path: &Path) -> Result<Self, QuestionBankError> {
        let contents = fs::read_to_string(path).map_err(|source| QuestionBankError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let questions: Vec<QuestionRecord> =
            serde_json::from_str(&contents).map_err(|source| QuestionBankError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if questions.is_empty() {
            return Err(QuestionBankError::Empty {
                path: path.to_path_buf(),
            });
        }
        Self::new(questions)
    }

    /// Same questions in a random order.
    pub fn shuffled(&self) -> Self {
        let mut questions = self.questions.to_vec();
        questions.shuffle(&mut rng());
        Self {
            questions: questions.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }
}

fn validate(index: usize, question: &QuestionRecord) -> Result<(), QuestionBankError> {
    let reason = if question.prompt.trim().is_empty() {
        "prompt is empty"
    } else if question.options.len() < 2 {
        "fewer than two options"
    } else if !question.offers(&question.answer) {
        "correct answer is not one of the options"
    } else {
        return Ok(());
    };
    Err(QuestionBankError::Invalid { index, reason })
}

/// Load the configured bank, logging the outcome.
pub fn load_question_bank(config: &AppConfig) -> Result<QuestionBank, QuestionBankError> {
    match QuestionBank::load(&config.questions_path) {
        Ok(bank) => {
            info!(
                path = %config.questions_path.display(),
                count = bank.len(),
                "question bank loaded"
            );
            Ok(if config.shuffle_questions {
                bank.shuffled()
            } else {
                bank
            })
        }
        Err(err) => {
            error!(
                path = %config.questions_path.display(),
                error = %err,
                "question bank unavailable; games cannot be started"
            );
            Err(err)
        }
    }
}
