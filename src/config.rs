//! Application-level configuration loading: game timing, scoring and the question bank location.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_NIGHT_CONFIG_PATH";
/// Default location of the question bank.
const DEFAULT_QUESTIONS_PATH: &str = "questions.json";
/// Environment variable that overrides the configured question bank path.
const QUESTIONS_PATH_ENV: &str = "QUIZ_NIGHT_QUESTIONS_PATH";

/// Countdown durations and round size driving game progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    /// Seconds players get per question.
    pub question_seconds: u32,
    /// Pre-game countdown shown after Start.
    pub prepare_seconds: u32,
    /// Final seconds of a question that trigger the warning cue.
    pub warning_seconds: u32,
    /// Questions per round; a mandatory pause follows each full round.
    pub round_size: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            question_seconds: 15,
            prepare_seconds: 5,
            warning_seconds: 5,
            round_size: 10,
        }
    }
}

/// Points applied by the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    pub correct_points: u32,
    /// Subtracted on a wrong answer; scores never drop below zero.
    pub wrong_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            correct_points: 10,
            wrong_penalty: 5,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub questions_path: PathBuf,
    /// Shuffle the bank once at load time.
    pub shuffle_questions: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        question_seconds = config.timing.question_seconds,
                        round_size = config.timing.round_size,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(questions_path) = env::var_os(QUESTIONS_PATH_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
        {
            config.questions_path = questions_path;
        }

        config
    }

    /// Parse a JSON configuration document; missing keys take their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            scoring: ScoringConfig::default(),
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
            shuffle_questions: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    timing: RawTiming,
    scoring: RawScoring,
    questions_path: Option<PathBuf>,
    shuffle_questions: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTiming {
    question_seconds: Option<u32>,
    prepare_seconds: Option<u32>,
    warning_seconds: Option<u32>,
    round_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawScoring {
    correct_points: Option<u32>,
    wrong_penalty: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            timing: value.timing.into(),
            scoring: value.scoring.into(),
            questions_path: value.questions_path.unwrap_or(defaults.questions_path),
            shuffle_questions: value.shuffle_questions,
        }
    }
}

impl From<RawTiming> for TimingConfig {
    fn from(value: RawTiming) -> Self {
        let defaults = TimingConfig::default();
        // Zero-length countdowns would skip questions; keep the defaults instead.
        Self {
            question_seconds: positive(value.question_seconds, "questionSeconds")
                .unwrap_or(defaults.question_seconds),
            prepare_seconds: positive(value.prepare_seconds, "prepareSeconds")
                .unwrap_or(defaults.prepare_seconds),
            warning_seconds: value.warning_seconds.unwrap_or(defaults.warning_seconds),
            round_size: value.round_size.unwrap_or(defaults.round_size),
        }
    }
}

impl From<RawScoring> for ScoringConfig {
    fn from(value: RawScoring) -> Self {
        let defaults = ScoringConfig::default();
        Self {
            correct_points: value.correct_points.unwrap_or(defaults.correct_points),
            wrong_penalty: value.wrong_penalty.unwrap_or(defaults.wrong_penalty),
        }
    }
}

fn positive(value: Option<u32>, key: &'static str) -> Option<u32> {
    match value {
        Some(0) => {
            warn!(key, "zero duration in config; using default");
            None
        }
        other => other,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.questions_path, PathBuf::from("questions.json"));
        assert!(!config.shuffle_questions);
    }

    #[test]
    fn partial_document_overrides_selected_keys() {
        let config = AppConfig::from_json(
            r#"{
                "timing": { "questionSeconds": 20, "roundSize": 5 },
                "scoring": { "wrongPenalty": 0 },
                "questionsPath": "banks/night.json",
                "shuffleQuestions": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.timing.question_seconds, 20);
        assert_eq!(config.timing.prepare_seconds, 5);
        assert_eq!(config.timing.round_size, 5);
        assert_eq!(config.scoring.correct_points, 10);
        assert_eq!(config.scoring.wrong_penalty, 0);
        assert_eq!(config.questions_path, PathBuf::from("banks/night.json"));
        assert!(config.shuffle_questions);
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let config =
            AppConfig::from_json(r#"{ "timing": { "questionSeconds": 0, "prepareSeconds": 0 } }"#)
                .unwrap();
        assert_eq!(config.timing.question_seconds, 15);
        assert_eq!(config.timing.prepare_seconds, 5);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json(r#"{ "timing": { "questionSeconds": "soon" } }"#).is_err());
    }
}
