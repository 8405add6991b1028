//! DTO definitions used by the admin REST API and documentation layer.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::{GameDocument, GameStatus},
    services::game_service::{AdminCommand, command_allowed},
};

/// Outcome of an admin command.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
    /// Status written by the command.
    pub status: GameStatus,
}

/// Which admin buttons are enabled, derived purely from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminControls {
    pub start: bool,
    pub pause: bool,
    pub resume: bool,
    pub next: bool,
    pub restart: bool,
    pub continue_round: bool,
}

impl From<&GameDocument> for AdminControls {
    fn from(document: &GameDocument) -> Self {
        Self {
            start: command_allowed(document, AdminCommand::Start),
            pause: command_allowed(document, AdminCommand::Pause),
            resume: command_allowed(document, AdminCommand::Resume),
            next: command_allowed(document, AdminCommand::Next),
            restart: command_allowed(document, AdminCommand::Restart),
            continue_round: command_allowed(document, AdminCommand::ContinueRound),
        }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based; tied scores share a rank.
    pub rank: usize,
    pub name: String,
    pub score: u32,
}

/// Scores sorted from highest to lowest, ties ordered by name.
pub fn leaderboard(scores: &IndexMap<String, u32>) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<(&String, u32)> = scores
        .iter()
        .map(|(name, score)| (name, *score))
        .collect();
    ordered.sort_by(|(a_name, a_score), (b_name, b_score)| {
        b_score.cmp(a_score).then_with(|| a_name.cmp(b_name))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(ordered.len());
    for (position, (name, score)) in ordered.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(previous) if previous.score == score => previous.rank,
            _ => position + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            name: name.clone(),
            score,
        });
    }
    entries
}

/// Everything the admin console renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminSnapshot {
    /// `None` until the store holds a game document.
    pub document: Option<GameDocument>,
    pub controls: AdminControls,
    pub question_count: usize,
    /// Blocking message shown when the question bank failed to load.
    pub question_bank_error: Option<String>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::PauseKind;

    #[test]
    fn leaderboard_sorts_by_score_then_name() {
        let scores: IndexMap<String, u32> = [("carol", 10), ("alice", 20), ("bob", 10), ("dave", 0)]
            .into_iter()
            .map(|(name, score)| (name.to_string(), score))
            .collect();

        let board = leaderboard(&scores);
        let rows: Vec<_> = board
            .iter()
            .map(|entry| (entry.rank, entry.name.as_str(), entry.score))
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, "alice", 20),
                (2, "bob", 10),
                (2, "carol", 10),
                (4, "dave", 0)
            ]
        );
    }

    #[test]
    fn controls_for_manual_pause() {
        let document = GameDocument {
            status: GameStatus::Paused,
            pause_kind: Some(PauseKind::Manual),
            current_question_index: 3,
            ..GameDocument::default()
        };

        assert_eq!(
            AdminControls::from(&document),
            AdminControls {
                start: false,
                pause: false,
                resume: true,
                next: false,
                restart: true,
                continue_round: false,
            }
        );
    }

    #[test]
    fn controls_for_active_question() {
        let document = GameDocument {
            status: GameStatus::Active,
            current_question_index: 0,
            ..GameDocument::default()
        };
        let controls = AdminControls::from(&document);
        assert!(controls.pause && controls.next && controls.restart);
        assert!(!controls.start && !controls.resume && !controls.continue_round);
    }
}
