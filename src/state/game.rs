use dashmap::{DashMap, DashSet, mapref::entry::Entry};
use uuid::Uuid;

/// Identifies one question of one run through the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerMark {
    pub run_id: Option<Uuid>,
    pub question_index: i64,
}

/// Last question each player answered, used to count only the first submission per question.
#[derive(Debug, Default)]
pub struct AnswerLedger {
    entries: DashMap<String, AnswerMark>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `player` answered `mark`. Returns `false` when that answer was already taken.
    ///
    /// The check and the insert happen under the entry lock, so two concurrent submissions by the
    /// same player cannot both succeed.
    pub fn claim(&self, player: &str, mark: AnswerMark) -> bool {
        match self.entries.entry(player.to_owned()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == mark {
                    false
                } else {
                    entry.insert(mark);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(mark);
                true
            }
        }
    }

    /// Undo a claim whose score write failed, so the player may submit again.
    pub fn release(&self, player: &str, mark: AnswerMark) {
        self.entries.remove_if(player, |_, claimed| *claimed == mark);
    }

    /// Drop everything known about `player`.
    pub fn forget(&self, player: &str) {
        self.entries.remove(player);
    }

    pub fn has_answered(&self, player: &str, mark: AnswerMark) -> bool {
        self.entries
            .get(player)
            .is_some_and(|claimed| *claimed == mark)
    }
}

/// Names with a join in flight. Holding a [`JoinClaim`] keeps every other join for that name out
/// until the score entry has been written (or the attempt failed).
#[derive(Debug, Default)]
pub struct PendingJoins {
    names: DashSet<String>,
}

impl PendingJoins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name`, or `None` when another join for it is still running.
    pub fn claim(&self, name: &str) -> Option<JoinClaim<'_>> {
        self.names.insert(name.to_owned()).then(|| JoinClaim {
            pending: self,
            name: name.to_owned(),
        })
    }
}

/// Reservation released on drop.
#[derive(Debug)]
pub struct JoinClaim<'a> {
    pending: &'a PendingJoins,
    name: String,
}

impl Drop for JoinClaim<'_> {
    fn drop(&mut self) {
        self.pending.names.remove(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(run: Uuid, question_index: i64) -> AnswerMark {
        AnswerMark {
            run_id: Some(run),
            question_index,
        }
    }

    #[test]
    fn first_claim_per_question_wins() {
        let ledger = AnswerLedger::new();
        let run = Uuid::new_v4();

        assert!(ledger.claim("alice", mark(run, 0)));
        assert!(!ledger.claim("alice", mark(run, 0)));
        assert!(ledger.has_answered("alice", mark(run, 0)));
        assert!(ledger.claim("alice", mark(run, 1)));
        assert!(ledger.claim("bob", mark(run, 0)));
    }

    #[test]
    fn new_run_reopens_the_same_index() {
        let ledger = AnswerLedger::new();
        assert!(ledger.claim("alice", mark(Uuid::new_v4(), 0)));
        assert!(ledger.claim("alice", mark(Uuid::new_v4(), 0)));
    }

    #[test]
    fn release_only_undoes_matching_claim() {
        let ledger = AnswerLedger::new();
        let run = Uuid::new_v4();
        ledger.claim("alice", mark(run, 1));

        ledger.release("alice", mark(run, 0));
        assert!(ledger.has_answered("alice", mark(run, 1)));

        ledger.release("alice", mark(run, 1));
        assert!(ledger.claim("alice", mark(run, 1)));
    }

    #[test]
    fn forget_clears_player() {
        let ledger = AnswerLedger::new();
        let run = Uuid::new_v4();
        ledger.claim("alice", mark(run, 0));
        ledger.forget("alice");
        assert!(!ledger.has_answered("alice", mark(run, 0)));
    }

    #[test]
    fn join_claim_is_exclusive_until_dropped() {
        let pending = PendingJoins::new();

        let claim = pending.claim("alice").unwrap();
        assert!(pending.claim("alice").is_none());
        assert!(pending.claim("bob").is_some());

        drop(claim);
        assert!(pending.claim("alice").is_some());
    }
}
