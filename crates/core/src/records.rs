use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::ids::UserId;
use crate::stage::{PrizeTier, Stage, StageSet, Step};

/// One confirmed solve, appended to the remote ledger. Immutable once
/// written; re-inserting the same (user, stage) pair must be tolerated by
/// the ledger rather than rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRecord {
    pub user_id: UserId,
    pub stage: Stage,
    pub step: Step,
    pub username: String,
    pub email: String,
    pub solved_at: i64,
    pub won_at: i64,
}

/// The first solver of a stage. At most one per stage, first write wins;
/// later solvers are recorded in the solve ledger but never displace this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub stage: Stage,
    pub user_id: UserId,
    pub username: String,
    pub prize: PrizeTier,
    pub won_at: i64,
}

/// One row of the admin-controlled stage registry, keyed by
/// (environment, stage). A missing row means the stage is disabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageControlEntry {
    pub environment: Environment,
    pub stage: Stage,
    pub is_enabled: bool,
    pub notes: Option<String>,
    pub updated_at: i64,
    pub updated_by: Option<String>,
}

impl StageControlEntry {
    /// The implied entry for a stage with no registry row: disabled.
    pub fn disabled(environment: Environment, stage: Stage) -> Self {
        Self {
            environment,
            stage,
            is_enabled: false,
            notes: None,
            updated_at: 0,
            updated_by: None,
        }
    }
}

/// The locally cached mirror of a player's progress. Never authoritative;
/// it exists so the UI has something to render before (or without) a
/// successful sync, and is cleared entirely on sign-out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub solved: StageSet,
    pub first_step_solved: StageSet,
    pub current_stage: Option<Stage>,
}

/// The signed-in player as the engine sees them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

impl PlayerProfile {
    pub fn new(user_id: UserId, username: &str, email: &str) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
        }
    }
}

/// Fallback display name for accounts that never set one. Only used for
/// presentation (leaderboard, winner banners); the ledger always carries
/// the real user id.
pub fn generate_player_name() -> String {
    let n: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("Player{n:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_entry_defaults() {
        let entry = StageControlEntry::disabled(Environment::Dev, Stage::FIRST);
        assert!(!entry.is_enabled);
        assert!(entry.notes.is_none());
        assert!(entry.updated_by.is_none());
    }

    #[test]
    fn generated_names_have_fixed_shape() {
        for _ in 0..20 {
            let name = generate_player_name();
            assert!(name.starts_with("Player"));
            assert_eq!(name.len(), 10);
            assert!(name[6..].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
