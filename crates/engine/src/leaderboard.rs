use log::warn;

use stagequest_core::records::WinnerRecord;
use stagequest_core::{PrizeTier, Stage};

use crate::backend::WinnerRegistrar;

/// One leaderboard line: the stage, its prize, and its winner if one exists.
/// `winner: None` renders as the "no winner yet" placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub stage: Stage,
    pub prize: PrizeTier,
    pub winner: Option<WinnerRecord>,
}

/// Pure read of the winner registrar, one row per stage. A failed winner
/// lookup degrades that row to the placeholder; the board always renders.
pub fn build_leaderboard<R: WinnerRegistrar>(registrar: &mut R) -> Vec<LeaderboardRow> {
    Stage::all()
        .map(|stage| {
            let winner = match registrar.winner_for_stage(stage) {
                Ok(winner) => winner,
                Err(e) => {
                    warn!("winner lookup failed for stage {stage}, showing placeholder: {e}");
                    None
                }
            };
            LeaderboardRow {
                stage,
                prize: PrizeTier::for_stage(stage),
                winner,
            }
        })
        .collect()
}
