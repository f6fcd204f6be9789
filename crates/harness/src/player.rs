use stagequest_core::records::{generate_player_name, PlayerProfile};
use stagequest_core::{Environment, Stage, Step, UserId};
use stagequest_engine::{
    EngineConfig, EngineError, ProgressionEngine, SolveOutcome, SubmitOutcome,
};
use stagequest_storage::SqliteProgressStore;

use crate::backend::{default_answer, SharedBackend};

/// One signed-in player: an engine over the shared backend and a private
/// in-memory progress store (each browser has its own cache).
pub struct TestPlayer {
    pub profile: PlayerProfile,
    pub engine: ProgressionEngine<SharedBackend, SqliteProgressStore>,
}

impl TestPlayer {
    pub fn new(backend: &SharedBackend, username: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_environment(backend, username, Environment::Dev)
    }

    pub fn with_environment(
        backend: &SharedBackend,
        username: &str,
        environment: Environment,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let email = format!("{username}@example.com");
        let profile = PlayerProfile::new(UserId::new(), username, &email);
        let config = EngineConfig::new(environment, "localhost");
        let store = SqliteProgressStore::open_in_memory()?;
        let engine = ProgressionEngine::new(config, backend.clone(), store, profile.clone());
        Ok(Self { profile, engine })
    }

    /// Same account on another device: shares the profile (and therefore the
    /// remote ledger rows) but starts from an empty local cache.
    pub fn signed_in_as(
        backend: &SharedBackend,
        profile: PlayerProfile,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = EngineConfig::new(Environment::Dev, "localhost");
        let store = SqliteProgressStore::open_in_memory()?;
        let engine = ProgressionEngine::new(config, backend.clone(), store, profile.clone());
        Ok(Self { profile, engine })
    }

    pub fn anonymous(backend: &SharedBackend) -> Result<Self, Box<dyn std::error::Error>> {
        let name = generate_player_name();
        Self::new(backend, &name)
    }

    pub fn user_id(&self) -> UserId {
        self.profile.user_id
    }

    /// Solves a stage end to end using the backend's default seeded
    /// answers, submitting both steps where the stage requires two.
    pub fn solve_stage(&mut self, stage: Stage) -> Result<SolveOutcome, EngineError> {
        if stage.requires_two_steps() {
            let first = self
                .engine
                .submit_answer(stage, Step::One, &default_answer(stage, Step::One))?;
            assert!(
                matches!(first, SubmitOutcome::StepSolved),
                "step one of stage {stage} did not register: {first:?}"
            );
            match self
                .engine
                .submit_answer(stage, Step::Two, &default_answer(stage, Step::Two))?
            {
                SubmitOutcome::Solved(outcome) => Ok(outcome),
                other => panic!("stage {stage} did not solve on step two: {other:?}"),
            }
        } else {
            match self
                .engine
                .submit_answer(stage, Step::One, &default_answer(stage, Step::One))?
            {
                SubmitOutcome::Solved(outcome) => Ok(outcome),
                other => panic!("stage {stage} did not solve on step one: {other:?}"),
            }
        }
    }

    /// Solves stages 1..=upto in order.
    pub fn solve_through(&mut self, upto: u8) -> Result<(), EngineError> {
        for n in 1..=upto {
            let stage = Stage::new(n).map_err(stagequest_engine::EngineError::Core)?;
            self.solve_stage(stage)?;
        }
        Ok(())
    }
}
