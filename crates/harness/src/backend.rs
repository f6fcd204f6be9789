use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use stagequest_core::answer;
use stagequest_core::clock::unix_millis_now;
use stagequest_core::records::{SolveRecord, StageControlEntry, WinnerRecord};
use stagequest_core::{Environment, Stage, StageSet, Step, UserId};
use stagequest_engine::backend::{
    AnswerValidator, BackendError, SolveLedger, StageControlRegistry, WinnerClaim, WinnerRegistrar,
};

const TEST_SALT: &str = "harness-salt";

/// In-memory stand-in for the hosted backend: solve ledger, winner slots,
/// stage-control table, and a digest-checking validator, with flags to
/// simulate outages and the winner-race window.
pub struct InMemoryBackend {
    answers: BTreeMap<(Stage, Step), [u8; 32]>,
    solves: Vec<SolveRecord>,
    winners: BTreeMap<Stage, WinnerRecord>,
    controls: BTreeMap<(Environment, Stage), StageControlEntry>,
    /// Validator transport failure.
    pub validator_down: bool,
    /// Solve ledger failure (reads and writes).
    pub ledger_down: bool,
    /// Winner registrar failure (reads and writes).
    pub registrar_down: bool,
    /// Stage-control registry failure.
    pub control_down: bool,
    /// Winner probe reports the slot vacant even when taken, so a claim
    /// collides: the check-then-insert race window.
    pub stale_winner_check: bool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            answers: BTreeMap::new(),
            solves: Vec::new(),
            winners: BTreeMap::new(),
            controls: BTreeMap::new(),
            validator_down: false,
            ledger_down: false,
            registrar_down: false,
            control_down: false,
            stale_winner_check: false,
        }
    }

    pub fn seed_answer(&mut self, stage: Stage, step: Step, plain_answer: &str) {
        self.answers
            .insert((stage, step), answer::digest(TEST_SALT, plain_answer));
    }

    /// Seeds every stage/step with the predictable `answer-<stage>-<step>`
    /// convention used by [`crate::TestPlayer::solve_stage`].
    pub fn seed_default_answers(&mut self) {
        for stage in Stage::all() {
            self.seed_answer(stage, Step::One, &default_answer(stage, Step::One));
            if stage.requires_two_steps() {
                self.seed_answer(stage, Step::Two, &default_answer(stage, Step::Two));
            }
        }
    }

    pub fn enable_stage(&mut self, environment: Environment, stage: Stage) {
        let entry = StageControlEntry {
            environment,
            stage,
            is_enabled: true,
            notes: None,
            updated_at: unix_millis_now().unwrap_or(0),
            updated_by: Some("harness".to_string()),
        };
        self.controls.insert((environment, stage), entry);
    }

    pub fn enable_all_stages(&mut self, environment: Environment) {
        for stage in Stage::all() {
            self.enable_stage(environment, stage);
        }
    }

    pub fn disable_stage(&mut self, environment: Environment, stage: Stage) {
        self.controls.insert(
            (environment, stage),
            StageControlEntry::disabled(environment, stage),
        );
    }

    pub fn winner(&self, stage: Stage) -> Option<&WinnerRecord> {
        self.winners.get(&stage)
    }

    pub fn solves(&self) -> &[SolveRecord] {
        &self.solves
    }

    pub fn solve_count(&self, user_id: UserId, stage: Stage) -> usize {
        self.solves
            .iter()
            .filter(|s| s.user_id == user_id && s.stage == stage)
            .count()
    }

    pub fn control_entry(&self, environment: Environment, stage: Stage) -> Option<&StageControlEntry> {
        self.controls.get(&(environment, stage))
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }
}

pub fn default_answer(stage: Stage, step: Step) -> String {
    format!("answer-{}-{}", stage.number(), step.as_u8())
}

impl AnswerValidator for InMemoryBackend {
    fn validate(&mut self, stage: Stage, step: Step, submission: &str) -> Result<bool, BackendError> {
        if self.validator_down {
            return Err(BackendError::Unreachable("validator offline".into()));
        }
        Ok(self
            .answers
            .get(&(stage, step))
            .map(|expected| answer::verify(TEST_SALT, submission, expected))
            .unwrap_or(false))
    }
}

impl SolveLedger for InMemoryBackend {
    fn record_solve(&mut self, record: &SolveRecord) -> Result<(), BackendError> {
        if self.ledger_down {
            return Err(BackendError::Unreachable("ledger offline".into()));
        }
        // Explicit (user, stage) idempotence: a repair push of an already
        // recorded solve is a silent success.
        let exists = self
            .solves
            .iter()
            .any(|s| s.user_id == record.user_id && s.stage == record.stage);
        if !exists {
            self.solves.push(record.clone());
        }
        Ok(())
    }

    fn solved_stages(&mut self, user_id: UserId) -> Result<StageSet, BackendError> {
        if self.ledger_down {
            return Err(BackendError::Unreachable("ledger offline".into()));
        }
        Ok(self
            .solves
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.stage)
            .collect())
    }
}

impl WinnerRegistrar for InMemoryBackend {
    fn winner_for_stage(&mut self, stage: Stage) -> Result<Option<WinnerRecord>, BackendError> {
        if self.registrar_down {
            return Err(BackendError::Unreachable("registrar offline".into()));
        }
        if self.stale_winner_check {
            return Ok(None);
        }
        Ok(self.winners.get(&stage).cloned())
    }

    fn register_winner(&mut self, candidate: &WinnerRecord) -> Result<WinnerClaim, BackendError> {
        if self.registrar_down {
            return Err(BackendError::Unreachable("registrar offline".into()));
        }
        // Uniqueness on stage is the store's job; a duplicate insert is
        // reported as "already won", never as an error.
        match self.winners.get(&candidate.stage) {
            Some(existing) => Ok(WinnerClaim::AlreadyWon(existing.clone())),
            None => {
                self.winners.insert(candidate.stage, candidate.clone());
                Ok(WinnerClaim::Registered)
            }
        }
    }
}

impl StageControlRegistry for InMemoryBackend {
    fn list_stages(
        &mut self,
        environment: Environment,
    ) -> Result<Vec<StageControlEntry>, BackendError> {
        if self.control_down {
            return Err(BackendError::Unreachable("stage control offline".into()));
        }
        Ok(self
            .controls
            .values()
            .filter(|e| e.environment == environment)
            .cloned()
            .collect())
    }

    fn upsert_control(&mut self, entry: &StageControlEntry) -> Result<(), BackendError> {
        if self.control_down {
            return Err(BackendError::Unreachable("stage control offline".into()));
        }
        self.controls
            .insert((entry.environment, entry.stage), entry.clone());
        Ok(())
    }
}

/// Shared handle to one backend, so several engines (players, an admin
/// client) operate against the same authoritative store — the setup every
/// race test needs.
#[derive(Clone)]
pub struct SharedBackend(Rc<RefCell<InMemoryBackend>>);

impl Default for SharedBackend {
    fn default() -> Self {
        Self::new(InMemoryBackend::new())
    }
}

impl SharedBackend {
    pub fn new(backend: InMemoryBackend) -> Self {
        Self(Rc::new(RefCell::new(backend)))
    }

    pub fn with<T>(&self, f: impl FnOnce(&InMemoryBackend) -> T) -> T {
        f(&self.0.borrow())
    }

    pub fn with_mut<T>(&self, f: impl FnOnce(&mut InMemoryBackend) -> T) -> T {
        f(&mut self.0.borrow_mut())
    }
}

impl AnswerValidator for SharedBackend {
    fn validate(&mut self, stage: Stage, step: Step, submission: &str) -> Result<bool, BackendError> {
        self.0.borrow_mut().validate(stage, step, submission)
    }
}

impl SolveLedger for SharedBackend {
    fn record_solve(&mut self, record: &SolveRecord) -> Result<(), BackendError> {
        self.0.borrow_mut().record_solve(record)
    }

    fn solved_stages(&mut self, user_id: UserId) -> Result<StageSet, BackendError> {
        self.0.borrow_mut().solved_stages(user_id)
    }
}

impl WinnerRegistrar for SharedBackend {
    fn winner_for_stage(&mut self, stage: Stage) -> Result<Option<WinnerRecord>, BackendError> {
        self.0.borrow_mut().winner_for_stage(stage)
    }

    fn register_winner(&mut self, candidate: &WinnerRecord) -> Result<WinnerClaim, BackendError> {
        self.0.borrow_mut().register_winner(candidate)
    }
}

impl StageControlRegistry for SharedBackend {
    fn list_stages(
        &mut self,
        environment: Environment,
    ) -> Result<Vec<StageControlEntry>, BackendError> {
        self.0.borrow_mut().list_stages(environment)
    }

    fn upsert_control(&mut self, entry: &StageControlEntry) -> Result<(), BackendError> {
        self.0.borrow_mut().upsert_control(entry)
    }
}
