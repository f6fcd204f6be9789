pub mod admin;
pub mod backend;
pub mod config;
pub mod error;
pub mod fallback;
pub mod leaderboard;
pub mod session;

pub use admin::StageAdminClient;
pub use backend::{
    AnswerValidator, BackendError, RemoteBackend, SolveLedger, StageControlRegistry, WinnerClaim,
    WinnerRegistrar,
};
pub use config::EngineConfig;
pub use error::EngineError;
pub use fallback::FallbackTable;
pub use leaderboard::{build_leaderboard, LeaderboardRow};
pub use session::{SessionState, HINT_ATTEMPT_THRESHOLD};

use log::{debug, info, warn};

use stagequest_core::clock::unix_millis_now;
use stagequest_core::records::{PlayerProfile, SolveRecord, WinnerRecord};
use stagequest_core::{PrizeTier, Stage, StageSet, Step};
use stagequest_storage::ProgressStore;

/// Whether a solve has been confirmed by the remote ledger or only applied
/// locally. Callers that care about server-backed state (prize flows) can
/// distinguish the two; the player-facing flow treats both as success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Confirmed,
    PendingReconcile,
}

/// Which celebration the UI should show for a completed stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Celebration {
    /// The finale (stage 16) was solved.
    MasterStage,
    /// This solve claimed the stage's winner slot.
    StageWinner,
    /// The stage already had a winner; the player still enters the draw.
    AlreadyWon,
}

/// Everything the presentation layer needs after a stage completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveOutcome {
    pub stage: Stage,
    pub is_stage_winner: bool,
    pub celebration: Celebration,
    pub sync: SyncStatus,
    /// The stage to advance to, or `None` when every stage is solved and
    /// the terminal "journey complete" view should render.
    pub next_stage: Option<Stage>,
}

/// Result of a single answer submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Wrong answer. `attempts` is the consecutive-miss count; the hint
    /// signal is raised on the session when it hits the threshold.
    Incorrect { attempts: u32 },
    /// Correct first answer of a two-step stage; the stage is not solved
    /// yet and the second riddle should be shown.
    StepSolved,
    /// The stage's full requirement is met.
    Solved(SolveOutcome),
}

/// Single authority for "what stage is the user on, what can they do next,
/// and is this action allowed."
///
/// All remote access goes through the [`RemoteBackend`] seam; all local
/// persistence through the [`ProgressStore`]. Read failures degrade to
/// cached or default data, write failures leave optimistic local state in
/// place for the next reconciliation pass — the player-visible flow never
/// blocks on the network.
pub struct ProgressionEngine<B: RemoteBackend, S: ProgressStore> {
    config: EngineConfig,
    backend: B,
    store: S,
    profile: PlayerProfile,
    session: SessionState,
    fallback: FallbackTable,
}

impl<B: RemoteBackend, S: ProgressStore> ProgressionEngine<B, S> {
    /// Builds an engine seeded from the locally cached snapshot, so the UI
    /// has a plausible state to render before the first sync completes.
    pub fn new(config: EngineConfig, backend: B, store: S, profile: PlayerProfile) -> Self {
        let session = match store.load(profile.user_id) {
            Ok(Some(snapshot)) => SessionState::from_snapshot(snapshot),
            Ok(None) => SessionState::new(),
            Err(e) => {
                warn!("failed to read cached progress, starting empty: {e}");
                SessionState::new()
            }
        };
        Self {
            config,
            backend,
            store,
            profile,
            session,
            fallback: FallbackTable::builtin(),
        }
    }

    pub fn with_fallback_table(mut self, fallback: FallbackTable) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    /// Pull-based view of session state for rendering. Re-read on every
    /// render pass; never cache across passes.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// App-start sequence: reconcile local and remote progress, guarded so
    /// that stacked auth events cannot run it twice concurrently.
    pub fn boot(&mut self) -> Result<Stage, EngineError> {
        if !self.session.begin_boot() {
            debug!("boot already in progress, skipping");
            return Ok(self.session.current_stage());
        }
        let result = self.reconcile();
        self.session.finish_boot();
        result?;
        Ok(self.session.current_stage())
    }

    /// Computes the stage the player should be on from the authoritative
    /// solved set, publishing the merged view to the session.
    ///
    /// Remote fetch failure degrades to the locally known set. Idempotent
    /// for unchanged backing data.
    pub fn compute_current_stage(&mut self) -> Stage {
        let remote = match self.backend.solved_stages(self.profile.user_id) {
            Ok(set) => set,
            Err(e) => {
                warn!("solved-stage fetch failed, using local view: {e}");
                StageSet::new()
            }
        };
        // Union, never overwrite: an optimistic local solve that hasn't
        // reached the ledger yet must survive this refresh.
        let merged = remote.union(self.session.solved());
        self.session.publish_solved(merged);
        self.session.current_stage()
    }

    /// A stage is answerable iff progression has reached it AND the admin
    /// registry enables it for this environment. An unreadable registry or
    /// a missing row means locked — disabled content must never leak open.
    pub fn is_unlocked(&mut self, stage: Stage) -> bool {
        let by_progress = match stage.previous() {
            None => true,
            Some(prev) => self.session.solved().contains(prev),
        };
        if !by_progress {
            return false;
        }
        self.stage_enabled(stage)
    }

    /// True when the only thing keeping a stage closed is the admin switch.
    /// The UI shows "disabled" rather than "locked by progress" for these.
    pub fn is_admin_disabled(&mut self, stage: Stage) -> bool {
        !self.stage_enabled(stage)
    }

    fn stage_enabled(&mut self, stage: Stage) -> bool {
        match self.backend.list_stages(self.config.environment()) {
            Ok(entries) => entries
                .iter()
                .find(|e| e.stage == stage)
                .map(|e| e.is_enabled)
                .unwrap_or(false),
            Err(e) => {
                warn!("stage control unavailable, failing closed for stage {stage}: {e}");
                false
            }
        }
    }

    /// Checks an answer for one step of a stage and advances state
    /// accordingly. Rejects attempts the progression rules don't allow;
    /// the engine, not the UI, is the authority on that.
    pub fn submit_answer(
        &mut self,
        stage: Stage,
        step: Step,
        answer: &str,
    ) -> Result<SubmitOutcome, EngineError> {
        if self.session.solved().contains(stage) {
            return Err(EngineError::StageAlreadySolved(stage));
        }
        if !self.is_unlocked(stage) {
            return Err(EngineError::StageLocked(stage));
        }
        match step {
            Step::Two if !stage.requires_two_steps() => {
                return Err(EngineError::StepOutOfOrder { stage, step });
            }
            Step::Two if !self.session.first_step_solved(stage) => {
                return Err(EngineError::StepOutOfOrder { stage, step });
            }
            _ => {}
        }

        if !self.check_answer(stage, step, answer) {
            let attempts = self.session.record_wrong_attempt();
            debug!("wrong answer for stage {stage} step {step:?} (attempt {attempts})");
            return Ok(SubmitOutcome::Incorrect { attempts });
        }
        self.session.reset_wrong_attempts();

        if stage.requires_two_steps() && step == Step::One {
            self.session.mark_first_step_solved(stage);
            self.persist_session();
            return Ok(SubmitOutcome::StepSolved);
        }

        let outcome = self.mark_stage_solved_and_advance(stage)?;
        Ok(SubmitOutcome::Solved(outcome))
    }

    fn check_answer(&mut self, stage: Stage, step: Step, answer: &str) -> bool {
        match self.backend.validate(stage, step, answer) {
            Ok(correct) => correct,
            Err(e) => {
                warn!("validator unreachable, degraded local check for stage {stage}: {e}");
                self.fallback.check(stage, step, answer)
            }
        }
    }

    /// Records a completed stage: optimistic local merge first, then the
    /// remote solve/winner writes, then reposition at the next unsolved
    /// stage. Remote failure is logged and left for reconciliation; the
    /// optimistic update is never rolled back.
    pub fn mark_stage_solved_and_advance(
        &mut self,
        stage: Stage,
    ) -> Result<SolveOutcome, EngineError> {
        // Local first: the UI must reflect the solve before any network
        // round-trip gets a chance to stall.
        self.session.mark_solved(stage);
        self.persist_session();

        let now = unix_millis_now()?;
        let is_stage_winner = self.try_claim_winner(stage, now);
        let sync = self.record_solve_remote(stage, now);

        let next_stage = self.session.solved().first_unsolved();
        self.session
            .set_current_stage(next_stage.unwrap_or(Stage::FINAL));
        self.persist_session();

        let celebration = if stage.is_final() {
            Celebration::MasterStage
        } else if is_stage_winner {
            Celebration::StageWinner
        } else {
            Celebration::AlreadyWon
        };

        info!(
            "stage {stage} solved (winner: {is_stage_winner}, sync: {sync:?}, next: {next_stage:?})"
        );

        Ok(SolveOutcome {
            stage,
            is_stage_winner,
            celebration,
            sync,
            next_stage,
        })
    }

    /// Winner protocol: probe, then claim, then believe whatever the store
    /// said. A duplicate on insert means someone else got there between the
    /// probe and the claim — that is losing the race, not an error.
    fn try_claim_winner(&mut self, stage: Stage, now: i64) -> bool {
        match self.backend.winner_for_stage(stage) {
            Ok(Some(existing)) => {
                debug!("stage {stage} already won by {}", existing.username);
                false
            }
            Ok(None) => {
                let candidate = WinnerRecord {
                    stage,
                    user_id: self.profile.user_id,
                    username: self.profile.username.clone(),
                    prize: PrizeTier::for_stage(stage),
                    won_at: now,
                };
                match self.backend.register_winner(&candidate) {
                    Ok(WinnerClaim::Registered) => true,
                    Ok(WinnerClaim::AlreadyWon(actual)) => {
                        info!("lost the winner race for stage {stage} to {}", actual.username);
                        false
                    }
                    Err(e) => {
                        // Prize-relevant write failed: log with full context,
                        // but progression must not block on it.
                        warn!(
                            "winner registration failed for stage {stage}, user {}: {e}",
                            self.profile.user_id
                        );
                        false
                    }
                }
            }
            Err(e) => {
                warn!("winner lookup failed for stage {stage}, assuming not winner: {e}");
                false
            }
        }
    }

    fn record_solve_remote(&mut self, stage: Stage, now: i64) -> SyncStatus {
        let record = SolveRecord {
            user_id: self.profile.user_id,
            stage,
            step: stage.final_step(),
            username: self.profile.username.clone(),
            email: self.profile.email.clone(),
            solved_at: now,
            won_at: now,
        };
        match self.backend.record_solve(&record) {
            Ok(()) => SyncStatus::Confirmed,
            Err(e) => {
                warn!("solve for stage {stage} not recorded remotely, will reconcile later: {e}");
                SyncStatus::PendingReconcile
            }
        }
    }

    /// Best-effort repair pass run at sign-in and app start: merge local and
    /// remote solved sets as a union, push any solves the server is missing,
    /// then refresh from remote. Partial failures are logged and left for
    /// the next pass; running this twice with no intervening solves is a
    /// no-op the second time.
    pub fn reconcile(&mut self) -> Result<StageSet, EngineError> {
        let local = match self.store.load(self.profile.user_id) {
            Ok(Some(snapshot)) => snapshot.solved.union(self.session.solved()),
            Ok(None) => self.session.solved().clone(),
            Err(e) => {
                warn!("cached progress unreadable during reconcile: {e}");
                self.session.solved().clone()
            }
        };

        let remote = match self.backend.solved_stages(self.profile.user_id) {
            Ok(set) => set,
            Err(e) => {
                warn!("reconcile skipped, remote unreachable: {e}");
                self.session.publish_solved(local.clone());
                self.persist_session();
                return Ok(local);
            }
        };

        let missing = local.difference(&remote);
        if !missing.is_empty() {
            info!("pushing {} locally solved stage(s) missing remotely", missing.len());
            let now = unix_millis_now()?;
            for stage in missing.iter() {
                let _ = self.record_solve_remote_for_repair(stage, now);
            }
        }

        let refreshed = match self.backend.solved_stages(self.profile.user_id) {
            Ok(set) => set,
            Err(e) => {
                warn!("post-push refresh failed, keeping merged view: {e}");
                remote
            }
        };

        let merged = refreshed.union(&local);
        self.session.publish_solved(merged.clone());
        self.persist_session();
        Ok(merged)
    }

    fn record_solve_remote_for_repair(&mut self, stage: Stage, now: i64) -> SyncStatus {
        let status = self.record_solve_remote(stage, now);
        if status == SyncStatus::PendingReconcile {
            warn!("repair push for stage {stage} failed, leaving for next pass");
        }
        status
    }

    /// Sign-out clears the local mirror and forgets the session. The remote
    /// ledger is untouched; progress comes back on the next sign-in sync.
    pub fn sign_out(&mut self) -> Result<(), EngineError> {
        self.store.clear(self.profile.user_id)?;
        self.session.reset();
        info!("signed out, local progress cleared for {}", self.profile.user_id);
        Ok(())
    }

    fn persist_session(&mut self) {
        let snapshot = self.session.snapshot();
        if let Err(e) = self.store.save(self.profile.user_id, &snapshot) {
            // The session still holds the state; the cache is best-effort.
            warn!("failed to persist progress snapshot: {e}");
        }
    }
}
