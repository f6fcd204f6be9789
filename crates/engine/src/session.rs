use stagequest_core::records::ProgressSnapshot;
use stagequest_core::{Stage, StageSet};

/// How many consecutive wrong answers surface the hint prompt.
pub const HINT_ATTEMPT_THRESHOLD: u32 = 2;

/// In-memory state for one signed-in session: the single source of UI truth.
///
/// Only the progression engine mutates this; the presentation layer reads it
/// fresh on every render pass and never caches across passes. This replaces
/// the ambient globals the original design leaned on.
#[derive(Debug, Default)]
pub struct SessionState {
    solved: StageSet,
    first_step_solved: StageSet,
    current_stage: Option<Stage>,
    wrong_attempts: u32,
    hint_pending: bool,
    boot_in_progress: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a locally cached snapshot (app start, before any sync).
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            current_stage: snapshot.current_stage,
            solved: snapshot.solved,
            first_step_solved: snapshot.first_step_solved,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            solved: self.solved.clone(),
            first_step_solved: self.first_step_solved.clone(),
            current_stage: self.current_stage,
        }
    }

    pub fn solved(&self) -> &StageSet {
        &self.solved
    }

    pub fn first_step_solved(&self, stage: Stage) -> bool {
        self.first_step_solved.contains(stage)
    }

    pub fn max_solved(&self) -> Option<Stage> {
        self.solved.max_solved()
    }

    /// The stage the player is positioned at. Defaults to the first stage
    /// before anything has been computed.
    pub fn current_stage(&self) -> Stage {
        self.current_stage.unwrap_or(Stage::FIRST)
    }

    /// Replace the solved set with a reconciled view and reposition the
    /// player at the next unsolved stage.
    pub fn publish_solved(&mut self, solved: StageSet) {
        self.current_stage = Some(solved.next_unsolved());
        self.solved = solved;
    }

    pub fn mark_solved(&mut self, stage: Stage) -> bool {
        self.solved.insert(stage)
    }

    pub fn mark_first_step_solved(&mut self, stage: Stage) {
        self.first_step_solved.insert(stage);
    }

    pub fn set_current_stage(&mut self, stage: Stage) {
        self.current_stage = Some(stage);
    }

    /// Bumps the consecutive wrong-attempt counter and returns the new count.
    pub fn record_wrong_attempt(&mut self) -> u32 {
        self.wrong_attempts += 1;
        if self.wrong_attempts == HINT_ATTEMPT_THRESHOLD {
            self.hint_pending = true;
        }
        self.wrong_attempts
    }

    pub fn reset_wrong_attempts(&mut self) {
        self.wrong_attempts = 0;
    }

    pub fn wrong_attempts(&self) -> u32 {
        self.wrong_attempts
    }

    /// Consumes the pending hint signal, if any. The UI polls this after a
    /// failed submission; raising it never blocks progression.
    pub fn take_hint_signal(&mut self) -> bool {
        std::mem::take(&mut self.hint_pending)
    }

    /// Claims the boot guard. Returns false if a boot sequence is already
    /// running, in which case the caller must skip its own boot work —
    /// auth events can fire in quick succession and the start sequence
    /// must not run twice.
    pub fn begin_boot(&mut self) -> bool {
        if self.boot_in_progress {
            return false;
        }
        self.boot_in_progress = true;
        true
    }

    pub fn finish_boot(&mut self) {
        self.boot_in_progress = false;
    }

    /// Sign-out: forget everything about this session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(n: u8) -> Stage {
        Stage::new(n).unwrap()
    }

    #[test]
    fn publish_repositions_current_stage() {
        let mut session = SessionState::new();
        assert_eq!(session.current_stage(), Stage::FIRST);

        session.publish_solved([1, 2, 3].iter().map(|n| stage(*n)).collect());
        assert_eq!(session.current_stage(), stage(4));

        session.publish_solved(Stage::all().collect());
        assert_eq!(session.current_stage(), Stage::FINAL);
    }

    #[test]
    fn hint_fires_on_second_consecutive_miss_only() {
        let mut session = SessionState::new();

        assert_eq!(session.record_wrong_attempt(), 1);
        assert!(!session.take_hint_signal());

        assert_eq!(session.record_wrong_attempt(), 2);
        assert!(session.take_hint_signal());
        // Signal is consumed, not latched.
        assert!(!session.take_hint_signal());

        // A third miss does not re-raise it.
        assert_eq!(session.record_wrong_attempt(), 3);
        assert!(!session.take_hint_signal());
    }

    #[test]
    fn correct_answer_resets_the_streak() {
        let mut session = SessionState::new();
        session.record_wrong_attempt();
        session.reset_wrong_attempts();
        session.record_wrong_attempt();
        assert!(!session.take_hint_signal());
        session.record_wrong_attempt();
        assert!(session.take_hint_signal());
    }

    #[test]
    fn boot_guard_is_exclusive() {
        let mut session = SessionState::new();
        assert!(session.begin_boot());
        assert!(!session.begin_boot());
        session.finish_boot();
        assert!(session.begin_boot());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = SessionState::new();
        session.mark_solved(stage(3));
        session.mark_first_step_solved(stage(5));
        session.set_current_stage(stage(4));
        session.record_wrong_attempt();
        session.record_wrong_attempt();

        session.reset();
        assert!(session.solved().is_empty());
        assert!(!session.first_step_solved(stage(5)));
        assert_eq!(session.current_stage(), Stage::FIRST);
        assert_eq!(session.wrong_attempts(), 0);
        assert!(!session.take_hint_signal());
    }
}
