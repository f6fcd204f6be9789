//! The remote seam: everything the engine asks of the hosted backend.
//!
//! Each external collaborator gets its own narrow trait; the engine is
//! generic over one [`RemoteBackend`] that bundles them. Every method is a
//! suspension point in the deployed system — callers must tolerate arbitrary
//! delay and treat any of these calls as fallible.

use stagequest_core::records::{SolveRecord, StageControlEntry, WinnerRecord};
use stagequest_core::{Environment, Stage, StageSet, Step, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Stateless answer checking against hashed references.
pub trait AnswerValidator {
    fn validate(&mut self, stage: Stage, step: Step, answer: &str) -> Result<bool, BackendError>;
}

/// Append-only record of confirmed solves; the cross-device source of truth.
pub trait SolveLedger {
    /// Appends a solve. Implementations must treat a re-insert of the same
    /// (user, stage) pair as a no-op success, since reconciliation may push
    /// the same solve more than once.
    fn record_solve(&mut self, record: &SolveRecord) -> Result<(), BackendError>;

    /// All stages this user has solved, across every device.
    fn solved_stages(&mut self, user_id: UserId) -> Result<StageSet, BackendError>;
}

/// Outcome of trying to claim a stage's winner slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WinnerClaim {
    /// The caller is the first solver and now holds the slot.
    Registered,
    /// Someone else's row was already there (or won the insert race).
    /// This is an answer, not an error.
    AlreadyWon(WinnerRecord),
}

/// First-write-wins winner slot per stage. Ordering between concurrent
/// claimants is decided entirely by the backing store's uniqueness
/// constraint; the client never assumes it can determine "first" itself.
pub trait WinnerRegistrar {
    fn winner_for_stage(&mut self, stage: Stage) -> Result<Option<WinnerRecord>, BackendError>;

    fn register_winner(&mut self, candidate: &WinnerRecord) -> Result<WinnerClaim, BackendError>;
}

/// Admin-editable stage enablement, scoped by environment.
pub trait StageControlRegistry {
    fn list_stages(
        &mut self,
        environment: Environment,
    ) -> Result<Vec<StageControlEntry>, BackendError>;

    /// Insert-or-replace keyed on (environment, stage).
    fn upsert_control(&mut self, entry: &StageControlEntry) -> Result<(), BackendError>;
}

/// The full remote surface the engine runs against.
pub trait RemoteBackend:
    AnswerValidator + SolveLedger + WinnerRegistrar + StageControlRegistry
{
}

impl<T> RemoteBackend for T where
    T: AnswerValidator + SolveLedger + WinnerRegistrar + StageControlRegistry
{
}
