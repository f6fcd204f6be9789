use stagequest_core::records::ProgressSnapshot;
use stagequest_core::UserId;

use crate::error::StorageError;

/// One-browser persistence for a player's cached progress.
///
/// The store is a mirror, not a source of truth: the engine overwrites it on
/// every successful sync, reads it when the network is unavailable, and
/// wipes it on sign-out. Nothing here is ever pushed to another device
/// except through reconciliation against the remote ledger.
pub trait ProgressStore {
    fn load(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>, StorageError>;

    fn save(&mut self, user_id: UserId, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;

    fn clear(&mut self, user_id: UserId) -> Result<(), StorageError>;
}
