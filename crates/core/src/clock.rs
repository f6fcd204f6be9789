use std::time::{SystemTime, UNIX_EPOCH};

use crate::CoreError;

/// Returns the current wall-clock time as milliseconds since Unix epoch.
/// Solve and winner timestamps are stamped with this; ordering between
/// concurrent solvers is never derived from it (the winner store is the
/// arbiter), so plain wall time is sufficient.
pub fn unix_millis_now() -> Result<i64, CoreError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|_| CoreError::InvalidData("system clock before epoch".into()))
}
