use stagequest_core::{CoreError, Stage, Step};
use stagequest_storage::StorageError;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("stage {0} is locked")]
    StageLocked(Stage),

    #[error("stage {0} is already solved")]
    StageAlreadySolved(Stage),

    #[error("step {step:?} of stage {stage} attempted out of order")]
    StepOutOfOrder { stage: Stage, step: Step },

    #[error("admin writes are locked: prod environment on a non-production host")]
    WriteLocked,
}
