pub mod answer;
pub mod clock;
pub mod environment;
pub mod error;
pub mod ids;
pub mod records;
pub mod stage;

pub use environment::Environment;
pub use error::CoreError;
pub use ids::UserId;
pub use stage::{PrizeTier, Stage, StageSet, Step};
