pub mod backend;
pub mod player;

pub use backend::{InMemoryBackend, SharedBackend};
pub use player::TestPlayer;
