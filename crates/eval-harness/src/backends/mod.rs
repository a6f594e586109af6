//! Log-likelihood backend implementations.

pub mod mock;
pub mod score_file;

pub use mock::MockBackend;
pub use score_file::{ScoreEntry, ScoreFileBackend};
