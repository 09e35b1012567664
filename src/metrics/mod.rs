pub mod tracker;
pub mod statistics;

pub use tracker::{EpisodeStats, TrainingReport};
pub use statistics::Statistics;
