use serde::{Serialize, Deserialize};

use super::statistics::Statistics;

/// Summary of one finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Zero-based episode index
    pub episode: usize,
    pub total_reward: f32,
    pub steps: usize,
    /// Loss of the post-episode train step, `None` during warm-up
    pub loss: Option<f32>,
    pub epsilon: f32,
    /// The target estimator was synchronized after this episode
    pub synced: bool,
    /// Ended by truncation rather than a terminal state
    pub truncated: bool,
}

/// Per-episode history of a training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeStats>,
    pub total_steps: usize,
    pub train_steps: usize,
    pub sync_count: usize,
}

impl TrainingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: EpisodeStats) {
        self.total_steps += stats.steps;
        if stats.synced {
            self.sync_count += 1;
        }
        self.episodes.push(stats);
    }

    pub fn num_episodes(&self) -> usize {
        self.episodes.len()
    }

    pub fn rewards(&self) -> Vec<f32> {
        self.episodes.iter().map(|e| e.total_reward).collect()
    }

    /// Mean reward over the last `window` episodes.
    pub fn avg_reward(&self, window: usize) -> Option<f32> {
        if self.episodes.is_empty() || window == 0 {
            return None;
        }
        let n = window.min(self.episodes.len());
        let sum: f32 = self.episodes.iter().rev().take(n).map(|e| e.total_reward).sum();
        Some(sum / n as f32)
    }

    /// Mean loss over the last `window` episodes that trained.
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        let losses: Vec<f32> = self.episodes.iter().rev().filter_map(|e| e.loss).take(window).collect();
        if losses.is_empty() {
            return None;
        }
        Some(losses.iter().sum::<f32>() / losses.len() as f32)
    }

    pub fn best_episode(&self) -> Option<&EpisodeStats> {
        self.episodes
            .iter()
            .fold(None, |best: Option<&EpisodeStats>, e| match best {
                Some(b) if b.total_reward >= e.total_reward => Some(b),
                _ => Some(e),
            })
    }

    pub fn reward_statistics(&self) -> Statistics {
        Statistics::from_slice(&self.rewards())
    }
}
