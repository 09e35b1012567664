//! # Training Configuration
//!
//! Every hyperparameter of a run lives in [`DqnConfig`]. Configs are plain
//! serde structs, so they can be read from JSON with any subset of fields
//! present; missing fields take the defaults below.
//!
//! ```rust
//! use cartpole_dqn::config::DqnConfig;
//!
//! let config: DqnConfig = serde_json::from_str(r#"{ "num_episodes": 50, "soft_update": false }"#).unwrap();
//! assert_eq!(config.num_episodes, 50);
//! assert_eq!(config.batch_size, 64);
//! config.validate().unwrap();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::loss::TdLoss;
use crate::optimizer::{Adam, OptimizerWrapper, RMSProp, SGD};
use crate::policy::EpsilonSchedule;
use crate::sync::SyncMode;

/// Which optimizer updates the online estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
    #[serde(rename = "rmsprop")]
    RmsProp,
}

impl OptimizerKind {
    pub fn build(&self) -> OptimizerWrapper {
        match self {
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
            OptimizerKind::RmsProp => OptimizerWrapper::RMSProp(RMSProp::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DqnConfig {
    /// Length of the observation vector
    pub input_size: usize,
    /// Width of each hidden layer
    pub hidden_size: usize,
    /// Number of hidden layers
    pub hidden_layers: usize,
    /// Number of discrete actions
    pub output_size: usize,
    pub num_episodes: usize,
    pub batch_size: usize,
    /// Discount factor in [0, 1]
    pub gamma: f32,
    pub learning_rate: f32,
    /// Synchronize the target every this many episodes
    pub target_update_freq: usize,
    pub replay_buffer_capacity: usize,
    /// Exploration rate at the first episode
    pub epsilon: f32,
    /// Exploration floor; defaults to `epsilon`
    pub epsilon_min: Option<f32>,
    /// Per-episode multiplicative ε decay; 1.0 keeps ε constant
    pub epsilon_decay: f32,
    /// Blend factor for soft synchronization
    pub tau: f32,
    /// Soft (Polyak) vs hard target synchronization
    pub soft_update: bool,
    /// Seed for the run's random number generator
    pub seed: u64,
    /// Local cap on episode length, treated as truncation
    pub max_steps_per_episode: Option<usize>,
    /// Also run a train step after every environment step
    pub train_every_step: bool,
    pub optimizer: OptimizerKind,
    pub loss: TdLoss,
    /// Clip gradients to this global L2 norm
    pub max_grad_norm: Option<f32>,
    /// Log episode summaries every this many episodes
    pub log_interval: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            input_size: 4,
            hidden_size: 64,
            hidden_layers: 2,
            output_size: 2,
            num_episodes: 500,
            batch_size: 64,
            gamma: 0.99,
            learning_rate: 1e-3,
            target_update_freq: 10,
            replay_buffer_capacity: 10_000,
            epsilon: 0.1,
            epsilon_min: None,
            epsilon_decay: 1.0,
            tau: 0.01,
            soft_update: true,
            seed: 42,
            max_steps_per_episode: None,
            train_every_step: false,
            optimizer: OptimizerKind::Adam,
            loss: TdLoss::Mse,
            max_grad_norm: None,
            log_interval: 10,
        }
    }
}

impl DqnConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sync_mode(&self) -> SyncMode {
        SyncMode::from_flag(self.soft_update, self.tau)
    }

    pub fn epsilon_schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule {
            start: self.epsilon,
            min: self.epsilon_min.unwrap_or(self.epsilon),
            decay: self.epsilon_decay,
        }
    }

    /// Hidden layer widths of the Q-network.
    pub fn hidden_sizes(&self) -> Vec<usize> {
        vec![self.hidden_size; self.hidden_layers]
    }

    /// Check every field; the first out-of-range value is reported.
    pub fn validate(&self) -> Result<()> {
        positive("input_size", self.input_size)?;
        positive("output_size", self.output_size)?;
        if self.hidden_layers > 0 {
            positive("hidden_size", self.hidden_size)?;
        }
        positive("batch_size", self.batch_size)?;
        positive("replay_buffer_capacity", self.replay_buffer_capacity)?;
        positive("target_update_freq", self.target_update_freq)?;
        positive("log_interval", self.log_interval)?;

        if self.batch_size > self.replay_buffer_capacity {
            return Err(DqnError::invalid_hyperparameter(
                "batch_size".to_string(),
                format!(
                    "{} exceeds replay_buffer_capacity {}; training could never start",
                    self.batch_size, self.replay_buffer_capacity
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DqnError::invalid_hyperparameter(
                "gamma".to_string(),
                format!("must lie in [0, 1], got {}", self.gamma),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DqnError::invalid_hyperparameter(
                "learning_rate".to_string(),
                format!("must be a positive finite number, got {}", self.learning_rate),
            ));
        }
        // tau only matters for soft updates, but a nonsensical value is still a typo
        SyncMode::Soft { tau: self.tau }.validate()?;
        self.epsilon_schedule().validate()?;

        if let Some(max_steps) = self.max_steps_per_episode {
            positive("max_steps_per_episode", max_steps)?;
        }
        if let Some(max_norm) = self.max_grad_norm {
            if !(max_norm > 0.0) {
                return Err(DqnError::invalid_hyperparameter(
                    "max_grad_norm".to_string(),
                    format!("must be positive, got {}", max_norm),
                ));
            }
        }
        if let TdLoss::Huber { delta } = self.loss {
            if !(delta > 0.0) {
                return Err(DqnError::invalid_hyperparameter(
                    "loss.delta".to_string(),
                    format!("must be positive, got {}", delta),
                ));
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(DqnError::invalid_hyperparameter(name, "must be positive"));
    }
    Ok(())
}
