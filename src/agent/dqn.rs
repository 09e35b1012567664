use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, info_span};

use crate::config::DqnConfig;
use crate::env::Environment;
use crate::error::{DqnError, Result};
use crate::loss::TdLoss;
use crate::metrics::{EpisodeStats, Statistics, TrainingReport};
use crate::network::NeuralNetwork;
use crate::optimizer::GradientClipper;
use crate::policy::{EpsilonGreedy, EpsilonSchedule};
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::sync::{sync_networks, SyncMode};
use crate::trainer::Trainer;
use crate::value_function::ValueFunction;

/// Deep Q-Network agent with experience replay and a target network.
///
/// Owns both estimators, the replay buffer, the trainer and the run's random
/// number generator. One call to [`DqnAgent::train`] plays
/// `config.num_episodes` episodes; after each episode it runs one train step
/// and, every `target_update_freq` episodes, synchronizes the target.
///
/// # Example
///
/// ```rust
/// use cartpole_dqn::agent::DqnAgent;
/// use cartpole_dqn::config::DqnConfig;
/// use cartpole_dqn::env::CartPole;
///
/// let config = DqnConfig {
///     num_episodes: 5,
///     batch_size: 8,
///     hidden_size: 16,
///     ..DqnConfig::default()
/// };
/// let mut agent = DqnAgent::new(config).unwrap();
/// let mut env = CartPole::new();
/// let report = agent.train(&mut env).unwrap();
/// assert_eq!(report.num_episodes(), 5);
/// ```
pub struct DqnAgent<V: ValueFunction = NeuralNetwork> {
    online: V,
    target: V,
    buffer: ReplayBuffer,
    trainer: Trainer,
    policy: EpsilonGreedy,
    schedule: EpsilonSchedule,
    sync_mode: SyncMode,
    config: DqnConfig,
    rng: StdRng,
    episodes_run: usize,
}

impl DqnAgent<NeuralNetwork> {
    /// Build an agent with two MLP estimators initialised from `config.seed`.
    pub fn new(config: DqnConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let hidden = config.hidden_sizes();
        let online = NeuralNetwork::mlp(config.input_size, &hidden, config.output_size, &mut rng)?;
        let target = NeuralNetwork::mlp(config.input_size, &hidden, config.output_size, &mut rng)?;
        Self::assemble(config, online, target, rng)
    }
}

impl<V: ValueFunction> DqnAgent<V> {
    /// Build an agent around caller-supplied estimators.
    ///
    /// The target is hard-synced from the online estimator before returning.
    pub fn from_estimators(config: DqnConfig, online: V, target: V) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Self::assemble(config, online, target, rng)
    }

    fn assemble(config: DqnConfig, online: V, mut target: V, rng: StdRng) -> Result<Self> {
        for (role, estimator) in [("online", &online), ("target", &target)] {
            if estimator.input_size() != config.input_size || estimator.num_actions() != config.output_size {
                return Err(DqnError::dimension_mismatch(
                    format!("{} -> {}", config.input_size, config.output_size),
                    format!(
                        "{} estimator {} -> {}",
                        role,
                        estimator.input_size(),
                        estimator.num_actions()
                    ),
                ));
            }
        }
        sync_networks(&online, &mut target, SyncMode::Hard)?;

        let buffer = ReplayBuffer::new(config.replay_buffer_capacity)?;
        let trainer = Trainer::new(
            config.optimizer.build(),
            config.learning_rate,
            config.batch_size,
            config.gamma,
        )?
        .with_criterion(config.loss)
        .with_clipper(GradientClipper::from_max_norm(config.max_grad_norm));
        let schedule = config.epsilon_schedule();
        let policy = EpsilonGreedy::new(schedule.value_at(0), config.output_size)?;

        Ok(DqnAgent {
            online,
            target,
            buffer,
            trainer,
            policy,
            schedule,
            sync_mode: config.sync_mode(),
            config,
            rng,
            episodes_run: 0,
        })
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn online(&self) -> &V {
        &self.online
    }

    pub fn target(&self) -> &V {
        &self.target
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn policy(&self) -> &EpsilonGreedy {
        &self.policy
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Episodes played by [`DqnAgent::train`] so far.
    pub fn episodes_run(&self) -> usize {
        self.episodes_run
    }

    fn check_env<E: Environment + ?Sized>(&self, env: &E) -> Result<()> {
        if env.observation_dim() != self.config.input_size || env.action_count() != self.config.output_size {
            return Err(DqnError::dimension_mismatch(
                format!(
                    "environment with {} observations and {} actions",
                    self.config.input_size, self.config.output_size
                ),
                format!(
                    "{} observations and {} actions",
                    env.observation_dim(),
                    env.action_count()
                ),
            ));
        }
        Ok(())
    }

    /// Play `config.num_episodes` episodes, training as configured.
    pub fn train<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<TrainingReport> {
        self.check_env(env)?;
        let mut report = TrainingReport::new();
        let log_interval = self.config.log_interval;

        info!(
            episodes = self.config.num_episodes,
            batch_size = self.config.batch_size,
            sync_mode = ?self.sync_mode,
            "starting DQN training"
        );

        for episode in 0..self.config.num_episodes {
            let stats = self.run_episode(env, episode)?;
            let (reward, loss, epsilon) = (stats.total_reward, stats.loss, stats.epsilon);
            report.record(stats);

            if (episode + 1) % log_interval == 0 {
                info!(
                    episode = episode + 1,
                    reward,
                    avg_reward = report.avg_reward(log_interval).unwrap_or(reward),
                    loss = ?loss,
                    epsilon,
                    buffer = self.buffer.len(),
                    "episode finished"
                );
            }
        }

        report.train_steps = self.trainer.steps();
        info!(
            total_steps = report.total_steps,
            train_steps = report.train_steps,
            syncs = report.sync_count,
            "training finished"
        );
        Ok(report)
    }

    /// Play one episode with zero-based index `episode`, then train and
    /// maybe synchronize the target.
    pub fn run_episode<E: Environment + ?Sized>(&mut self, env: &mut E, episode: usize) -> Result<EpisodeStats> {
        let _span = info_span!("episode", episode).entered();

        let epsilon = self.schedule.value_at(episode);
        self.policy.set_epsilon(epsilon)?;

        let mut state = env.reset(&mut self.rng)?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        let truncated = loop {
            let action = self.policy.select_action(state.view(), &self.online, &mut self.rng)?;
            let outcome = env.step(action)?;
            total_reward += outcome.reward;
            steps += 1;

            // Truncation is not terminal for the Bellman target.
            let hit_step_limit = self
                .config
                .max_steps_per_episode
                .map_or(false, |limit| steps >= limit);
            self.buffer.push(Transition::new(
                state,
                action,
                outcome.reward,
                outcome.next_state.clone(),
                outcome.terminated,
            ));

            if self.config.train_every_step {
                self.trainer
                    .train_step(&mut self.online, &self.target, &self.buffer, &mut self.rng)?;
            }

            state = outcome.next_state;
            if outcome.terminated {
                break false;
            }
            if outcome.truncated || hit_step_limit {
                break true;
            }
        };

        let loss = self
            .trainer
            .train_step(&mut self.online, &self.target, &self.buffer, &mut self.rng)?;

        let synced = episode % self.config.target_update_freq == 0;
        if synced {
            sync_networks(&self.online, &mut self.target, self.sync_mode)?;
            debug!(mode = ?self.sync_mode, "target synchronized");
        }

        self.episodes_run += 1;
        Ok(EpisodeStats {
            episode,
            total_reward,
            steps,
            loss,
            epsilon,
            synced,
            truncated,
        })
    }

    /// Greedy action from the online estimator.
    pub fn act(&self, state: ndarray::ArrayView1<f32>) -> Result<usize> {
        self.policy.greedy_action(state, &self.online)
    }

    /// Play `episodes` greedy episodes without storing or training and
    /// summarise their rewards.
    pub fn evaluate<E: Environment + ?Sized>(&mut self, env: &mut E, episodes: usize) -> Result<Statistics> {
        self.check_env(env)?;
        let mut rewards = Vec::with_capacity(episodes);
        for _ in 0..episodes {
            let mut state = env.reset(&mut self.rng)?;
            let mut total_reward = 0.0;
            let mut steps = 0;
            loop {
                let action = self.policy.greedy_action(state.view(), &self.online)?;
                let outcome = env.step(action)?;
                total_reward += outcome.reward;
                steps += 1;
                let hit_step_limit = self
                    .config
                    .max_steps_per_episode
                    .map_or(false, |limit| steps >= limit);
                if outcome.is_episode_end() || hit_step_limit {
                    break;
                }
                state = outcome.next_state;
            }
            rewards.push(total_reward);
        }
        Ok(Statistics::from_slice(&rewards))
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    config: DqnConfig,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            config: DqnConfig::default(),
        }
    }

    pub fn from_config(config: DqnConfig) -> Self {
        DqnAgentBuilder { config }
    }

    pub fn layer_sizes(mut self, input_size: usize, hidden_size: usize, hidden_layers: usize, output_size: usize) -> Self {
        self.config.input_size = input_size;
        self.config.hidden_size = hidden_size;
        self.config.hidden_layers = hidden_layers;
        self.config.output_size = output_size;
        self
    }

    pub fn num_episodes(mut self, num_episodes: usize) -> Self {
        self.config.num_episodes = num_episodes;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn epsilon_decay(mut self, decay: f32, min: f32) -> Self {
        self.config.epsilon_decay = decay;
        self.config.epsilon_min = Some(min);
        self
    }

    pub fn replay_buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.replay_buffer_capacity = capacity;
        self
    }

    pub fn target_update_freq(mut self, freq: usize) -> Self {
        self.config.target_update_freq = freq;
        self
    }

    pub fn hard_sync(mut self) -> Self {
        self.config.soft_update = false;
        self
    }

    pub fn soft_sync(mut self, tau: f32) -> Self {
        self.config.soft_update = true;
        self.config.tau = tau;
        self
    }

    pub fn loss(mut self, loss: TdLoss) -> Self {
        self.config.loss = loss;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn build(self) -> Result<DqnAgent<NeuralNetwork>> {
        DqnAgent::new(self.config)
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
