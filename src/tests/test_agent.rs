use ndarray::{array, Array1};
use rand::RngCore;

use crate::agent::{DqnAgent, DqnAgentBuilder};
use crate::config::DqnConfig;
use crate::env::{CartPole, Environment, StepOutcome};
use crate::error::{DqnError, Result};
use crate::network::NeuralNetwork;
use crate::sync::SyncMode;
use crate::value_function::ValueFunction;

/// Walk right along a line; reaching the end terminates, running out of
/// steps truncates.
struct Corridor {
    length: i32,
    max_steps: usize,
    position: i32,
    steps: usize,
}

impl Corridor {
    fn new(length: i32, max_steps: usize) -> Self {
        Corridor {
            length,
            max_steps,
            position: 0,
            steps: 0,
        }
    }

    fn observe(&self) -> Array1<f32> {
        array![self.position as f32 / self.length as f32, self.steps as f32 / self.max_steps as f32]
    }
}

impl Environment for Corridor {
    fn observation_dim(&self) -> usize {
        2
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self, _rng: &mut dyn RngCore) -> Result<Array1<f32>> {
        self.position = 0;
        self.steps = 0;
        Ok(self.observe())
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        if action >= 2 {
            return Err(DqnError::InvalidAction { action, num_actions: 2 });
        }
        self.position = if action == 1 { self.position + 1 } else { (self.position - 1).max(0) };
        self.steps += 1;
        let terminated = self.position >= self.length;
        Ok(StepOutcome {
            next_state: self.observe(),
            reward: if terminated { 1.0 } else { 0.0 },
            terminated,
            truncated: !terminated && self.steps >= self.max_steps,
        })
    }
}

fn corridor_config() -> DqnConfig {
    DqnConfig {
        input_size: 2,
        output_size: 2,
        hidden_size: 8,
        hidden_layers: 1,
        num_episodes: 10,
        batch_size: 4,
        replay_buffer_capacity: 100,
        target_update_freq: 3,
        epsilon: 0.5,
        log_interval: 5,
        ..DqnConfig::default()
    }
}

#[test]
fn test_builder_creates_synced_agent() {
    let agent = DqnAgentBuilder::new()
        .layer_sizes(4, 16, 2, 2)
        .batch_size(8)
        .replay_buffer_capacity(50)
        .hard_sync()
        .seed(7)
        .build()
        .unwrap();

    assert_eq!(agent.online().input_size(), 4);
    assert_eq!(agent.online().num_actions(), 2);
    assert_eq!(agent.online().parameters(), agent.target().parameters());
    assert_eq!(agent.sync_mode(), SyncMode::Hard);
    assert_eq!(agent.buffer().capacity(), 50);
}

#[test]
fn test_builder_validates() {
    let result = DqnAgentBuilder::new().gamma(1.5).build();
    assert!(matches!(result, Err(DqnError::InvalidHyperparameter { .. })));
    assert!(DqnAgentBuilder::new().soft_sync(0.0).build().is_err());
}

#[test]
fn test_from_estimators_checks_dimensions() {
    let mut rng = rand::thread_rng();
    let config = corridor_config();
    let online = NeuralNetwork::mlp(3, &[4], 2, &mut rng).unwrap();
    let target = online.clone();
    assert!(matches!(
        DqnAgent::from_estimators(config, online, target),
        Err(DqnError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_from_estimators_rejects_different_depths() {
    let mut rng = rand::thread_rng();
    let online = NeuralNetwork::mlp(2, &[4], 2, &mut rng).unwrap();
    let target = NeuralNetwork::mlp(2, &[4, 4], 2, &mut rng).unwrap();

    match DqnAgent::from_estimators(corridor_config(), online, target) {
        Err(DqnError::ParameterMismatch { reason }) => assert!(reason.contains("key sets differ")),
        Err(other) => panic!("expected ParameterMismatch, got {}", other),
        Ok(_) => panic!("estimators of different depth were accepted"),
    }
}

#[test]
fn test_environment_must_match_config() {
    let mut agent = DqnAgent::new(corridor_config()).unwrap();
    let mut env = CartPole::new();
    assert!(matches!(agent.train(&mut env), Err(DqnError::DimensionMismatch { .. })));
    assert_eq!(agent.episodes_run(), 0);
}

#[test]
fn test_report_counts() {
    let mut agent = DqnAgent::new(corridor_config()).unwrap();
    let mut env = Corridor::new(3, 6);

    let report = agent.train(&mut env).unwrap();

    assert_eq!(report.num_episodes(), 10);
    assert_eq!(agent.episodes_run(), 10);
    // Synced after episodes 0, 3, 6 and 9
    assert_eq!(report.sync_count, 4);
    let synced: Vec<usize> = report.episodes.iter().filter(|e| e.synced).map(|e| e.episode).collect();
    assert_eq!(synced, vec![0, 3, 6, 9]);
    let total: usize = report.episodes.iter().map(|e| e.steps).sum();
    assert_eq!(report.total_steps, total);
    assert_eq!(agent.buffer().len(), total.min(100));
    assert_eq!(report.train_steps, agent.trainer().steps());
}

#[test]
fn test_truncation_is_not_terminal() {
    // Length beyond reach: every episode truncates after 5 steps
    let config = DqnConfig { num_episodes: 4, ..corridor_config() };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = Corridor::new(100, 5);

    let report = agent.train(&mut env).unwrap();

    assert!(report.episodes.iter().all(|e| e.truncated && e.steps == 5));
    assert_eq!(agent.buffer().len(), 20);
    assert!(agent.buffer().iter().all(|t| !t.done));
}

#[test]
fn test_terminal_transition_is_stored_as_done() {
    // Always-explore policy still reaches a one-step goal half the time
    let config = DqnConfig {
        num_episodes: 20,
        epsilon: 1.0,
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = Corridor::new(1, 50);

    let report = agent.train(&mut env).unwrap();

    let terminal_episodes = report.episodes.iter().filter(|e| !e.truncated).count();
    let done_transitions = agent.buffer().iter().filter(|t| t.done).count();
    assert!(terminal_episodes > 0);
    assert_eq!(done_transitions, terminal_episodes);
    assert!(agent.buffer().iter().filter(|t| t.done).all(|t| t.reward == 1.0));
}

#[test]
fn test_local_step_cap_truncates() {
    let config = DqnConfig {
        num_episodes: 3,
        max_steps_per_episode: Some(7),
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = Corridor::new(1000, 1000);

    let report = agent.train(&mut env).unwrap();

    assert!(report.episodes.iter().all(|e| e.steps == 7 && e.truncated));
    assert!(agent.buffer().iter().all(|t| !t.done));
}

#[test]
fn test_warm_up_leaves_online_untouched() {
    let config = DqnConfig {
        num_episodes: 2,
        batch_size: 50,
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let initial = agent.online().parameters();
    let mut env = Corridor::new(100, 5);

    let report = agent.train(&mut env).unwrap();

    assert!(report.episodes.iter().all(|e| e.loss.is_none()));
    assert_eq!(report.train_steps, 0);
    assert_eq!(agent.online().parameters(), initial);
}

#[test]
fn test_hard_sync_every_episode_keeps_networks_equal() {
    let config = DqnConfig {
        target_update_freq: 1,
        soft_update: false,
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = Corridor::new(3, 6);

    let report = agent.train(&mut env).unwrap();

    assert!(report.train_steps > 0);
    assert_eq!(agent.online().parameters(), agent.target().parameters());
}

#[test]
fn test_soft_sync_lags_online() {
    let config = DqnConfig {
        target_update_freq: 1,
        soft_update: true,
        tau: 0.1,
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(config).unwrap();
    let mut env = Corridor::new(3, 6);

    agent.train(&mut env).unwrap();

    let gap = agent.online().parameters().max_abs_diff(&agent.target().parameters()).unwrap();
    assert!(gap > 0.0);
}

#[test]
fn test_epsilon_follows_schedule() {
    let agent_config = DqnConfig {
        num_episodes: 4,
        epsilon: 0.8,
        epsilon_decay: 0.5,
        epsilon_min: Some(0.15),
        ..corridor_config()
    };
    let mut agent = DqnAgent::new(agent_config).unwrap();
    let mut env = Corridor::new(3, 6);

    let report = agent.train(&mut env).unwrap();

    let epsilons: Vec<f32> = report.episodes.iter().map(|e| e.epsilon).collect();
    assert_eq!(epsilons, vec![0.8, 0.4, 0.2, 0.15]);
    assert_eq!(agent.policy().epsilon(), 0.15);
}

#[test]
fn test_train_every_step_trains_more() {
    let per_episode = |train_every_step| {
        let config = DqnConfig { train_every_step, ..corridor_config() };
        let mut agent = DqnAgent::new(config).unwrap();
        let mut env = Corridor::new(100, 5);
        agent.train(&mut env).unwrap().train_steps
    };
    // 10 episodes of 5 steps with batch 4: one post-episode step each,
    // plus every step once the buffer holds 4 transitions
    assert_eq!(per_episode(false), 10);
    assert_eq!(per_episode(true), 10 + 47);
}

#[test]
fn test_same_seed_same_run() {
    let run = || {
        let config = DqnConfig {
            num_episodes: 15,
            batch_size: 16,
            hidden_size: 16,
            seed: 99,
            epsilon: 0.3,
            ..DqnConfig::default()
        };
        let mut agent = DqnAgent::new(config).unwrap();
        let mut env = CartPole::new();
        let report = agent.train(&mut env).unwrap();
        (report.rewards(), agent.online().parameters())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_evaluate_is_greedy_and_does_not_train() {
    let mut agent = DqnAgent::new(DqnConfig {
        max_steps_per_episode: Some(50),
        ..corridor_config()
    })
    .unwrap();
    let before = agent.online().parameters();
    let mut env = Corridor::new(3, 1000);

    let stats = agent.evaluate(&mut env, 3).unwrap();

    assert_eq!(stats.count, 3);
    assert!(agent.buffer().is_empty());
    assert_eq!(agent.online().parameters(), before);
}

#[test]
fn test_act_matches_argmax() {
    let agent = DqnAgent::new(corridor_config()).unwrap();
    let state = array![0.5, 0.0];
    let q = agent.online().q_values(state.view()).unwrap();
    let expected = if q[1] > q[0] { 1 } else { 0 };
    assert_eq!(agent.act(state.view()).unwrap(), expected);
}
