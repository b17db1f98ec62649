//! Explicit state of the training loop.
use serde::{Deserialize, Serialize};

/// Phase of the training loop.
///
/// `Learning` and `Syncing` are sub-phases entered from `Stepping` on the
/// steps selected by `learning_freq` and `target_update_freq`. After a step
/// the state keeps the last phase entered during that step.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    /// Populating the replay buffer with a random policy.
    Filling,

    /// Interacting with the environment under the exploration schedule.
    Stepping,

    /// Sampling a batch and running an optimization step.
    Learning,

    /// Synchronizing the target network.
    Syncing,

    /// Training is over.
    Done,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Filling
    }
}

/// Counters and accumulators threaded through every iteration of
/// [`Trainer`](super::Trainer).
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainingLoopState {
    /// Current phase.
    pub phase: Phase,

    /// Environment steps, filling included.
    pub env_steps: usize,

    /// Steps of the stepping phase. Schedules are evaluated at this step.
    pub step: usize,

    /// Optimization steps.
    pub opt_steps: usize,

    /// Target network synchronizations.
    pub target_syncs: usize,

    /// Episodes completed in the stepping phase.
    pub episodes: usize,

    /// Reward accumulated in the current episode.
    pub episode_reward: f64,

    /// Length of the current episode.
    pub episode_len: usize,

    /// Return of the last completed episode.
    pub last_episode_reward: Option<f64>,
}

impl TrainingLoopState {
    /// Accounts for one environment step.
    ///
    /// Returns `(episode_reward, episode_len)` when the step ended an episode,
    /// and resets the accumulators.
    pub fn on_env_step(&mut self, reward: f64, is_done: bool) -> Option<(f64, usize)> {
        self.env_steps += 1;
        self.episode_reward += reward;
        self.episode_len += 1;

        if is_done {
            let out = (self.episode_reward, self.episode_len);
            self.episode_reward = 0.0;
            self.episode_len = 0;
            Some(out)
        } else {
            None
        }
    }

    /// Clears the episode accumulators.
    pub fn reset_episode(&mut self) {
        self.episode_reward = 0.0;
        self.episode_len = 0;
    }
}
