//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use crate::error::HindsightError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// How indices are drawn for a batch.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum SamplingPolicy {
    /// Independent uniform draws; an index may repeat within a batch.
    /// Fails only when no index can be drawn at all.
    WithReplacement,

    /// Distinct indices; fails when fewer than `batch_size` indices can be drawn.
    WithoutReplacement,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::WithReplacement
    }
}

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
///
/// # Examples
///
/// ```rust
/// use hindsight_core::replay_buffer::{ReplayBufferConfig, SamplingPolicy};
///
/// let config = ReplayBufferConfig::default()
///     .capacity(100_000)
///     .history_length(4)
///     .obs_shape(vec![84, 84])
///     .sampling(SamplingPolicy::WithReplacement);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions. The oldest one is overwritten once full.
    pub capacity: usize,

    /// Number of frames `k` stacked into a state.
    pub history_length: usize,

    /// Shape of a single raw observation.
    pub obs_shape: Vec<usize>,

    /// Seed of the sampling RNG.
    pub seed: u64,

    /// Index drawing policy.
    #[serde(default)]
    pub sampling: SamplingPolicy,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            history_length: 4,
            obs_shape: vec![1],
            seed: 42,
            sampling: SamplingPolicy::WithReplacement,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of stacked frames.
    pub fn history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length;
        self
    }

    /// Sets the shape of a raw observation.
    pub fn obs_shape(mut self, obs_shape: Vec<usize>) -> Self {
        self.obs_shape = obs_shape;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the index drawing policy.
    pub fn sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), HindsightError> {
        if self.capacity == 0 {
            return Err(HindsightError::config("capacity must be positive"));
        }
        if self.history_length == 0 {
            return Err(HindsightError::config("history_length must be positive"));
        }
        if self.history_length > self.capacity {
            return Err(HindsightError::config(format!(
                "history_length ({}) exceeds capacity ({})",
                self.history_length, self.capacity
            )));
        }
        crate::shape::Shape::new(self.obs_shape.clone())?;
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(1000)
            .history_length(2)
            .obs_shape(vec![4, 4])
            .seed(7)
            .sampling(SamplingPolicy::WithoutReplacement);

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer_config.yaml");
        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ReplayBufferConfig::default().validate().is_ok());
        assert!(ReplayBufferConfig::default().capacity(0).validate().is_err());
        assert!(ReplayBufferConfig::default()
            .history_length(0)
            .validate()
            .is_err());
        assert!(ReplayBufferConfig::default()
            .capacity(2)
            .history_length(3)
            .validate()
            .is_err());
        assert!(ReplayBufferConfig::default()
            .obs_shape(vec![])
            .validate()
            .is_err());
    }
}
