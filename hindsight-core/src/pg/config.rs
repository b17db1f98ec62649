//! Configuration of [`PgTrainer`](super::PgTrainer).
use crate::{error::HindsightError, schedule::Schedule};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PgTrainer`](super::PgTrainer).
///
/// At least one of `max_iters`, `max_episodes` and `max_steps` must be set.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PgTrainerConfig {
    /// Stop after this many iterations.
    #[serde(default)]
    pub max_iters: Option<usize>,

    /// Stop after this many episodes.
    #[serde(default)]
    pub max_episodes: Option<usize>,

    /// Stop after this many environment steps.
    #[serde(default)]
    pub max_steps: Option<usize>,

    /// Episodes are rolled out until a batch holds at least this many steps.
    pub min_steps_per_batch: usize,

    /// Discount factor.
    pub gamma: f64,

    /// Whether advantages are standardized over the batch.
    pub normalize_advantages: bool,

    /// Added to the standard deviation when normalizing advantages.
    pub advantage_eps: f64,

    /// Learning rate as a function of the iteration.
    pub learning_rate: Schedule,

    /// Number of stacked frames.
    pub history_length: usize,
}

impl Default for PgTrainerConfig {
    fn default() -> Self {
        Self {
            max_iters: None,
            max_episodes: None,
            max_steps: Some(1_000_000),
            min_steps_per_batch: 2048,
            gamma: 0.99,
            normalize_advantages: false,
            advantage_eps: 1e-7,
            learning_rate: Schedule::Constant(5e-3),
            history_length: 1,
        }
    }
}

impl PgTrainerConfig {
    /// Sets the maximum number of iterations.
    pub fn max_iters(mut self, v: Option<usize>) -> Self {
        self.max_iters = v;
        self
    }

    /// Sets the maximum number of episodes.
    pub fn max_episodes(mut self, v: Option<usize>) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the maximum number of environment steps.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the minimum number of steps in a batch.
    pub fn min_steps_per_batch(mut self, v: usize) -> Self {
        self.min_steps_per_batch = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Enables advantage normalization.
    pub fn normalize_advantages(mut self, v: bool) -> Self {
        self.normalize_advantages = v;
        self
    }

    /// Sets the epsilon of advantage normalization.
    pub fn advantage_eps(mut self, v: f64) -> Self {
        self.advantage_eps = v;
        self
    }

    /// Sets the learning rate schedule.
    pub fn learning_rate(mut self, v: Schedule) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the number of stacked frames.
    pub fn history_length(mut self, v: usize) -> Self {
        self.history_length = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), HindsightError> {
        if self.max_iters.is_none() && self.max_episodes.is_none() && self.max_steps.is_none() {
            return Err(HindsightError::config(
                "one of max_iters, max_episodes and max_steps must be set",
            ));
        }
        if self.min_steps_per_batch == 0 {
            return Err(HindsightError::config("min_steps_per_batch must be positive"));
        }
        if self.history_length == 0 {
            return Err(HindsightError::config("history length must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(HindsightError::config(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.advantage_eps <= 0.0 {
            return Err(HindsightError::config("advantage_eps must be positive"));
        }
        self.learning_rate.validate()
    }

    /// Constructs [`PgTrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PgTrainerConfig`].
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
    fn test_serde_pg_trainer_config() -> Result<()> {
        let config = PgTrainerConfig::default()
            .max_iters(Some(10))
            .normalize_advantages(true)
            .gamma(0.9);
        let dir = TempDir::new("pg_trainer_config")?;
        let path = dir.path().join("pg_trainer_config.yaml");
        config.save(&path)?;
        assert_eq!(config, PgTrainerConfig::load(&path)?);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(PgTrainerConfig::default().validate().is_ok());
        assert!(PgTrainerConfig::default()
            .max_steps(None)
            .validate()
            .is_err());
        assert!(PgTrainerConfig::default().gamma(1.5).validate().is_err());
        assert!(PgTrainerConfig::default()
            .advantage_eps(0.0)
            .validate()
            .is_err());
    }
}
