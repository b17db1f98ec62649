//! Policy-gradient pipeline.
//!
//! [`PgTrainer`] rolls out whole episodes with a [`Policy`](crate::Policy),
//! turns them into discounted returns and advantages, and hands the
//! concatenated [`PgBatch`] to [`Policy::fit`](crate::Policy::fit).
mod advantage;
mod batch;
mod config;
mod trainer;
pub use advantage::{discounted_sum_rewards, explained_variance, normalize_advantages};
pub use batch::{PgBatch, Trajectory};
pub use config::PgTrainerConfig;
pub use trainer::{PgTrainer, PgTrainingState};
